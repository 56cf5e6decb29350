use crate::expr::builder::OperandPrinter;
use crate::expr::dictionary::IMPLICIT_MUL;
use crate::expr::tree::{Arena, NodeId};
use crate::expr::{Fixity, Token};

/// Renders the subtree at `id` back to source form.
///
/// Parentheses are emitted only where leaving them out would re-parse
/// differently: around an infix child of strictly lower precedence than its
/// infix parent, around an equal-precedence infix child sitting on the
/// non-associative side of its parent, and around any infix child of a
/// prefix or postfix operator. The implicit multiplication marker prints as
/// a plain `*`, which keeps the output lexable by the default vocabulary.
pub(crate) fn format_node<T>(arena: &Arena<T>, id: NodeId, print: &OperandPrinter<T>) -> String {
    let node = arena.node(id);
    match &node.token {
        Token::Operand(value) => print(value),
        Token::Variable(name) => name.clone(),
        Token::Operator(op) => match op.fixity {
            Fixity::Infix | Fixity::InfixRight => {
                // The parse regroups equal-precedence ties toward the
                // associative side, so only the other side keeps its ties
                // bare.
                let ties_left = op.fixity == Fixity::Infix;
                let left =
                    operand_of_infix(arena, node.children[0], op.precedence, ties_left, print);
                let right =
                    operand_of_infix(arena, node.children[1], op.precedence, !ties_left, print);
                format!("{left} {} {right}", printed_label(&op.label))
            }
            Fixity::Prefix => {
                let operand = operand_of_unary(arena, node.children[0], print);
                format!("{}{operand}", op.label)
            }
            Fixity::Postfix => {
                let operand = operand_of_unary(arena, node.children[0], print);
                format!("{operand}{}", op.label)
            }
        },
        Token::Function(function) => call(arena, &function.label, &node.children, print),
        Token::Branch(branch) => call(arena, &branch.label, &node.children, print),
        Token::Separator(_) => unreachable!("separator token in expression tree"),
    }
}

fn call<T>(
    arena: &Arena<T>,
    label: &str,
    children: &[NodeId],
    print: &OperandPrinter<T>,
) -> String {
    let arguments = children
        .iter()
        .map(|&child| format_node(arena, child, print))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{label}({arguments})")
}

/// Formats a child of an infix operator, parenthesized when the child binds
/// looser than the parent, or equally tight on a side the parent does not
/// associate toward.
fn operand_of_infix<T>(
    arena: &Arena<T>,
    id: NodeId,
    parent_precedence: u32,
    ties_bare: bool,
    print: &OperandPrinter<T>,
) -> String {
    let text = format_node(arena, id, print);
    match infix_precedence(arena, id) {
        Some(precedence)
            if precedence < parent_precedence
                || (precedence == parent_precedence && !ties_bare) =>
        {
            format!("({text})")
        }
        _ => text,
    }
}

/// Formats the operand of a prefix or postfix operator. Any infix child gets
/// parentheses; unary operators bind tighter than every infix level.
fn operand_of_unary<T>(arena: &Arena<T>, id: NodeId, print: &OperandPrinter<T>) -> String {
    let text = format_node(arena, id, print);
    if infix_precedence(arena, id).is_some() {
        format!("({text})")
    } else {
        text
    }
}

fn infix_precedence<T>(arena: &Arena<T>, id: NodeId) -> Option<u32> {
    match &arena.node(id).token {
        Token::Operator(op) if matches!(op.fixity, Fixity::Infix | Fixity::InfixRight) => {
            Some(op.precedence)
        }
        _ => None,
    }
}

fn printed_label(label: &str) -> &str {
    if label == IMPLICIT_MUL {
        "*"
    } else {
        label
    }
}
