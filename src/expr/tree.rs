use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::expr::builder::OperandPrinter;
use crate::expr::dictionary::Dictionary;
use crate::expr::error::{EvalError, TreeError};
use crate::expr::{evaluator, formatter, Token};

/// Hard cap on tree depth. Parsing, evaluation and formatting all recurse
/// over the node structure, so a pathologically nested input would otherwise
/// exhaust the call stack.
pub const MAX_NESTING_DEPTH: usize = 128;

pub(crate) type NodeId = usize;

pub(crate) struct Node<T> {
    pub(crate) token: Token<T>,
    pub(crate) children: Vec<NodeId>,
}

/// Flat node storage. Children are indices, so the whole tree drops as one
/// block and the builder can rearrange links without fighting the borrow
/// checker.
pub(crate) struct Arena<T> {
    nodes: Vec<Node<T>>,
}

impl<T> Arena<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, token: Token<T>) -> NodeId {
        self.nodes.push(Node {
            token,
            children: Vec::new(),
        });
        self.nodes.len() - 1
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id]
    }
}

/// Assembles the postfix sequence into a single rooted tree.
///
/// Tokens are taken from the tail of the sequence; the first becomes the
/// root and every later one sinks depth-first: first try the current
/// leftmost child's subtree, then claim a free slot as the new leftmost
/// child. Children therefore fill in reverse encounter order, which is
/// exactly what rebuilds right-leaning chains of prefix operators.
pub(crate) fn build_tree<T: Clone>(
    mut postfix: Vec<Token<T>>,
) -> Result<(Arena<T>, NodeId), TreeError> {
    let mut arena = Arena::with_capacity(postfix.len());
    let root = match postfix.pop() {
        Some(token) => arena.push(token),
        None => return Err(TreeError::InvalidExpression),
    };
    while let Some(token) = postfix.pop() {
        let id = arena.push(token);
        if !insert(&mut arena, root, id, 0)? {
            return Err(TreeError::InvalidExpression);
        }
    }
    // Every call site and operator must have been saturated.
    for node in &arena.nodes {
        if node.children.len() != node.token.arity() {
            return Err(TreeError::InvalidExpression);
        }
    }
    Ok((arena, root))
}

fn insert<T>(arena: &mut Arena<T>, at: NodeId, new: NodeId, depth: usize) -> Result<bool, TreeError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(TreeError::NestingTooDeep);
    }
    if let Some(&first) = arena.nodes[at].children.first() {
        if insert(arena, first, new, depth + 1)? {
            return Ok(true);
        }
    }
    if arena.nodes[at].children.len() < arena.nodes[at].token.arity() {
        arena.nodes[at].children.insert(0, new);
        return Ok(true);
    }
    Ok(false)
}

/// A parsed expression, immutable once built.
///
/// Holds the node arena, the constants snapshot it was built against and the
/// operand printer, so it can be evaluated repeatedly under different
/// variable bindings and re-printed without the builder.
pub struct Expression<T> {
    pub(crate) arena: Arena<T>,
    pub(crate) root: NodeId,
    pub(crate) dictionary: Arc<Dictionary<T>>,
    pub(crate) print_operand: OperandPrinter<T>,
}

impl<T: Clone + 'static> Expression<T> {
    /// Evaluates with no variable bindings; only dictionary constants are in
    /// scope.
    pub fn evaluate(&self) -> Result<T, EvalError> {
        self.evaluate_with(&HashMap::new())
    }

    /// Evaluates under the given bindings. Bindings shadow dictionary
    /// constants of the same label.
    pub fn evaluate_with(&self, bindings: &HashMap<String, T>) -> Result<T, EvalError> {
        evaluator::evaluate(
            &self.arena,
            self.root,
            bindings,
            self.dictionary.constants(),
        )
    }
}

impl<T: Clone + 'static> fmt::Display for Expression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            formatter::format_node(&self.arena, self.root, &self.print_operand)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::default_builder;

    fn tree_of(input: &str) -> Result<(Arena<f64>, NodeId), TreeError> {
        let builder = default_builder();
        let tokens = builder.tokenizer().tokenize(input).unwrap();
        let postfix = crate::expr::parser::to_postfix(tokens).unwrap();
        build_tree(postfix)
    }

    #[test]
    fn test_binary_tree_shape() {
        let (arena, root) = tree_of("2 + 3 * 4").unwrap();
        let top = arena.node(root);
        assert_eq!(top.token.describe(), "+");
        assert_eq!(arena.node(top.children[0]).token.describe(), "<operand>");
        assert_eq!(arena.node(top.children[1]).token.describe(), "*");
    }

    #[test]
    fn test_prefix_chain_nests_rightward() {
        let (arena, root) = tree_of("- - - 5").unwrap();
        let mut id = root;
        for _ in 0..3 {
            let node = arena.node(id);
            assert_eq!(node.token.describe(), "-");
            assert_eq!(node.children.len(), 1);
            id = node.children[0];
        }
        assert_eq!(arena.node(id).token.describe(), "<operand>");
    }

    #[test]
    fn test_function_children_in_source_order() {
        let (arena, root) = tree_of("if(1, 2, 3)").unwrap();
        let top = arena.node(root);
        assert_eq!(top.token.describe(), "if");
        assert_eq!(top.children.len(), 3);
    }

    #[test]
    fn test_incomplete_postfix_is_rejected() {
        // "5 +" survives the parser only as a dangling operator; the tree
        // stage catches the unsaturated node.
        assert_eq!(tree_of("5 +").map(|_| ()), Err(TreeError::InvalidExpression));
    }

    #[test]
    fn test_nesting_depth_guard() {
        let depth = MAX_NESTING_DEPTH + 8;
        let input = format!("{}5{}", "(".repeat(depth), ")".repeat(depth));
        assert!(tree_of(&input).is_ok(), "parens alone do not nest the tree");
        let deep = "-".repeat(depth) + "5";
        assert_eq!(tree_of(&deep).map(|_| ()), Err(TreeError::NestingTooDeep));
    }
}
