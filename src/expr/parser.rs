use log::debug;

use crate::expr::error::ParseError;
use crate::expr::{Arity, Fixity, Separator, Token};

/// Converts a token sequence to postfix order with the Shunting-Yard
/// algorithm, resolving variable-arity call sites and parenthesis matching
/// along the way.
///
/// Function and branch tokens come out with their arity rewritten to the
/// counted `Arity::Fixed` form, so the tree builder never sees an
/// unresolved call site.
pub(crate) fn to_postfix<T: Clone>(tokens: Vec<Token<T>>) -> Result<Vec<Token<T>>, ParseError> {
    let mut output: Vec<Token<T>> = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token<T>> = Vec::new();
    // One argument counter per open function call.
    let mut counters: Vec<usize> = Vec::new();
    let mut pending_call: Option<Token<T>> = None;
    let mut previous: Option<Token<T>> = None;

    for token in tokens {
        // A function or branch label binds to an argument list, nothing else.
        if pending_call.is_some() && !matches!(token, Token::Separator(Separator::OpenParen)) {
            return Err(adjacency(&token, previous.as_ref()));
        }
        match &token {
            Token::Operand(_) | Token::Variable(_) => output.push(token.clone()),
            Token::Function(_) | Token::Branch(_) => pending_call = Some(token.clone()),
            Token::Separator(Separator::OpenParen) => {
                if let Some(call) = pending_call.take() {
                    stack.push(call);
                    stack.push(Token::Separator(Separator::OpenParen));
                    counters.push(1);
                } else {
                    stack.push(Token::Separator(Separator::OpenParen));
                }
            }
            Token::Separator(Separator::Comma) => {
                if !previous.as_ref().is_some_and(Token::is_operand_like) {
                    return Err(ParseError::MisplacedComma);
                }
                flush_to_open_paren(&mut stack, &mut output)
                    .map_err(|_| ParseError::MisplacedComma)?;
                // The paren must belong to a function call.
                let enclosing = stack.len().checked_sub(2).map(|i| &stack[i]);
                match enclosing {
                    Some(Token::Function(_)) | Some(Token::Branch(_)) => {}
                    _ => return Err(ParseError::MisplacedComma),
                }
                match counters.last_mut() {
                    Some(count) => *count += 1,
                    None => return Err(ParseError::MisplacedComma),
                }
            }
            Token::Separator(Separator::CloseParen) => {
                let empty_group = matches!(
                    previous,
                    Some(Token::Separator(Separator::OpenParen))
                );
                flush_to_open_paren(&mut stack, &mut output)
                    .map_err(|_| ParseError::UnmatchedParenthesis)?;
                stack.pop(); // the matching open paren
                let call_below = matches!(
                    stack.last(),
                    Some(Token::Function(_)) | Some(Token::Branch(_))
                );
                if call_below {
                    let mut count = counters.pop().unwrap_or(0);
                    if empty_group {
                        count = 0;
                    }
                    let call = stack.pop().ok_or(ParseError::InvalidExpression)?;
                    output.push(finalize_call(call, count)?);
                } else if empty_group {
                    // "()" groups nothing.
                    return Err(ParseError::InvalidExpression);
                }
                // A parenthesis that only grouped the operand of pending
                // prefix operators closes them as well.
                while matches!(stack.last(), Some(Token::Operator(op)) if op.fixity == Fixity::Prefix)
                {
                    if let Some(op) = stack.pop() {
                        output.push(op);
                    }
                }
            }
            Token::Operator(op) => {
                let operand_ended = previous.as_ref().is_some_and(Token::is_operand_like);
                match op.fixity {
                    Fixity::Prefix => {
                        if operand_ended {
                            return Err(adjacency(&token, previous.as_ref()));
                        }
                        stack.push(token.clone());
                    }
                    Fixity::Postfix => {
                        if !operand_ended {
                            return Err(adjacency(&token, previous.as_ref()));
                        }
                        // Postfix binds to what just ended; no reordering left
                        // to do.
                        output.push(token.clone());
                    }
                    Fixity::Infix | Fixity::InfixRight => {
                        if !operand_ended {
                            return Err(adjacency(&token, previous.as_ref()));
                        }
                        while must_pop_first(stack.last(), op.precedence) {
                            if let Some(top) = stack.pop() {
                                output.push(top);
                            }
                        }
                        stack.push(token.clone());
                    }
                }
            }
        }
        previous = Some(token);
    }

    if pending_call.is_some() {
        return Err(ParseError::InvalidExpression);
    }
    while let Some(top) = stack.pop() {
        match top {
            Token::Operator(_) => output.push(top),
            _ => return Err(ParseError::UnmatchedParenthesis),
        }
    }
    if output.is_empty() {
        return Err(ParseError::InvalidExpression);
    }
    debug!(
        "postfix: {:?}",
        output.iter().map(Token::describe).collect::<Vec<_>>()
    );
    Ok(output)
}

/// Pops operators to the output until an open paren is on top. Errs when the
/// stack runs out without one.
fn flush_to_open_paren<T>(
    stack: &mut Vec<Token<T>>,
    output: &mut Vec<Token<T>>,
) -> Result<(), ()> {
    loop {
        match stack.last() {
            Some(Token::Separator(Separator::OpenParen)) => return Ok(()),
            Some(Token::Operator(_)) => {
                if let Some(op) = stack.pop() {
                    output.push(op);
                }
            }
            _ => return Err(()),
        }
    }
}

/// True when the operator on top of the stack has to reach the output before
/// an arriving infix operator of precedence `precedence`.
///
/// Prefix operators stay put regardless of precedence; they close over
/// everything up to the next flush point, which is what makes chains like
/// `- - - 5` group to the right.
fn must_pop_first<T>(top: Option<&Token<T>>, precedence: u32) -> bool {
    match top {
        Some(Token::Operator(top)) => match top.fixity {
            Fixity::Prefix => false,
            Fixity::Infix | Fixity::Postfix => top.precedence >= precedence,
            Fixity::InfixRight => top.precedence > precedence,
        },
        _ => false,
    }
}

/// Resolves a call site's arity against the counted arguments and stamps the
/// count into the emitted token.
fn finalize_call<T>(call: Token<T>, count: usize) -> Result<Token<T>, ParseError> {
    match call {
        Token::Function(mut function) => {
            match function.arity {
                Arity::Fixed(expected) if expected != count => {
                    return Err(ParseError::ArityMismatch {
                        label: function.label,
                        expected,
                        found: count,
                    });
                }
                _ => {}
            }
            function.arity = Arity::Fixed(count);
            Ok(Token::Function(function))
        }
        Token::Branch(mut branch) => {
            match branch.arity {
                Arity::Fixed(expected) if expected != count => {
                    return Err(ParseError::ArityMismatch {
                        label: branch.label,
                        expected,
                        found: count,
                    });
                }
                Arity::Variable if count < 3 => {
                    return Err(ParseError::ArityMismatch {
                        label: branch.label,
                        expected: 3,
                        found: count,
                    });
                }
                _ => {}
            }
            branch.arity = Arity::Fixed(count);
            Ok(Token::Branch(branch))
        }
        other => Ok(other),
    }
}

fn adjacency<T>(token: &Token<T>, previous: Option<&Token<T>>) -> ParseError {
    ParseError::InvalidAdjacency {
        token: token.describe(),
        previous: previous
            .map(Token::describe)
            .unwrap_or_else(|| "start of expression".to_string()),
    }
}
