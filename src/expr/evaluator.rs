use std::cell::RefCell;
use std::collections::HashMap;

use log::trace;

use crate::expr::error::EvalError;
use crate::expr::tree::{Arena, NodeId};
use crate::expr::Token;

/// Variable resolution scope for one `evaluate` call: explicit bindings
/// first, dictionary constants as the fallback.
pub(crate) struct Env<'e, T> {
    bindings: &'e HashMap<String, T>,
    constants: &'e HashMap<String, T>,
}

/// A deferred operand handed to operator and function bodies.
///
/// The wrapped subtree is evaluated on the first [`value`](Self::value) call
/// and the result is cached, so a body may read an operand any number of
/// times at the cost of one evaluation, and a body that skips an operand
/// never evaluates it at all (including any errors buried inside it).
pub struct LazyOperand<'e, T> {
    arena: &'e Arena<T>,
    node: NodeId,
    env: &'e Env<'e, T>,
    cache: RefCell<Option<T>>,
}

impl<T: Clone + 'static> LazyOperand<'_, T> {
    pub fn value(&self) -> Result<T, EvalError> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let value = eval_node(self.arena, self.node, self.env)?;
        *self.cache.borrow_mut() = Some(value.clone());
        Ok(value)
    }
}

pub(crate) fn evaluate<T: Clone + 'static>(
    arena: &Arena<T>,
    root: NodeId,
    bindings: &HashMap<String, T>,
    constants: &HashMap<String, T>,
) -> Result<T, EvalError> {
    let env = Env {
        bindings,
        constants,
    };
    eval_node(arena, root, &env)
}

fn eval_node<T: Clone + 'static>(
    arena: &Arena<T>,
    id: NodeId,
    env: &Env<'_, T>,
) -> Result<T, EvalError> {
    let node = arena.node(id);
    match &node.token {
        Token::Operand(value) => Ok(value.clone()),
        Token::Variable(name) => env
            .bindings
            .get(name)
            .or_else(|| {
                trace!("variable '{name}' not bound, trying constants");
                env.constants.get(name)
            })
            .cloned()
            .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
        Token::Operator(op) => {
            let operands = lazy_operands(arena, &node.children, env);
            (op.apply)(&operands)
        }
        Token::Function(function) => {
            let operands = lazy_operands(arena, &node.children, env);
            (function.apply)(&operands)
        }
        Token::Branch(branch) => {
            // Child 0 selects; exactly one other child is then evaluated and
            // the rest are never touched.
            let selector = eval_node(arena, node.children[0], env)?;
            let index = (branch.choose)(&selector)?;
            if index == 0 || index >= node.children.len() {
                return Err(EvalError::BranchIndex {
                    label: branch.label.clone(),
                    index,
                    children: node.children.len(),
                });
            }
            eval_node(arena, node.children[index], env)
        }
        // The parser never lets a separator into the tree.
        Token::Separator(_) => unreachable!("separator token in expression tree"),
    }
}

fn lazy_operands<'e, T>(
    arena: &'e Arena<T>,
    children: &[NodeId],
    env: &'e Env<'e, T>,
) -> Vec<LazyOperand<'e, T>> {
    children
        .iter()
        .map(|&node| LazyOperand {
            arena,
            node,
            env,
            cache: RefCell::new(None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::error::BuildError;
    use crate::expr::{Arity, ParseError};
    use crate::functions::{default_builder, default_dictionary};
    use crate::expr::Builder;

    fn eval(input: &str) -> Result<f64, EvalError> {
        default_builder().build(input).unwrap().evaluate()
    }

    fn eval_with(input: &str, bindings: &[(&str, f64)]) -> Result<f64, EvalError> {
        let bindings: HashMap<String, f64> = bindings
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        default_builder().build(input).unwrap().evaluate_with(&bindings)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval("2 * 3 + 4").unwrap(), 10.0);
        assert_eq!(eval("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn test_right_associative_exponentiation() {
        assert_eq!(eval("2 ^ 3 ^ 4").unwrap(), 2f64.powi(81));
        assert_eq!(eval("(2 ^ 3) ^ 4").unwrap(), 4096.0);
    }

    #[test]
    fn test_prefix_chaining() {
        assert_eq!(eval("- - - 5").unwrap(), -5.0);
        assert_eq!(eval("--5").unwrap(), 5.0);
        assert_eq!(eval("+5").unwrap(), 5.0);
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(eval("5 5").unwrap(), 25.0);
        assert_eq!(eval("5(5)").unwrap(), 25.0);
        assert_eq!(eval("5 * 5").unwrap(), 25.0);
        assert_eq!(eval_with("5x", &[("x", 5.0)]).unwrap(), 25.0);
        assert_eq!(eval_with("(a)(b)", &[("a", 3.0), ("b", 4.0)]).unwrap(), 12.0);
        assert_eq!(eval("5 max(1, 2)").unwrap(), 10.0);
    }

    #[test]
    fn test_variable_arity_function() {
        assert_eq!(eval("max(1, 2, 3)").unwrap(), 3.0);
        assert_eq!(eval("min(4)").unwrap(), 4.0);
        assert_eq!(eval("max(1, 2, 3, 4, 5, 6)").unwrap(), 6.0);
    }

    #[test]
    fn test_functions_nest() {
        assert_eq!(eval("max(1, min(5, 3), 2)").unwrap(), 3.0);
        assert_eq!(eval("sqrt(abs(-16))").unwrap(), 4.0);
    }

    #[test]
    fn test_unknown_variable_is_an_eval_error_only() {
        let expression = default_builder().build("5 + x").unwrap();
        assert_eq!(
            expression.evaluate(),
            Err(EvalError::UnknownVariable("x".to_string()))
        );
        // The same expression succeeds once the binding exists.
        let bindings = HashMap::from([("x".to_string(), 1.0)]);
        assert_eq!(expression.evaluate_with(&bindings), Ok(6.0));
    }

    #[test]
    fn test_bindings_shadow_constants() {
        assert_eq!(eval("pi").unwrap(), std::f64::consts::PI);
        assert_eq!(eval_with("pi", &[("pi", 3.0)]).unwrap(), 3.0);
    }

    #[test]
    fn test_branch_takes_only_one_arm() {
        assert_eq!(eval_with("if(x < 0.5, 0, 1)", &[("x", 0.6)]).unwrap(), 1.0);
        assert_eq!(eval_with("if(x < 0.5, 0, 1)", &[("x", 0.4)]).unwrap(), 0.0);
    }

    #[test]
    fn test_branch_short_circuits() {
        let mut builder = default_builder();
        builder
            .dictionary_mut()
            .add_function("boom", Arity::Variable, |_args| {
                Err(EvalError::math("untaken arm was evaluated"))
            })
            .unwrap();
        let expression = builder.build("if(1, 2, boom())").unwrap();
        assert_eq!(expression.evaluate(), Ok(2.0));
        let expression = builder.build("if(0, boom(), 3)").unwrap();
        assert_eq!(expression.evaluate(), Ok(3.0));
        // The selected arm still propagates its own failure.
        let expression = builder.build("if(1, boom(), 3)").unwrap();
        assert!(expression.evaluate().is_err());
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            eval("10 / 0"),
            Err(EvalError::Math("division by zero".to_string()))
        );
        assert_eq!(eval("if(0, 10 / 0, 7)").unwrap(), 7.0);
    }

    #[test]
    fn test_lazy_operands_memoize() {
        let mut dictionary = default_dictionary();
        dictionary
            .add_function("twice", Arity::Fixed(1), |args: &[LazyOperand<'_, f64>]| {
                // Two reads, one evaluation.
                Ok(args[0].value()? + args[0].value()?)
            })
            .unwrap();
        let builder = Builder::new(
            dictionary,
            |text| text.parse::<f64>().map_err(|e| e.to_string()),
            |value: &f64| value.to_string(),
        );
        assert_eq!(builder.build("twice(21)").unwrap().evaluate(), Ok(42.0));
    }

    #[test]
    fn test_comparisons_yield_zero_or_one() {
        assert_eq!(eval("2 < 3").unwrap(), 1.0);
        assert_eq!(eval("2 >= 3").unwrap(), 0.0);
        assert_eq!(eval("2 == 2").unwrap(), 1.0);
        assert_eq!(eval("2 != 2").unwrap(), 0.0);
    }

    #[test]
    fn test_postfix_factorial() {
        assert_eq!(eval("5!").unwrap(), 120.0);
        assert_eq!(eval("3! + 1").unwrap(), 7.0);
    }

    #[test]
    fn test_sign_binds_after_close_paren_flush() {
        assert_eq!(eval("-(5) + 2").unwrap(), -3.0);
        assert_eq!(eval("-(2 + 3)").unwrap(), -5.0);
    }

    #[test]
    fn test_build_failures_are_typed() {
        let builder = default_builder();
        assert!(matches!(
            builder.build("(2 + 3))"),
            Err(BuildError::Parse(ParseError::UnmatchedParenthesis))
        ));
        assert!(matches!(
            builder.build("()"),
            Err(BuildError::Parse(ParseError::InvalidExpression))
        ));
        assert!(matches!(builder.build(""), Err(BuildError::Lex(_))));
    }
}
