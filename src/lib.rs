//! Generic infix expression engine: tokenizer, Shunting-Yard parser,
//! expression tree and lazy evaluator over an arbitrary operand type, plus a
//! ready-made `f64` vocabulary.
//!
//! ```
//! use std::collections::HashMap;
//!
//! let result = evalix_rs::evaluate_expression("2 + 3 * 4", &HashMap::new()).unwrap();
//! assert_eq!(result, 14.0);
//!
//! let bindings = HashMap::from([("x".to_string(), 0.25)]);
//! let result = evalix_rs::evaluate_expression("if(x < 0.5, 0, 1)", &bindings).unwrap();
//! assert_eq!(result, 0.0);
//! ```
//!
//! For repeated evaluation under changing bindings, build the expression
//! once and call [`Expression::evaluate_with`] per binding set:
//!
//! ```
//! use std::collections::HashMap;
//! use evalix_rs::functions::default_builder;
//!
//! let expression = default_builder().build("x ^ 2 + 1").unwrap();
//! for x in [1.0, 2.0, 3.0] {
//!     let bindings = HashMap::from([("x".to_string(), x)]);
//!     assert_eq!(expression.evaluate_with(&bindings).unwrap(), x * x + 1.0);
//! }
//! ```

pub mod expr;
pub mod functions;

use std::collections::HashMap;

pub use expr::{
    Arity, Branch, BuildError, Builder, ConfigError, Dictionary, Error, EvalError, Expression,
    Fixity, Function, LazyOperand, LexError, Operator, ParseError, Token, TreeError,
};

/// One-shot convenience: builds `expression` with the default `f64`
/// vocabulary and evaluates it under `bindings`.
pub fn evaluate_expression(
    expression: &str,
    bindings: &HashMap<String, f64>,
) -> Result<f64, Error> {
    let expression = functions::default_builder().build(expression)?;
    Ok(expression.evaluate_with(bindings)?)
}
