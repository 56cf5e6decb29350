use std::fmt;
use std::sync::Arc;

mod builder;
mod dictionary;
mod error;
mod evaluator;
mod formatter;
mod parser;
mod tokenizer;
mod tree;

pub use builder::{Builder, OperandParser, OperandPrinter};
pub use dictionary::{
    Dictionary, IMPLICIT_MUL, IMPLICIT_MUL_PRECEDENCE, SIGN_PRECEDENCE, UNARY_MINUS, UNARY_PLUS,
};
pub use error::{BuildError, ConfigError, Error, EvalError, LexError, ParseError, TreeError};
pub use evaluator::LazyOperand;
pub use tree::{Expression, MAX_NESTING_DEPTH};

/// Where an operator sits relative to its operand(s), and for infix
/// operators, how ties in precedence associate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Prefix,
    Postfix,
    Infix,
    /// Infix, but equal-precedence chains group to the right (`2 ^ 3 ^ 4`).
    InfixRight,
}

/// Argument count of a function or branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// Resolved at parse time from the number of comma-separated arguments
    /// at the call site.
    Variable,
}

/// Evaluation body of an operator or function. Operands arrive as lazy,
/// memoized accessors; a body that never calls [`LazyOperand::value`] on an
/// operand never pays for its evaluation.
pub type OperandFn<T> =
    Arc<dyn for<'e> Fn(&[LazyOperand<'e, T>]) -> Result<T, EvalError> + Send + Sync>;

/// Choice body of a branch: maps the resolved selector (child 0) to the
/// index of the single child that will be evaluated.
pub type ChoiceFn<T> = Arc<dyn Fn(&T) -> Result<usize, EvalError> + Send + Sync>;

#[derive(Clone)]
pub struct Operator<T> {
    pub label: String,
    pub fixity: Fixity,
    pub precedence: u32,
    pub apply: OperandFn<T>,
}

impl<T> Operator<T> {
    pub fn arity(&self) -> usize {
        match self.fixity {
            Fixity::Prefix | Fixity::Postfix => 1,
            Fixity::Infix | Fixity::InfixRight => 2,
        }
    }
}

impl<T> fmt::Debug for Operator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("label", &self.label)
            .field("fixity", &self.fixity)
            .field("precedence", &self.precedence)
            .finish()
    }
}

#[derive(Clone)]
pub struct Function<T> {
    pub label: String,
    pub arity: Arity,
    pub apply: OperandFn<T>,
}

impl<T> fmt::Debug for Function<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("label", &self.label)
            .field("arity", &self.arity)
            .finish()
    }
}

#[derive(Clone)]
pub struct Branch<T> {
    pub label: String,
    pub arity: Arity,
    pub choose: ChoiceFn<T>,
}

impl<T> fmt::Debug for Branch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("label", &self.label)
            .field("arity", &self.arity)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    OpenParen,
    CloseParen,
    Comma,
}

/// One lexical unit of an expression. Separators exist only between the
/// tokenizer and the parser; they never reach the tree.
#[derive(Debug, Clone)]
pub enum Token<T> {
    Operand(T),
    Variable(String),
    Operator(Operator<T>),
    Function(Function<T>),
    Branch(Branch<T>),
    Separator(Separator),
}

impl<T> Token<T> {
    /// Number of children the matching tree node must hold. Functions and
    /// branches have their arity resolved by the parser before this is
    /// consulted.
    pub(crate) fn arity(&self) -> usize {
        match self {
            Token::Operand(_) | Token::Variable(_) | Token::Separator(_) => 0,
            Token::Operator(op) => op.arity(),
            Token::Function(fun) => match fun.arity {
                Arity::Fixed(n) => n,
                Arity::Variable => 0,
            },
            Token::Branch(branch) => match branch.arity {
                Arity::Fixed(n) => n,
                Arity::Variable => 0,
            },
        }
    }

    /// True if the token can end an operand: something an infix or postfix
    /// operator may directly follow.
    pub(crate) fn is_operand_like(&self) -> bool {
        match self {
            Token::Operand(_) | Token::Variable(_) => true,
            Token::Operator(op) => op.fixity == Fixity::Postfix,
            Token::Separator(sep) => *sep == Separator::CloseParen,
            Token::Function(_) | Token::Branch(_) => false,
        }
    }

    /// Short human-readable form for error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Operand(_) => "<operand>".to_string(),
            Token::Variable(name) => name.clone(),
            Token::Operator(op) => op.label.clone(),
            Token::Function(fun) => fun.label.clone(),
            Token::Branch(branch) => branch.label.clone(),
            Token::Separator(Separator::OpenParen) => "(".to_string(),
            Token::Separator(Separator::CloseParen) => ")".to_string(),
            Token::Separator(Separator::Comma) => ",".to_string(),
        }
    }
}
