use thiserror::Error;

/// Lexical failures: the raw string could not be cut into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("expression is blank")]
    BlankInput,
    #[error("unrecognized symbol '{symbol}' at byte {position}")]
    UnrecognizedSymbol { position: usize, symbol: String },
    #[error("undefined symbol '{0}'")]
    UndefinedSymbol(String),
    #[error("cannot read '{text}' as an operand: {reason}")]
    InvalidOperand { text: String, reason: String },
}

/// Structural failures detected while converting tokens to postfix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unmatched parenthesis")]
    UnmatchedParenthesis,
    #[error("'{token}' cannot directly follow '{previous}'")]
    InvalidAdjacency { token: String, previous: String },
    #[error("'{label}' expects {expected} argument(s), found {found}")]
    ArityMismatch {
        label: String,
        expected: usize,
        found: usize,
    },
    #[error("comma outside of a function argument list")]
    MisplacedComma,
    #[error("invalid expression")]
    InvalidExpression,
}

/// The postfix sequence did not reduce to a single well-formed tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("expression does not form a single tree")]
    InvalidExpression,
    #[error("expression nesting exceeds the supported depth")]
    NestingTooDeep,
}

/// Per-call evaluation failures. These never invalidate the expression; a
/// later call with different bindings may succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("unknown constant '{0}'")]
    UnknownConstant(String),
    #[error("branch '{label}' chose child {index} out of {children}")]
    BranchIndex {
        label: String,
        index: usize,
        children: usize,
    },
    #[error("{0}")]
    Math(String),
}

impl EvalError {
    /// Convenience for operator and function bodies reporting a domain
    /// failure such as division by zero.
    pub fn math(reason: impl Into<String>) -> Self {
        EvalError::Math(reason.into())
    }
}

/// Dictionary and builder configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("'{0}' is a reserved label")]
    ReservedLabel(String),
    #[error("'{0}' is not a valid label")]
    InvalidLabel(String),
    #[error("precedence {0} is out of range (must be at least 1)")]
    InvalidPrecedence(u32),
    #[error("'{label}' declares unsupported arity {arity}")]
    InvalidArity { label: String, arity: usize },
    #[error("'{0}' is not a valid operand or variable pattern")]
    InvalidPattern(String),
}

/// Anything that can go wrong between a source string and an
/// [`Expression`](crate::expr::Expression).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Top-level error for one-shot helpers that build and evaluate in a single
/// call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
