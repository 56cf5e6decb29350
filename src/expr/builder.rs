use std::sync::Arc;

use log::debug;
use regex::Regex;

use crate::expr::dictionary::Dictionary;
use crate::expr::error::{BuildError, ConfigError};
use crate::expr::tokenizer::Tokenizer;
use crate::expr::tree::{self, Expression};
use crate::expr::parser;

/// Reads one matched operand lexeme into a `T`. The error string is carried
/// into [`LexError::InvalidOperand`](crate::expr::LexError::InvalidOperand).
pub type OperandParser<T> = Arc<dyn Fn(&str) -> Result<T, String> + Send + Sync>;

/// Renders a `T` back to source form when an expression is displayed.
pub type OperandPrinter<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Scientific notation first, so `2e3` is not cut at the plain-decimal
/// prefix `2`.
const DEFAULT_OPERAND_PATTERNS: &[&str] = &[
    r"[0-9]+(?:\.[0-9]+)?[eE][+-]?[0-9]+",
    r"[0-9]+(?:\.[0-9]+)?",
];
const DEFAULT_VARIABLE_PATTERN: &str = r"[A-Za-z][A-Za-z0-9]*";

/// Front door of the engine: owns the dictionary, the operand/variable
/// patterns and the operand codec, and turns source strings into
/// [`Expression`]s.
///
/// The dictionary sits behind an `Arc` shared with every expression built
/// from it; [`dictionary_mut`](Self::dictionary_mut) is clone-on-write, so
/// changing the vocabulary never affects expressions already built.
#[derive(Clone)]
pub struct Builder<T> {
    dictionary: Arc<Dictionary<T>>,
    parse_operand: OperandParser<T>,
    print_operand: OperandPrinter<T>,
    operand_patterns: Vec<Regex>,
    variable_pattern: Regex,
}

impl<T: Clone + 'static> Builder<T> {
    /// Creates a builder over `dictionary` with the default numeric operand
    /// patterns (plain decimals and scientific notation) and the default
    /// alphanumeric variable pattern.
    pub fn new<P, W>(dictionary: Dictionary<T>, parse_operand: P, print_operand: W) -> Self
    where
        P: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
        W: Fn(&T) -> String + Send + Sync + 'static,
    {
        let operand_patterns = DEFAULT_OPERAND_PATTERNS
            .iter()
            .map(|pattern| compile(pattern).expect("default operand pattern is valid"))
            .collect();
        let variable_pattern =
            compile(DEFAULT_VARIABLE_PATTERN).expect("default variable pattern is valid");
        Self {
            dictionary: Arc::new(dictionary),
            parse_operand: Arc::new(parse_operand),
            print_operand: Arc::new(print_operand),
            operand_patterns,
            variable_pattern,
        }
    }

    /// Replaces the operand patterns. Patterns are tried in the given order
    /// and matched against the start of the remaining input.
    pub fn with_operand_patterns(mut self, patterns: &[&str]) -> Result<Self, ConfigError> {
        self.operand_patterns = patterns
            .iter()
            .map(|pattern| compile(pattern))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    /// Replaces the variable pattern.
    pub fn with_variable_pattern(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.variable_pattern = compile(pattern)?;
        Ok(self)
    }

    pub fn dictionary(&self) -> &Dictionary<T> {
        &self.dictionary
    }

    /// Mutable access to the dictionary. If expressions built earlier still
    /// hold the current dictionary, it is cloned first and they keep the
    /// vocabulary they were built with.
    pub fn dictionary_mut(&mut self) -> &mut Dictionary<T> {
        Arc::make_mut(&mut self.dictionary)
    }

    /// Runs the whole pipeline: tokenize, reorder to postfix, build the tree.
    pub fn build(&self, input: &str) -> Result<Expression<T>, BuildError> {
        debug!("building expression from {input:?}");
        let tokens = self.tokenizer().tokenize(input)?;
        let postfix = parser::to_postfix(tokens)?;
        let (arena, root) = tree::build_tree(postfix)?;
        Ok(Expression {
            arena,
            root,
            dictionary: Arc::clone(&self.dictionary),
            print_operand: Arc::clone(&self.print_operand),
        })
    }

    pub(crate) fn tokenizer(&self) -> Tokenizer<'_, T> {
        Tokenizer {
            dictionary: &self.dictionary,
            operand_patterns: &self.operand_patterns,
            variable_pattern: &self.variable_pattern,
            parse_operand: &self.parse_operand,
        }
    }
}

/// Anchors a user pattern to the start of the scan position.
fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(&format!("^(?:{pattern})"))
        .map_err(|_| ConfigError::InvalidPattern(pattern.to_string()))
}
