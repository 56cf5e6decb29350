use std::collections::HashMap;
use std::sync::Arc;

use crate::expr::error::{ConfigError, EvalError};
use crate::expr::evaluator::LazyOperand;
use crate::expr::{Arity, Branch, Fixity, Function, Operator};

/// Label of the synthetic operator the tokenizer inserts between two
/// adjacent operand-like tokens (`5x`, `5(5)`, `(a)(b)`).
pub const IMPLICIT_MUL: &str = "×";
/// Label of the reserved unary plus operator.
pub const UNARY_PLUS: &str = "+";
/// Label of the reserved unary minus operator.
pub const UNARY_MINUS: &str = "-";

/// Precedence of the reserved sign operators.
pub const SIGN_PRECEDENCE: u32 = 100;
/// Precedence of the implicit multiplication marker, chosen to match a
/// conventional `*` sitting between additive and exponentiation levels.
pub const IMPLICIT_MUL_PRECEDENCE: u32 = 3;

/// Per-parser registry of everything the tokenizer and parser may
/// recognize: operators keyed by fixity, functions, branches and constants.
///
/// A dictionary is long-lived and mutated only through explicit `add_*` /
/// `remove_*` calls between parses. [`Builder`](crate::expr::Builder) holds
/// it behind an `Arc`, so a configured builder can be shared across threads;
/// mutation after that point goes through clone-on-write.
#[derive(Clone)]
pub struct Dictionary<T> {
    prefix: HashMap<String, Operator<T>>,
    postfix: HashMap<String, Operator<T>>,
    infix: HashMap<String, Operator<T>>,
    functions: HashMap<String, Function<T>>,
    branches: HashMap<String, Branch<T>>,
    constants: HashMap<String, T>,
}

impl<T: Clone + 'static> Dictionary<T> {
    /// Creates a dictionary holding only the three reserved entries: unary
    /// plus (identity), unary minus and the implicit multiplication marker.
    ///
    /// The core cannot synthesize negation or multiplication for an
    /// arbitrary operand type, so the two non-trivial bodies are supplied
    /// here once and owned by the dictionary from then on.
    pub fn new<N, M>(negate: N, multiply: M) -> Self
    where
        N: Fn(&T) -> Result<T, EvalError> + Send + Sync + 'static,
        M: Fn(&T, &T) -> Result<T, EvalError> + Send + Sync + 'static,
    {
        let mut prefix = HashMap::new();
        prefix.insert(
            UNARY_PLUS.to_string(),
            Operator {
                label: UNARY_PLUS.to_string(),
                fixity: Fixity::Prefix,
                precedence: SIGN_PRECEDENCE,
                apply: Arc::new(|args: &[LazyOperand<'_, T>]| args[0].value()),
            },
        );
        prefix.insert(
            UNARY_MINUS.to_string(),
            Operator {
                label: UNARY_MINUS.to_string(),
                fixity: Fixity::Prefix,
                precedence: SIGN_PRECEDENCE,
                apply: Arc::new(move |args: &[LazyOperand<'_, T>]| negate(&args[0].value()?)),
            },
        );
        let mut infix = HashMap::new();
        infix.insert(
            IMPLICIT_MUL.to_string(),
            Operator {
                label: IMPLICIT_MUL.to_string(),
                fixity: Fixity::Infix,
                precedence: IMPLICIT_MUL_PRECEDENCE,
                apply: Arc::new(move |args: &[LazyOperand<'_, T>]| {
                    multiply(&args[0].value()?, &args[1].value()?)
                }),
            },
        );
        Self {
            prefix,
            postfix: HashMap::new(),
            infix,
            functions: HashMap::new(),
            branches: HashMap::new(),
            constants: HashMap::new(),
        }
    }

    pub fn add_operator<F>(
        &mut self,
        label: &str,
        fixity: Fixity,
        precedence: u32,
        apply: F,
    ) -> Result<(), ConfigError>
    where
        F: for<'e> Fn(&[LazyOperand<'e, T>]) -> Result<T, EvalError> + Send + Sync + 'static,
    {
        Self::validate_label(label)?;
        if Self::is_reserved(label, Some(fixity)) {
            return Err(ConfigError::ReservedLabel(label.to_string()));
        }
        if precedence < 1 {
            return Err(ConfigError::InvalidPrecedence(precedence));
        }
        let operator = Operator {
            label: label.to_string(),
            fixity,
            precedence,
            apply: Arc::new(apply),
        };
        self.fixity_map_mut(fixity)
            .insert(label.to_string(), operator);
        Ok(())
    }

    pub fn add_function<F>(&mut self, label: &str, arity: Arity, apply: F) -> Result<(), ConfigError>
    where
        F: for<'e> Fn(&[LazyOperand<'e, T>]) -> Result<T, EvalError> + Send + Sync + 'static,
    {
        Self::validate_label(label)?;
        if Self::is_reserved(label, None) {
            return Err(ConfigError::ReservedLabel(label.to_string()));
        }
        self.functions.insert(
            label.to_string(),
            Function {
                label: label.to_string(),
                arity,
                apply: Arc::new(apply),
            },
        );
        Ok(())
    }

    pub fn add_branch<F>(&mut self, label: &str, arity: Arity, choose: F) -> Result<(), ConfigError>
    where
        F: Fn(&T) -> Result<usize, EvalError> + Send + Sync + 'static,
    {
        Self::validate_label(label)?;
        if Self::is_reserved(label, None) {
            return Err(ConfigError::ReservedLabel(label.to_string()));
        }
        // A branch needs a selector and at least two outcomes.
        if let Arity::Fixed(n) = arity {
            if n < 3 {
                return Err(ConfigError::InvalidArity {
                    label: label.to_string(),
                    arity: n,
                });
            }
        }
        self.branches.insert(
            label.to_string(),
            Branch {
                label: label.to_string(),
                arity,
                choose: Arc::new(choose),
            },
        );
        Ok(())
    }

    pub fn add_constant(&mut self, label: &str, value: T) -> Result<(), ConfigError> {
        Self::validate_label(label)?;
        if Self::is_reserved(label, None) {
            return Err(ConfigError::ReservedLabel(label.to_string()));
        }
        self.constants.insert(label.to_string(), value);
        Ok(())
    }

    /// Removes an operator. `Ok(false)` means the label was not registered.
    pub fn remove_operator(&mut self, label: &str, fixity: Fixity) -> Result<bool, ConfigError> {
        if Self::is_reserved(label, Some(fixity)) {
            return Err(ConfigError::ReservedLabel(label.to_string()));
        }
        Ok(self.fixity_map_mut(fixity).remove(label).is_some())
    }

    pub fn remove_function(&mut self, label: &str) -> Result<bool, ConfigError> {
        Ok(self.functions.remove(label).is_some())
    }

    pub fn remove_branch(&mut self, label: &str) -> Result<bool, ConfigError> {
        Ok(self.branches.remove(label).is_some())
    }

    pub fn remove_constant(&mut self, label: &str) -> Result<bool, ConfigError> {
        Ok(self.constants.remove(label).is_some())
    }

    pub fn get_operator(&self, label: &str, fixity: Fixity) -> Option<&Operator<T>> {
        self.fixity_map(fixity).get(label)
    }

    pub fn get_function(&self, label: &str) -> Option<&Function<T>> {
        self.functions.get(label)
    }

    pub fn get_branch(&self, label: &str) -> Option<&Branch<T>> {
        self.branches.get(label)
    }

    pub fn get_constant(&self, label: &str) -> Option<&T> {
        self.constants.get(label)
    }

    /// Like [`get_constant`](Self::get_constant) but failing with
    /// [`EvalError::UnknownConstant`] on a miss.
    pub fn constant(&self, label: &str) -> Result<&T, EvalError> {
        self.constants
            .get(label)
            .ok_or_else(|| EvalError::UnknownConstant(label.to_string()))
    }

    pub fn has_operator(&self, label: &str, fixity: Fixity) -> bool {
        self.fixity_map(fixity).contains_key(label)
    }

    pub fn has_function(&self, label: &str) -> bool {
        self.functions.contains_key(label)
    }

    pub fn has_branch(&self, label: &str) -> bool {
        self.branches.contains_key(label)
    }

    pub fn has_constant(&self, label: &str) -> bool {
        self.constants.contains_key(label)
    }

    pub(crate) fn constants(&self) -> &HashMap<String, T> {
        &self.constants
    }

    pub(crate) fn prefix_operator(&self, label: &str) -> Option<&Operator<T>> {
        self.prefix.get(label)
    }

    pub(crate) fn postfix_operator(&self, label: &str) -> Option<&Operator<T>> {
        self.postfix.get(label)
    }

    pub(crate) fn infix_operator(&self, label: &str) -> Option<&Operator<T>> {
        self.infix.get(label)
    }

    pub(crate) fn implicit_multiplication(&self) -> Option<&Operator<T>> {
        self.infix.get(IMPLICIT_MUL)
    }

    /// Every registered operator, function and branch label, longest first,
    /// so that the tokenizer never splits `sinh` into `sin` + `h`.
    pub(crate) fn symbol_labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .prefix
            .keys()
            .chain(self.postfix.keys())
            .chain(self.infix.keys())
            .chain(self.functions.keys())
            .chain(self.branches.keys())
            .map(String::as_str)
            .collect();
        labels.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        labels.dedup();
        labels
    }

    fn fixity_map(&self, fixity: Fixity) -> &HashMap<String, Operator<T>> {
        match fixity {
            Fixity::Prefix => &self.prefix,
            Fixity::Postfix => &self.postfix,
            Fixity::Infix | Fixity::InfixRight => &self.infix,
        }
    }

    fn fixity_map_mut(&mut self, fixity: Fixity) -> &mut HashMap<String, Operator<T>> {
        match fixity {
            Fixity::Prefix => &mut self.prefix,
            Fixity::Postfix => &mut self.postfix,
            Fixity::Infix | Fixity::InfixRight => &mut self.infix,
        }
    }

    fn is_reserved(label: &str, fixity: Option<Fixity>) -> bool {
        match fixity {
            Some(Fixity::Prefix) => label == UNARY_PLUS || label == UNARY_MINUS,
            Some(Fixity::Infix) | Some(Fixity::InfixRight) => label == IMPLICIT_MUL,
            Some(Fixity::Postfix) => false,
            // Functions, branches and constants may not shadow any marker.
            None => label == UNARY_PLUS || label == UNARY_MINUS || label == IMPLICIT_MUL,
        }
    }

    fn validate_label(label: &str) -> Result<(), ConfigError> {
        let valid = !label.is_empty()
            && !label
                .chars()
                .any(|c| c.is_whitespace() || "(),".contains(c))
            && !label.starts_with(|c: char| c.is_ascii_digit());
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidLabel(label.to_string()))
        }
    }
}
