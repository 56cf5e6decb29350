use log::debug;
use regex::Regex;

use crate::expr::builder::OperandParser;
use crate::expr::dictionary::{Dictionary, IMPLICIT_MUL, UNARY_MINUS, UNARY_PLUS};
use crate::expr::error::LexError;
use crate::expr::{Separator, Token};

/// Longest-match scanner over a raw expression string.
///
/// The label set comes from the dictionary; operand and variable shapes come
/// from the builder's configured patterns. The scanner also owns the two
/// lexical disambiguations the later stages rely on: a `+`/`-` where no
/// operand has just ended becomes the reserved unary operator, and two
/// adjacent operand-like tokens get the implicit multiplication marker
/// inserted between them.
pub(crate) struct Tokenizer<'a, T> {
    pub(crate) dictionary: &'a Dictionary<T>,
    pub(crate) operand_patterns: &'a [Regex],
    pub(crate) variable_pattern: &'a Regex,
    pub(crate) parse_operand: &'a OperandParser<T>,
}

impl<T: Clone + 'static> Tokenizer<'_, T> {
    pub(crate) fn tokenize(&self, input: &str) -> Result<Vec<Token<T>>, LexError> {
        if input.trim().is_empty() {
            return Err(LexError::BlankInput);
        }
        let labels = self.dictionary.symbol_labels();
        let mut tokens: Vec<Token<T>> = Vec::new();
        let mut pos = 0;
        while pos < input.len() {
            let rest = &input[pos..];
            let ch = match rest.chars().next() {
                Some(ch) => ch,
                None => break,
            };
            if ch.is_whitespace() {
                pos += ch.len_utf8();
                continue;
            }
            if let Some(separator) = match ch {
                '(' => Some(Separator::OpenParen),
                ')' => Some(Separator::CloseParen),
                ',' => Some(Separator::Comma),
                _ => None,
            } {
                if separator == Separator::OpenParen {
                    self.insert_implicit_multiplication(&mut tokens)?;
                }
                tokens.push(Token::Separator(separator));
                pos += 1;
                continue;
            }
            let operand_ended = tokens.last().is_some_and(Token::is_operand_like);
            // A sign where no operand has just ended is the unary operator,
            // never the binary one.
            if (ch == '+' || ch == '-') && !operand_ended {
                let label = if ch == '+' { UNARY_PLUS } else { UNARY_MINUS };
                let operator = self
                    .dictionary
                    .prefix_operator(label)
                    .ok_or_else(|| LexError::UndefinedSymbol(label.to_string()))?;
                tokens.push(Token::Operator(operator.clone()));
                pos += 1;
                continue;
            }
            if let Some(label) = labels.iter().find(|label| rest.starts_with(**label)) {
                let token = self.resolve_label(label, operand_ended, &mut tokens)?;
                tokens.push(token);
                pos += label.len();
                continue;
            }
            if let Some(text) = self.match_operand(rest) {
                let value = (self.parse_operand)(text).map_err(|reason| {
                    LexError::InvalidOperand {
                        text: text.to_string(),
                        reason,
                    }
                })?;
                self.insert_implicit_multiplication(&mut tokens)?;
                tokens.push(Token::Operand(value));
                pos += text.len();
                continue;
            }
            if let Some(m) = self.variable_pattern.find(rest) {
                if m.start() == 0 {
                    self.insert_implicit_multiplication(&mut tokens)?;
                    tokens.push(Token::Variable(m.as_str().to_string()));
                    pos += m.as_str().len();
                    continue;
                }
            }
            let symbol: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
            return Err(LexError::UnrecognizedSymbol {
                position: pos,
                symbol,
            });
        }
        debug!("tokenized {:?} into {} tokens", input, tokens.len());
        Ok(tokens)
    }

    /// Picks the token for a matched label. Function and branch labels are
    /// unambiguous; an operator label is read against the infix/postfix maps
    /// when an operand has just ended and against the prefix map otherwise.
    fn resolve_label(
        &self,
        label: &str,
        operand_ended: bool,
        tokens: &mut Vec<Token<T>>,
    ) -> Result<Token<T>, LexError> {
        if let Some(function) = self.dictionary.get_function(label) {
            self.insert_implicit_multiplication(tokens)?;
            return Ok(Token::Function(function.clone()));
        }
        if let Some(branch) = self.dictionary.get_branch(label) {
            self.insert_implicit_multiplication(tokens)?;
            return Ok(Token::Branch(branch.clone()));
        }
        let operator = if operand_ended {
            self.dictionary
                .infix_operator(label)
                .or_else(|| self.dictionary.postfix_operator(label))
        } else {
            self.dictionary.prefix_operator(label)
        };
        operator
            .map(|op| Token::Operator(op.clone()))
            .ok_or_else(|| LexError::UndefinedSymbol(label.to_string()))
    }

    fn match_operand<'i>(&self, rest: &'i str) -> Option<&'i str> {
        // Patterns are tried in declaration order, so the scientific
        // notation form wins over the plain decimal prefix of the same text.
        for pattern in self.operand_patterns {
            if let Some(m) = pattern.find(rest) {
                if m.start() == 0 {
                    return Some(m.as_str());
                }
            }
        }
        None
    }

    fn insert_implicit_multiplication(&self, tokens: &mut Vec<Token<T>>) -> Result<(), LexError> {
        if tokens.last().is_some_and(Token::is_operand_like) {
            let operator = self
                .dictionary
                .implicit_multiplication()
                .ok_or_else(|| LexError::UndefinedSymbol(IMPLICIT_MUL.to_string()))?;
            tokens.push(Token::Operator(operator.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::default_builder;

    fn signature(input: &str) -> Vec<String> {
        let builder = default_builder();
        let tokens = builder.tokenizer().tokenize(input).unwrap();
        tokens
            .iter()
            .map(|token| match token {
                Token::Operand(v) => v.to_string(),
                other => other.describe(),
            })
            .collect()
    }

    fn lex_error(input: &str) -> LexError {
        let builder = default_builder();
        builder.tokenizer().tokenize(input).unwrap_err()
    }

    #[test]
    fn test_plain_stream() {
        assert_eq!(signature("2 + 3 * 4"), ["2", "+", "3", "*", "4"]);
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(lex_error(""), LexError::BlankInput);
        assert_eq!(lex_error("   \t "), LexError::BlankInput);
    }

    #[test]
    fn test_implicit_multiplication_sites() {
        assert_eq!(signature("5 5"), ["5", "×", "5"]);
        assert_eq!(signature("5x"), ["5", "×", "x"]);
        assert_eq!(signature("5(5)"), ["5", "×", "(", "5", ")"]);
        assert_eq!(signature("(a)(b)"), ["(", "a", ")", "×", "(", "b", ")"]);
        assert_eq!(
            signature("5 max(1)"),
            ["5", "×", "max", "(", "1", ")"]
        );
    }

    #[test]
    fn test_unary_sign_contexts() {
        assert_eq!(signature("-5"), ["-", "5"]);
        assert_eq!(signature("2 * -5"), ["2", "*", "-", "5"]);
        assert_eq!(signature("(-5)"), ["(", "-", "5", ")"]);
        assert_eq!(signature("max(1, -5)"), ["max", "(", "1", ",", "-", "5", ")"]);
        // After an operand the same character is the binary operator.
        assert_eq!(signature("2-5"), ["2", "-", "5"]);
    }

    #[test]
    fn test_longest_match_wins() {
        assert_eq!(signature("sinh(1)"), ["sinh", "(", "1", ")"]);
        assert_eq!(signature("1 <= 2"), ["1", "<=", "2"]);
    }

    #[test]
    fn test_scientific_notation_beats_plain_decimal() {
        assert_eq!(signature("2e3"), ["2000"]);
        assert_eq!(signature("1.5e-2 + 1"), ["0.015", "+", "1"]);
    }

    #[test]
    fn test_variables_interspersed_with_digits() {
        assert_eq!(signature("x1 + y2z"), ["x1", "+", "y2z"]);
    }

    #[test]
    fn test_whitespace_never_tokenized() {
        assert_eq!(signature("  2   +2 "), ["2", "+", "2"]);
    }

    #[test]
    fn test_unrecognized_symbol() {
        assert_eq!(
            lex_error("2 # 3"),
            LexError::UnrecognizedSymbol {
                position: 2,
                symbol: "#".to_string()
            }
        );
    }

    #[test]
    fn test_wrong_fixity_is_undefined() {
        // '!' is registered postfix only, so it cannot open an operand.
        assert_eq!(lex_error("!5"), LexError::UndefinedSymbol("!".to_string()));
    }
}
