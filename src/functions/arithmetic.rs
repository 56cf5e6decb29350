use crate::expr::{ConfigError, Dictionary, EvalError, Fixity, LazyOperand};

/// Precedence levels of the default operators. Comparisons bind loosest,
/// exponentiation and the postfix factorial tightest; the reserved implicit
/// multiplication marker sits at the multiplicative level.
const COMPARISON: u32 = 1;
const ADDITIVE: u32 = 2;
const MULTIPLICATIVE: u32 = 3;
const EXPONENT: u32 = 4;
const POSTFIX: u32 = 5;

/// Registers the binary arithmetic operators, the comparison operators
/// (returning `1.0`/`0.0`) and the postfix factorial.
pub fn register(dictionary: &mut Dictionary<f64>) -> Result<(), ConfigError> {
    dictionary.add_operator("+", Fixity::Infix, ADDITIVE, |args| {
        Ok(args[0].value()? + args[1].value()?)
    })?;
    dictionary.add_operator("-", Fixity::Infix, ADDITIVE, |args| {
        Ok(args[0].value()? - args[1].value()?)
    })?;
    dictionary.add_operator("*", Fixity::Infix, MULTIPLICATIVE, |args| {
        Ok(args[0].value()? * args[1].value()?)
    })?;
    dictionary.add_operator("/", Fixity::Infix, MULTIPLICATIVE, |args| {
        let divisor = args[1].value()?;
        if divisor == 0.0 {
            return Err(EvalError::math("division by zero"));
        }
        Ok(args[0].value()? / divisor)
    })?;
    dictionary.add_operator("%", Fixity::Infix, MULTIPLICATIVE, |args| {
        let divisor = args[1].value()?;
        if divisor == 0.0 {
            return Err(EvalError::math("modulo by zero"));
        }
        Ok(args[0].value()? % divisor)
    })?;
    dictionary.add_operator("^", Fixity::InfixRight, EXPONENT, |args| {
        Ok(args[0].value()?.powf(args[1].value()?))
    })?;
    dictionary.add_operator("!", Fixity::Postfix, POSTFIX, |args| {
        factorial(args[0].value()?)
    })?;

    comparison(dictionary, "<", |a, b| a < b)?;
    comparison(dictionary, "<=", |a, b| a <= b)?;
    comparison(dictionary, ">", |a, b| a > b)?;
    comparison(dictionary, ">=", |a, b| a >= b)?;
    comparison(dictionary, "==", |a, b| a == b)?;
    comparison(dictionary, "!=", |a, b| a != b)?;
    Ok(())
}

fn comparison<C>(
    dictionary: &mut Dictionary<f64>,
    label: &str,
    compare: C,
) -> Result<(), ConfigError>
where
    C: Fn(f64, f64) -> bool + Send + Sync + 'static,
{
    dictionary.add_operator(
        label,
        Fixity::Infix,
        COMPARISON,
        move |args: &[LazyOperand<'_, f64>]| {
            Ok(if compare(args[0].value()?, args[1].value()?) {
                1.0
            } else {
                0.0
            })
        },
    )
}

fn factorial(value: f64) -> Result<f64, EvalError> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(EvalError::math(
            "factorial is only defined for non-negative integers",
        ));
    }
    // 171! overflows f64 anyway.
    if value > 170.0 {
        return Err(EvalError::math("factorial operand too large"));
    }
    let mut result = 1.0;
    let mut i = 2.0;
    while i <= value {
        result *= i;
        i += 1.0;
    }
    Ok(result)
}
