use crate::expr::{Arity, ConfigError, Dictionary, EvalError, LazyOperand};

/// Registers the elementary math functions, the variable-arity `max`/`min`,
/// the two-argument `log(value, base)`, the `if` branch and the `pi`/`e`
/// constants.
pub fn register(dictionary: &mut Dictionary<f64>) -> Result<(), ConfigError> {
    let unary: &[(&str, fn(f64) -> f64)] = &[
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("asin", f64::asin),
        ("acos", f64::acos),
        ("atan", f64::atan),
        ("sinh", f64::sinh),
        ("cosh", f64::cosh),
        ("tanh", f64::tanh),
        ("sqrt", f64::sqrt),
        ("abs", f64::abs),
        ("ln", f64::ln),
        ("exp", f64::exp),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("round", f64::round),
    ];
    for &(label, function) in unary {
        dictionary.add_function(label, Arity::Fixed(1), move |args: &[LazyOperand<'_, f64>]| {
            Ok(function(args[0].value()?))
        })?;
    }

    dictionary.add_function("log", Arity::Fixed(2), |args| {
        Ok(args[0].value()?.log(args[1].value()?))
    })?;

    dictionary.add_function("max", Arity::Variable, |args| {
        fold(args, "max", f64::max)
    })?;
    dictionary.add_function("min", Arity::Variable, |args| {
        fold(args, "min", f64::min)
    })?;

    // Selector first, then the nonzero and zero outcomes.
    dictionary.add_branch("if", Arity::Fixed(3), |selector| {
        Ok(if *selector != 0.0 { 1 } else { 2 })
    })?;

    dictionary.add_constant("pi", std::f64::consts::PI)?;
    dictionary.add_constant("e", std::f64::consts::E)?;
    Ok(())
}

fn fold<F>(args: &[LazyOperand<'_, f64>], label: &str, combine: F) -> Result<f64, EvalError>
where
    F: Fn(f64, f64) -> f64,
{
    let mut result = match args.first() {
        Some(first) => first.value()?,
        None => return Err(EvalError::math(format!("{label} needs at least one argument"))),
    };
    for arg in &args[1..] {
        result = combine(result, arg.value()?);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::default_builder;

    fn eval(input: &str) -> Result<f64, EvalError> {
        default_builder().build(input).unwrap().evaluate()
    }

    #[test]
    fn test_unary_functions() {
        assert_eq!(eval("sin(0)").unwrap(), 0.0);
        assert_eq!(eval("cos(0)").unwrap(), 1.0);
        assert_eq!(eval("sqrt(81)").unwrap(), 9.0);
        assert_eq!(eval("abs(0 - 3)").unwrap(), 3.0);
        assert_eq!(eval("floor(2.9)").unwrap(), 2.0);
        assert_eq!(eval("ceil(2.1)").unwrap(), 3.0);
        assert_eq!(eval("round(2.5)").unwrap(), 3.0);
        assert_eq!(eval("ln(e)").unwrap(), 1.0);
    }

    #[test]
    fn test_log_takes_value_then_base() {
        assert!((eval("log(8, 2)").unwrap() - 3.0).abs() < 1e-12);
        assert!((eval("log(100, 10)").unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_max_min() {
        assert_eq!(eval("max(3, 1, 2)").unwrap(), 3.0);
        assert_eq!(eval("min(3, 1, 2)").unwrap(), 1.0);
        assert_eq!(eval("max(7)").unwrap(), 7.0);
        assert!(eval("max()").is_err());
    }

    #[test]
    fn test_if_branch() {
        assert_eq!(eval("if(1, 10, 20)").unwrap(), 10.0);
        assert_eq!(eval("if(0, 10, 20)").unwrap(), 20.0);
        assert_eq!(eval("if(0.0001, 10, 20)").unwrap(), 10.0);
    }

    #[test]
    fn test_constants() {
        assert_eq!(eval("pi").unwrap(), std::f64::consts::PI);
        assert_eq!(eval("2pi").unwrap(), 2.0 * std::f64::consts::PI);
        assert_eq!(eval("e ^ 2").unwrap(), std::f64::consts::E.powf(2.0));
    }
}
