//! An embeddable arithmetic expression interpreter for calculator
//! applications.
//!
//! Expressions are tokenized, parsed into an AST and compiled into an
//! evaluation tree held by an [`Interpreter`], which re-runs the tree
//! without recompiling as long as the expression text stays the same.
//! Hosts bind values through declared variables and connect native
//! functions callable from expressions.
//!
//! ```
//! use calcore::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! interpreter.declare_variable("x").unwrap();
//! interpreter.write_variable("x", 2.0).unwrap();
//! assert_eq!(interpreter.eval("(1+x)*3").unwrap(), 9.0);
//! ```

pub mod error;
pub mod functions;
pub mod interpreter;

use std::collections::HashMap;

pub use error::{EvalError, EvalResult};
pub use functions::register_functions;
pub use interpreter::Interpreter;

/// Evaluates a single expression against the given variable values, with
/// the built-in function set and `PI` available.
///
/// This builds a fresh interpreter per call; hosts evaluating repeatedly
/// should hold an [`Interpreter`] instead to benefit from the compiled
/// tree cache.
pub fn evaluate_expression(
    expression: &str,
    variables: &HashMap<String, f64>,
) -> EvalResult<f64> {
    let mut interpreter = Interpreter::new();
    register_functions(&mut interpreter)?;
    for (name, value) in variables {
        interpreter.declare_variable(name)?;
        interpreter.write_variable(name, *value)?;
    }
    if !variables.contains_key("PI") {
        interpreter.declare_variable("PI")?;
        interpreter.write_variable("PI", std::f64::consts::PI)?;
    }
    interpreter.eval(expression)
}

/// Formats an evaluated value for display, rounding to 10 significant
/// digits, trimming trailing zeros and switching to `E` notation outside
/// the fixed-point range.
pub fn format_result(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    // Folds -0.0 into 0.0 so it displays as "0".
    let value = if value == 0.0 { 0.0 } else { value };

    let exponential = format!("{value:.9e}");
    let Some((mantissa, exponent_text)) = exponential.split_once('e') else {
        return exponential;
    };
    let exponent: i32 = exponent_text.parse().unwrap_or(0);

    if (-6..=9).contains(&exponent) {
        let decimals = (9 - exponent) as usize;
        trim_trailing_zeros(format!("{value:.decimals$}"))
    } else {
        let mantissa = trim_trailing_zeros(mantissa.to_string());
        format!("{mantissa}E{exponent}")
    }
}

fn trim_trailing_zeros(mut text: String) -> String {
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_with_builtins_and_pi() {
        let variables = HashMap::new();
        assert_eq!(evaluate_expression("1+2*3", &variables).unwrap(), 7.0);
        let cosine = evaluate_expression("cos(PI)", &variables).unwrap();
        assert!((cosine + 1.0).abs() < 1e-12);
    }

    #[test]
    fn evaluates_with_host_variables() {
        let mut variables = HashMap::new();
        variables.insert("width".to_string(), 3.0);
        variables.insert("height".to_string(), 4.0);
        assert_eq!(
            evaluate_expression("sqrt(width*width+height*height)", &variables).unwrap(),
            5.0
        );
    }

    #[test]
    fn host_supplied_pi_wins() {
        let mut variables = HashMap::new();
        variables.insert("PI".to_string(), 3.0);
        assert_eq!(evaluate_expression("PI", &variables).unwrap(), 3.0);
    }

    #[test]
    fn formats_plain_values() {
        assert_eq!(format_result(0.0), "0");
        assert_eq!(format_result(-0.0), "0");
        assert_eq!(format_result(2.0), "2");
        assert_eq!(format_result(-123.456), "-123.456");
        assert_eq!(format_result(0.5), "0.5");
    }

    #[test]
    fn formats_rounded_values() {
        // 10 significant digits.
        assert_eq!(format_result(1.0 / 3.0), "0.3333333333");
        assert_eq!(format_result(2.0 / 3.0), "0.6666666667");
    }

    #[test]
    fn formats_extreme_magnitudes_in_exponent_notation() {
        assert_eq!(format_result(1.0e12), "1E12");
        assert_eq!(format_result(1.234e-7), "1.234E-7");
        assert_eq!(format_result(0.000001), "0.000001");
        assert_eq!(format_result(9.0e9), "9000000000");
    }

    #[test]
    fn formats_non_finite_values() {
        assert_eq!(format_result(f64::INFINITY), "inf");
        assert_eq!(format_result(f64::NEG_INFINITY), "-inf");
        assert_eq!(format_result(f64::NAN), "NaN");
    }
}
