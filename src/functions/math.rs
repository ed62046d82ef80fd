//! Elementary math functions.

use std::f64::consts::PI;

use crate::error::EvalResult;
use crate::interpreter::Interpreter;

pub fn register(interpreter: &mut Interpreter) -> EvalResult<()> {
    interpreter.connect_function("sin", sin)?;
    interpreter.connect_function("cos", cos)?;
    interpreter.connect_function("tan", tan)?;
    interpreter.connect_function("asin", asin)?;
    interpreter.connect_function("acos", acos)?;
    interpreter.connect_function("atan", atan)?;
    interpreter.connect_function("abs", abs)?;
    interpreter.connect_function("sqrt", sqrt)?;
    interpreter.connect_function("pow", pow)?;
    interpreter.connect_function("exp", exp)?;
    interpreter.connect_function("ln", ln)?;
    interpreter.connect_function("log10", log10)?;
    interpreter.connect_function("rad", rad)?;
    interpreter.connect_function("deg", deg)?;
    Ok(())
}

fn single(args: &[f64]) -> Result<f64, String> {
    match args {
        [value] => Ok(*value),
        _ => Err("Unexpected number of arguments. (expected: 1)".to_string()),
    }
}

fn pair(args: &[f64]) -> Result<(f64, f64), String> {
    match args {
        [first, second] => Ok((*first, *second)),
        _ => Err("Unexpected number of arguments. (expected: 2)".to_string()),
    }
}

pub fn sin(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.sin())
}

pub fn cos(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.cos())
}

pub fn tan(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.tan())
}

pub fn asin(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.asin())
}

pub fn acos(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.acos())
}

pub fn atan(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.atan())
}

pub fn abs(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.abs())
}

pub fn sqrt(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.sqrt())
}

pub fn pow(args: &[f64]) -> Result<f64, String> {
    let (base, exponent) = pair(args)?;
    Ok(base.powf(exponent))
}

pub fn exp(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.exp())
}

pub fn ln(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.ln())
}

pub fn log10(args: &[f64]) -> Result<f64, String> {
    Ok(single(args)?.log10())
}

/// Converts degrees to radians.
pub fn rad(args: &[f64]) -> Result<f64, String> {
    match args.first() {
        Some(degrees) => Ok(PI * degrees / 180.0),
        None => Err("Unexpected number of arguments. (expected: 1)".to_string()),
    }
}

/// Converts radians to degrees.
pub fn deg(args: &[f64]) -> Result<f64, String> {
    match args.first() {
        Some(radians) => Ok(180.0 * radians / PI),
        None => Err("Unexpected number of arguments. (expected: 1)".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;

    #[test]
    fn single_argument_functions_compute() {
        assert_eq!(sin(&[0.0]).unwrap(), 0.0);
        assert_eq!(abs(&[-3.5]).unwrap(), 3.5);
        assert_eq!(sqrt(&[9.0]).unwrap(), 3.0);
        assert_eq!(ln(&[1.0]).unwrap(), 0.0);
        assert_eq!(log10(&[1000.0]).unwrap(), 3.0);
    }

    #[test]
    fn pow_takes_exactly_two_arguments() {
        assert_eq!(pow(&[2.0, 10.0]).unwrap(), 1024.0);
        assert_eq!(
            pow(&[2.0]),
            Err("Unexpected number of arguments. (expected: 2)".to_string())
        );
    }

    #[test]
    fn angle_conversions_round_trip() {
        let radians = rad(&[180.0]).unwrap();
        assert!((radians - PI).abs() < 1e-12);
        assert!((deg(&[radians]).unwrap() - 180.0).abs() < 1e-12);
    }

    #[test]
    fn wrong_arity_is_reported_with_the_function_name() {
        let mut interpreter = Interpreter::new();
        register(&mut interpreter).unwrap();
        assert_eq!(
            interpreter.eval("sin(1,2)"),
            Err(EvalError::FunctionError {
                name: "sin".to_string(),
                message: "Unexpected number of arguments. (expected: 1)".to_string()
            })
        );
    }

    #[test]
    fn out_of_domain_inputs_follow_ieee() {
        assert!(sqrt(&[-1.0]).unwrap().is_nan());
        assert!(asin(&[2.0]).unwrap().is_nan());
        assert_eq!(ln(&[0.0]).unwrap(), f64::NEG_INFINITY);
    }
}
