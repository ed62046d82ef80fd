//! Simple statistics over the argument list: summation, mean, variance
//! and standard deviation in both the n and n-1 flavors.

use crate::error::EvalResult;
use crate::interpreter::Interpreter;

pub fn register(interpreter: &mut Interpreter) -> EvalResult<()> {
    interpreter.connect_function("sum", sum)?;
    interpreter.connect_function("mean", mean)?;
    interpreter.connect_function("van", van)?;
    interpreter.connect_function("van1", van1)?;
    interpreter.connect_function("sdn", sdn)?;
    interpreter.connect_function("sdn1", sdn1)?;
    Ok(())
}

fn at_least_one(args: &[f64]) -> Result<(), String> {
    if args.is_empty() {
        return Err("Unexpected number of arguments. (expected: more than 1)".to_string());
    }
    Ok(())
}

fn at_least_two(args: &[f64]) -> Result<(), String> {
    if args.len() <= 1 {
        return Err("Unexpected number of arguments. (expected: more than 2)".to_string());
    }
    Ok(())
}

fn sum_of(args: &[f64]) -> f64 {
    args.iter().sum()
}

fn mean_of(args: &[f64]) -> f64 {
    sum_of(args) / args.len() as f64
}

fn sum_of_square_diffs(args: &[f64]) -> f64 {
    let mean_value = mean_of(args);
    args.iter()
        .map(|value| (value - mean_value) * (value - mean_value))
        .sum()
}

pub fn sum(args: &[f64]) -> Result<f64, String> {
    at_least_one(args)?;
    Ok(sum_of(args))
}

pub fn mean(args: &[f64]) -> Result<f64, String> {
    at_least_one(args)?;
    Ok(mean_of(args))
}

/// Population variance, dividing by n.
pub fn van(args: &[f64]) -> Result<f64, String> {
    at_least_one(args)?;
    Ok(sum_of_square_diffs(args) / args.len() as f64)
}

/// Sample variance, dividing by n - 1.
pub fn van1(args: &[f64]) -> Result<f64, String> {
    at_least_two(args)?;
    Ok(sum_of_square_diffs(args) / (args.len() - 1) as f64)
}

/// Population standard deviation.
pub fn sdn(args: &[f64]) -> Result<f64, String> {
    Ok(van(args)?.sqrt())
}

/// Sample standard deviation.
pub fn sdn1(args: &[f64]) -> Result<f64, String> {
    Ok(van1(args)?.sqrt())
}
