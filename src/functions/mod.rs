//! Built-in functions for calculator hosts: elementary math and simple
//! statistics, connected on top of a plain [`Interpreter`](crate::Interpreter).

pub mod math;
pub mod statistics;

use crate::error::EvalResult;
use crate::interpreter::Interpreter;

/// Connects the whole built-in function set to the interpreter.
///
/// Fails if any of the names is already connected, so this should run
/// before host-specific functions are added.
pub fn register_functions(interpreter: &mut Interpreter) -> EvalResult<()> {
    math::register(interpreter)?;
    statistics::register(interpreter)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;

    #[test]
    fn registers_on_a_fresh_interpreter() {
        let mut interpreter = Interpreter::new();
        register_functions(&mut interpreter).unwrap();
        assert_eq!(interpreter.eval("abs(-2)").unwrap(), 2.0);
        assert_eq!(interpreter.eval("sum(1,2,3)").unwrap(), 6.0);
    }

    #[test]
    fn registration_is_not_idempotent() {
        let mut interpreter = Interpreter::new();
        register_functions(&mut interpreter).unwrap();
        assert!(matches!(
            register_functions(&mut interpreter),
            Err(EvalError::FunctionAlreadyConnected { .. })
        ));
    }
}
