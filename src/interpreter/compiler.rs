//! Compilation of the AST into an evaluation tree, resolving names
//! against the variable and function tables.

use std::collections::HashMap;

use crate::error::{EvalError, EvalResult};

use super::{AstNode, NativeFunction, OperatorKind, TokenKind, MAX_VARIABLE_COUNT};

/// A node of the compiled evaluation tree. Names are already resolved:
/// variables hold their address, calls hold their callable.
pub(crate) enum EvalNode {
    NumberLiteral(f64),
    Variable {
        address: usize,
    },
    Minus {
        operand: Box<EvalNode>,
    },
    Add {
        left: Box<EvalNode>,
        right: Box<EvalNode>,
    },
    Subtract {
        left: Box<EvalNode>,
        right: Box<EvalNode>,
    },
    Multiply {
        left: Box<EvalNode>,
        right: Box<EvalNode>,
    },
    Divide {
        left: Box<EvalNode>,
        right: Box<EvalNode>,
    },
    FunctionCall {
        function: NativeFunction,
        name: String,
        arguments: Vec<EvalNode>,
        /// Reused between evaluations, to call the function without
        /// allocating.
        buffer: Vec<f64>,
    },
    /// Compiled from a function identifier; the containing call node never
    /// evaluates it.
    Nop,
}

impl EvalNode {
    /// Evaluates this subtree against the given variable memory.
    ///
    /// Arithmetic follows IEEE 754: dividing by zero yields an infinity or
    /// NaN, not an error.
    pub(crate) fn evaluate(&mut self, memory: &[f64]) -> EvalResult<f64> {
        match self {
            EvalNode::NumberLiteral(value) => Ok(*value),
            EvalNode::Variable { address } => {
                if memory.len() <= *address {
                    return Err(EvalError::InvalidMemoryAddress { address: *address });
                }
                // In-range addresses pass the mask unchanged; it bounds the
                // access even if the check above is ever broken.
                Ok(memory[*address & (MAX_VARIABLE_COUNT - 1)])
            }
            EvalNode::Minus { operand } => Ok(-operand.evaluate(memory)?),
            EvalNode::Add { left, right } => Ok(left.evaluate(memory)? + right.evaluate(memory)?),
            EvalNode::Subtract { left, right } => {
                Ok(left.evaluate(memory)? - right.evaluate(memory)?)
            }
            EvalNode::Multiply { left, right } => {
                Ok(left.evaluate(memory)? * right.evaluate(memory)?)
            }
            EvalNode::Divide { left, right } => {
                Ok(left.evaluate(memory)? / right.evaluate(memory)?)
            }
            EvalNode::FunctionCall {
                function,
                name,
                arguments,
                buffer,
            } => {
                for (slot, argument) in buffer.iter_mut().zip(arguments.iter_mut()) {
                    *slot = argument.evaluate(memory)?;
                }
                function.as_ref()(buffer).map_err(|message| EvalError::FunctionError {
                    name: name.clone(),
                    message,
                })
            }
            EvalNode::Nop => Ok(f64::NAN),
        }
    }
}

fn take_child(
    children: &mut std::vec::IntoIter<EvalNode>,
    role: &'static str,
) -> EvalResult<EvalNode> {
    children.next().ok_or(EvalError::Internal { message: role })
}

/// Compiles the AST into an evaluation tree, bottom up.
pub(crate) fn compile(
    ast: &AstNode,
    variable_table: &HashMap<String, usize>,
    function_table: &HashMap<String, NativeFunction>,
) -> EvalResult<EvalNode> {
    let mut compiled_children = Vec::with_capacity(ast.children.len());
    for child in &ast.children {
        compiled_children.push(compile(child, variable_table, function_table)?);
    }
    let mut compiled_children = compiled_children.into_iter();

    let token = &ast.token;
    match token.kind {
        TokenKind::NumberLiteral => {
            let value: f64 = token.word.parse().map_err(|_| EvalError::InvalidNumberLiteral {
                literal: token.word.clone(),
            })?;
            Ok(EvalNode::NumberLiteral(value))
        }
        TokenKind::VariableIdentifier => {
            let address = variable_table.get(&token.word).copied().ok_or_else(|| {
                EvalError::VariableNotFound {
                    name: token.word.clone(),
                }
            })?;
            Ok(EvalNode::Variable { address })
        }
        TokenKind::FunctionIdentifier => Ok(EvalNode::Nop),
        TokenKind::Operator => {
            let operator = token.operator.ok_or(EvalError::Internal {
                message: "operator node carries no operator descriptor",
            })?;
            match (operator.kind, operator.symbol) {
                (OperatorKind::UnaryPrefix, '-') => Ok(EvalNode::Minus {
                    operand: Box::new(take_child(&mut compiled_children, "unary minus without operand")?),
                }),
                (OperatorKind::Binary, '+') => Ok(EvalNode::Add {
                    left: Box::new(take_child(&mut compiled_children, "addition without left operand")?),
                    right: Box::new(take_child(&mut compiled_children, "addition without right operand")?),
                }),
                (OperatorKind::Binary, '-') => Ok(EvalNode::Subtract {
                    left: Box::new(take_child(&mut compiled_children, "subtraction without left operand")?),
                    right: Box::new(take_child(&mut compiled_children, "subtraction without right operand")?),
                }),
                (OperatorKind::Binary, '*') => Ok(EvalNode::Multiply {
                    left: Box::new(take_child(&mut compiled_children, "multiplication without left operand")?),
                    right: Box::new(take_child(&mut compiled_children, "multiplication without right operand")?),
                }),
                (OperatorKind::Binary, '/') => Ok(EvalNode::Divide {
                    left: Box::new(take_child(&mut compiled_children, "division without left operand")?),
                    right: Box::new(take_child(&mut compiled_children, "division without right operand")?),
                }),
                (OperatorKind::Call, '(') => {
                    let name = ast
                        .children
                        .first()
                        .map(|child| child.token.word.clone())
                        .ok_or(EvalError::Internal {
                            message: "call node without a function identifier child",
                        })?;
                    let function =
                        function_table
                            .get(&name)
                            .cloned()
                            .ok_or_else(|| EvalError::FunctionNotFound { name: name.clone() })?;
                    // Child 0 is the identifier's Nop; the rest are
                    // arguments.
                    let arguments: Vec<EvalNode> = compiled_children.skip(1).collect();
                    let buffer = vec![0.0; arguments.len()];
                    Ok(EvalNode::FunctionCall {
                        function,
                        name,
                        arguments,
                        buffer,
                    })
                }
                _ => Err(EvalError::Internal {
                    message: "unexpected operator in the AST",
                }),
            }
        }
        _ => Err(EvalError::Internal {
            message: "unexpected token kind in the AST",
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::EvalError;
    use crate::interpreter::Interpreter;

    fn eval(expression: &str) -> f64 {
        Interpreter::new().eval(expression).unwrap()
    }

    #[test]
    fn evaluates_literals_and_arithmetic() {
        assert_eq!(eval("2"), 2.0);
        assert_eq!(eval("1.25"), 1.25);
        assert_eq!(eval("1.2e+2"), 120.0);
        assert_eq!(eval("2+3*4"), 14.0);
        assert_eq!(eval("(2+3)*4"), 20.0);
        assert_eq!(eval("8-3-2"), 3.0);
        assert_eq!(eval("7/2"), 3.5);
        assert_eq!(eval("-3+4"), 1.0);
        assert_eq!(eval("-(3+4)"), -7.0);
        assert_eq!(eval("(2)"), 2.0);
    }

    #[test]
    fn parenthesized_leaf_operands_keep_their_operator() {
        assert_eq!(eval("1+(2)"), 3.0);
        assert_eq!(eval("6*(7)"), 42.0);
        assert_eq!(eval("-(2)"), -2.0);
        assert_eq!(eval("1+(2)*3"), 7.0);
        assert_eq!(eval("1+((2))"), 3.0);
    }

    #[test]
    fn division_follows_ieee_semantics() {
        assert_eq!(eval("1/0"), f64::INFINITY);
        assert_eq!(eval("-1/0"), f64::NEG_INFINITY);
        assert!(eval("0/0").is_nan());
    }

    #[test]
    fn evaluates_declared_variables() {
        let mut interpreter = Interpreter::new();
        interpreter.declare_variable("x").unwrap();
        interpreter.write_variable("x", 2.5).unwrap();
        assert_eq!(interpreter.eval("x*4").unwrap(), 10.0);
    }

    #[test]
    fn undeclared_variable_fails_at_compilation() {
        let mut interpreter = Interpreter::new();
        assert_eq!(
            interpreter.eval("1+missing"),
            Err(EvalError::VariableNotFound {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn evaluates_connected_functions() {
        let mut interpreter = Interpreter::new();
        interpreter
            .connect_function("scale", |args: &[f64]| Ok(args[0] * args[1]))
            .unwrap();
        assert_eq!(interpreter.eval("scale(3,4)").unwrap(), 12.0);
        assert_eq!(interpreter.eval("scale(1+2,2*3)").unwrap(), 18.0);
    }

    #[test]
    fn nested_calls_evaluate_inner_first() {
        let mut interpreter = Interpreter::new();
        interpreter
            .connect_function("inc", |args: &[f64]| Ok(args[0] + 1.0))
            .unwrap();
        assert_eq!(interpreter.eval("inc(inc(inc(0)))").unwrap(), 3.0);
    }

    #[test]
    fn unknown_function_fails_at_compilation() {
        let mut interpreter = Interpreter::new();
        assert_eq!(
            interpreter.eval("missing(1)"),
            Err(EvalError::FunctionNotFound {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn function_failures_carry_the_function_name() {
        let mut interpreter = Interpreter::new();
        interpreter
            .connect_function("fail", |_: &[f64]| Err("broken".to_string()))
            .unwrap();
        assert_eq!(
            interpreter.eval("fail(1)"),
            Err(EvalError::FunctionError {
                name: "fail".to_string(),
                message: "broken".to_string()
            })
        );
    }

    #[test]
    fn cached_tree_reflects_variable_updates() {
        let mut interpreter = Interpreter::new();
        interpreter.declare_variable("x").unwrap();
        interpreter.write_variable("x", 1.0).unwrap();
        assert_eq!(interpreter.eval("x+1").unwrap(), 2.0);
        interpreter.write_variable("x", 10.0).unwrap();
        // Same text, so the compiled tree is reused against new memory.
        assert_eq!(interpreter.eval("x+1").unwrap(), 11.0);
        interpreter.write_variable("x", -1.0).unwrap();
        assert_eq!(interpreter.reeval().unwrap(), 0.0);
    }

    #[test]
    fn failed_recompilation_keeps_the_previous_tree() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.eval("1+2").unwrap(), 3.0);
        assert!(interpreter.eval("1+missing").is_err());
        assert_eq!(interpreter.reeval().unwrap(), 3.0);
    }

    #[test]
    fn compiled_tree_ignores_later_table_changes() {
        let mut interpreter = Interpreter::new();
        interpreter
            .connect_function("f", |args: &[f64]| Ok(args[0] * 2.0))
            .unwrap();
        assert_eq!(interpreter.eval("f(3)").unwrap(), 6.0);
        // The cached tree still holds the callable resolved at compile
        // time.
        assert_eq!(interpreter.reeval().unwrap(), 6.0);
    }
}
