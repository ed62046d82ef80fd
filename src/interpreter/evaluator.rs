//! Holder of the compiled evaluation tree for one expression.

use std::collections::HashMap;

use crate::error::{EvalError, EvalResult};

use super::compiler::{self, EvalNode};
use super::{AstNode, NativeFunction};

/// Owns the evaluation tree compiled from the most recent expression. The
/// tree is kept between evaluations so that an unchanged expression can be
/// re-run without recompiling.
pub(crate) struct Evaluator {
    tree: Option<EvalNode>,
}

impl Evaluator {
    pub(crate) fn new() -> Self {
        Self { tree: None }
    }

    /// Compiles the AST and replaces the held tree. On failure the
    /// previous tree is kept.
    pub(crate) fn update(
        &mut self,
        ast: &AstNode,
        variable_table: &HashMap<String, usize>,
        function_table: &HashMap<String, NativeFunction>,
    ) -> EvalResult<()> {
        let tree = compiler::compile(ast, variable_table, function_table)?;
        self.tree = Some(tree);
        Ok(())
    }

    pub(crate) fn is_evaluatable(&self) -> bool {
        self.tree.is_some()
    }

    /// Evaluates the held tree against the given variable memory.
    pub(crate) fn evaluate(&mut self, memory: &[f64]) -> EvalResult<f64> {
        match &mut self.tree {
            Some(tree) => tree.evaluate(memory),
            None => Err(EvalError::Internal {
                message: "evaluate() called before any expression was compiled",
            }),
        }
    }
}
