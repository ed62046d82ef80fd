use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::error::{EvalError, EvalResult};

mod compiler;
mod evaluator;
pub mod lexer;
pub mod parser;

use evaluator::Evaluator;
use lexer::LexicalAnalyzer;
use parser::Parser;

/// The maximum number of characters in an expression.
pub const MAX_EXPRESSION_CHAR_COUNT: usize = 256;
/// The maximum number of characters of variable/function names.
pub const MAX_NAME_CHAR_COUNT: usize = 64;
/// The maximum number of tokens in an expression.
pub const MAX_TOKEN_COUNT: usize = 64;
/// The maximum depth of an Abstract Syntax Tree (AST).
pub const MAX_AST_DEPTH: usize = 32;
/// The maximum number of variables. Must be a power of two, below 2^31:
/// variable reads mask their address with `MAX_VARIABLE_COUNT - 1`.
pub const MAX_VARIABLE_COUNT: usize = 1 << 10;

const _: () = assert!(MAX_VARIABLE_COUNT.is_power_of_two() && MAX_VARIABLE_COUNT < (1 << 31));

/// Symbols recognized as operators by the lexer.
pub(crate) const OPERATOR_SYMBOLS: [char; 6] = ['+', '-', '*', '/', '(', ')'];
/// Symbols at which an expression is split into token words.
pub(crate) const TOKEN_SPLITTER_SYMBOLS: [char; 7] = ['+', '-', '*', '/', '(', ')', ','];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    NumberLiteral,
    Operator,
    ExpressionSeparator,
    Parenthesis,
    VariableIdentifier,
    FunctionIdentifier,
    /// Internal sentinel pushed onto the parser's working stack; never
    /// produced by the lexer.
    StackLid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    UnaryPrefix,
    Binary,
    Call,
}

/// Static description of an operator. Smaller precedence binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    pub kind: OperatorKind,
    pub symbol: char,
    pub precedence: u64,
}

impl Operator {
    /// The function-call begin operator, into which `(` is reclassified
    /// after a function identifier.
    pub(crate) const CALL_BEGIN: Operator = Operator {
        kind: OperatorKind::Call,
        symbol: '(',
        precedence: 100,
    };

    /// The function-call end operator. Its precedence is the weakest
    /// possible, so it never triggers a reduction.
    pub(crate) const CALL_END: Operator = Operator {
        kind: OperatorKind::Call,
        symbol: ')',
        precedence: u64::MAX,
    };

    pub(crate) fn unary_prefix(symbol: char) -> Option<Operator> {
        match symbol {
            '-' => Some(Operator {
                kind: OperatorKind::UnaryPrefix,
                symbol,
                precedence: 200,
            }),
            _ => None,
        }
    }

    pub(crate) fn binary(symbol: char) -> Option<Operator> {
        let precedence = match symbol {
            '*' | '/' => 300,
            '+' | '-' => 400,
            _ => return None,
        };
        Some(Operator {
            kind: OperatorKind::Binary,
            symbol,
            precedence,
        })
    }
}

/// One lexical unit of an expression. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The surface form of this token.
    pub word: String,
    /// The operator descriptor, present only for `TokenKind::Operator`.
    pub operator: Option<Operator>,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, word: &str) -> Self {
        Self {
            kind,
            word: word.to_string(),
            operator: None,
        }
    }

    pub(crate) fn with_operator(word: &str, operator: Operator) -> Self {
        Self {
            kind: TokenKind::Operator,
            word: word.to_string(),
            operator: Some(operator),
        }
    }
}

/// A node of the Abstract Syntax Tree. Each node exclusively owns its
/// children.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub token: Token,
    pub children: Vec<AstNode>,
}

impl AstNode {
    pub(crate) fn new(token: Token) -> Self {
        Self {
            token,
            children: Vec::new(),
        }
    }

    /// Checks that no node under this one sits deeper than `max_depth`,
    /// counting this node as being at `depth`.
    pub(crate) fn check_depth(&self, depth: usize, max_depth: usize) -> EvalResult<()> {
        if max_depth < depth {
            return Err(EvalError::ast_depth_exceeded());
        }
        for child in &self.children {
            child.check_depth(depth + 1, max_depth)?;
        }
        Ok(())
    }
}

/// A host-supplied callable bound into the function table.
///
/// Failures are plain messages; the evaluator wraps them together with the
/// function's name into [`EvalError::FunctionError`].
pub type NativeFunction = Arc<dyn Fn(&[f64]) -> Result<f64, String> + Send + Sync>;

/// The interpreter facade: owns the variable memory, the name tables and
/// the compiled-tree cache, and exposes the declare/read/write/connect/eval
/// operations consumed by the host.
///
/// A single instance is not safe for concurrent evaluation: `eval` and
/// `reeval` mutate the cache and memory in place. Use one instance per
/// thread, or serialize access externally.
pub struct Interpreter {
    /// Virtual memory storing values of variables, indexed by address.
    memory: Vec<f64>,
    /// The next free address (max used index + 1).
    memory_usage: usize,
    /// Holds the evaluation tree compiled from the last expression.
    evaluator: Evaluator,
    variable_table: HashMap<String, usize>,
    function_table: HashMap<String, NativeFunction>,
    /// The text evaluated last time, to skip re-parsing.
    last_evaluated_expression: Option<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            memory: vec![0.0; MAX_VARIABLE_COUNT],
            memory_usage: 0,
            evaluator: Evaluator::new(),
            variable_table: HashMap::new(),
            function_table: HashMap::new(),
            last_evaluated_expression: None,
        }
    }

    /// Evaluates the value of an expression.
    ///
    /// The expression is re-tokenized, re-parsed and re-compiled only when
    /// its text differs from the previously evaluated one (or when nothing
    /// is cached yet); otherwise the cached evaluation tree is re-run
    /// against the current memory.
    pub fn eval(&mut self, expression: &str) -> EvalResult<f64> {
        if MAX_EXPRESSION_CHAR_COUNT < expression.chars().count() {
            return Err(EvalError::expression_too_long());
        }
        match self.eval_inner(expression) {
            // Interpreter defects must not cross the public boundary
            // unlabeled.
            Err(EvalError::Internal { message }) => Err(EvalError::Unexpected {
                message: message.to_string(),
            }),
            other => other,
        }
    }

    fn eval_inner(&mut self, expression: &str) -> EvalResult<f64> {
        let expression_changed = self.last_evaluated_expression.as_deref() != Some(expression);
        if expression_changed || !self.evaluator.is_evaluatable() {
            debug!("recompiling expression: {expression}");
            let tokens = LexicalAnalyzer::analyze(expression)?;
            let ast = Parser::parse(&tokens)?;
            self.evaluator
                .update(&ast, &self.variable_table, &self.function_table)?;
            self.last_evaluated_expression = Some(expression.to_string());
        }
        self.evaluator.evaluate(&self.memory)
    }

    /// Re-evaluates the expression evaluated by `eval` last time, against
    /// the current variable values. Fails if nothing has been evaluated
    /// yet.
    ///
    /// The cached tree keeps the addresses and callables resolved when it
    /// was compiled; changes to the variable or function tables made since
    /// then are not noticed.
    pub fn reeval(&mut self) -> EvalResult<f64> {
        if self.evaluator.is_evaluatable() {
            self.evaluator.evaluate(&self.memory)
        } else {
            Err(EvalError::ReevalNotAvailable)
        }
    }

    /// Declares a new variable and returns its virtual address. Addresses
    /// are issued sequentially and never reused.
    pub fn declare_variable(&mut self, name: &str) -> EvalResult<usize> {
        if MAX_NAME_CHAR_COUNT < name.chars().count() {
            return Err(EvalError::variable_name_too_long());
        }
        if self.variable_table.contains_key(name) {
            return Err(EvalError::VariableAlreadyDeclared {
                name: name.to_string(),
            });
        }
        if MAX_VARIABLE_COUNT <= self.memory_usage {
            return Err(EvalError::variable_count_exceeded());
        }
        let address = self.memory_usage;
        self.memory[address] = 0.0;
        self.variable_table.insert(name.to_string(), address);
        self.memory_usage += 1;
        Ok(address)
    }

    /// Writes the value of the variable having the specified name.
    pub fn write_variable(&mut self, name: &str, value: f64) -> EvalResult<()> {
        let address = self.variable_address(name)?;
        self.write_variable_at(address, value)
    }

    /// Writes the variable at the specified virtual address. Faster than
    /// the by-name form.
    pub fn write_variable_at(&mut self, address: usize, value: f64) -> EvalResult<()> {
        if self.memory.len() <= address {
            return Err(EvalError::InvalidMemoryAddress { address });
        }
        // The capacity is a power of two, so the mask keeps any in-range
        // address unchanged.
        self.memory[address & (MAX_VARIABLE_COUNT - 1)] = value;
        Ok(())
    }

    /// Reads the value of the variable having the specified name.
    pub fn read_variable(&self, name: &str) -> EvalResult<f64> {
        let address = self.variable_address(name)?;
        self.read_variable_at(address)
    }

    /// Reads the variable at the specified virtual address.
    pub fn read_variable_at(&self, address: usize) -> EvalResult<f64> {
        if self.memory.len() <= address {
            return Err(EvalError::InvalidMemoryAddress { address });
        }
        Ok(self.memory[address & (MAX_VARIABLE_COUNT - 1)])
    }

    /// Connects a function under the given name, for calling it in
    /// expressions.
    pub fn connect_function<F>(&mut self, name: &str, function: F) -> EvalResult<()>
    where
        F: Fn(&[f64]) -> Result<f64, String> + Send + Sync + 'static,
    {
        if MAX_NAME_CHAR_COUNT < name.chars().count() {
            return Err(EvalError::function_name_too_long());
        }
        if self.function_table.contains_key(name) {
            return Err(EvalError::FunctionAlreadyConnected {
                name: name.to_string(),
            });
        }
        self.function_table.insert(name.to_string(), Arc::new(function));
        Ok(())
    }

    fn variable_address(&self, name: &str) -> EvalResult<usize> {
        if MAX_NAME_CHAR_COUNT < name.chars().count() {
            return Err(EvalError::VariableNotFound {
                name: name.to_string(),
            });
        }
        self.variable_table
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::VariableNotFound {
                name: name.to_string(),
            })
    }
}
