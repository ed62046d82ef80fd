use thiserror::Error;

use crate::interpreter::{
    MAX_AST_DEPTH, MAX_EXPRESSION_CHAR_COUNT, MAX_NAME_CHAR_COUNT, MAX_TOKEN_COUNT,
    MAX_VARIABLE_COUNT,
};

/// Every way an evaluation can fail, from input-contract checks down to
/// errors raised by connected functions.
///
/// The `Internal` variant marks invariant violations inside the interpreter
/// itself. It never corresponds to a mistake in the user's expression; the
/// facade rewraps it into `Unexpected` before it crosses the public `eval`
/// boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("The inputted expression is empty.")]
    EmptyExpression,

    #[error("The length of the expression exceeds the limit (MAX_EXPRESSION_CHAR_COUNT: '{limit}')")]
    ExpressionTooLong { limit: usize },

    #[error("The number of tokens exceeds the limit (MAX_TOKEN_COUNT: '{limit}')")]
    TooManyTokens { limit: usize },

    #[error("The number of open parentheses '(' is deficient.")]
    DeficientOpenParenthesis,

    #[error("The number of closed parentheses ')' is deficient.")]
    DeficientClosedParenthesis,

    #[error("The content of parentheses '()' should not be empty.")]
    EmptyParenthesis,

    #[error("An operand is required at the right of: '{word}'")]
    RightOperandRequired { word: String },

    #[error("An operand is required at the left of: '{word}'")]
    LeftOperandRequired { word: String },

    #[error("An operator is required at the right of: '{word}'")]
    RightOperatorRequired { word: String },

    #[error("An operator is required at the left of: '{word}'")]
    LeftOperatorRequired { word: String },

    #[error("Unknown unary-prefix operator: '{word}'")]
    UnknownUnaryPrefixOperator { word: String },

    #[error("Unknown binary operator: '{word}'")]
    UnknownBinaryOperator { word: String },

    #[error("Unknown operator syntax: '{word}'")]
    UnknownOperatorSyntax { word: String },

    #[error("The depth of the AST exceeds the limit (MAX_AST_DEPTH: '{limit}')")]
    AstDepthExceeded { limit: usize },

    #[error("Unexpected end of a partial expression")]
    UnexpectedPartialExpression,

    #[error("Invalid number literal: '{literal}'")]
    InvalidNumberLiteral { literal: String },

    #[error("Invalid memory address: '{address}'")]
    InvalidMemoryAddress { address: usize },

    #[error("Variable not found: '{name}'")]
    VariableNotFound { name: String },

    #[error("Function not found: '{name}'")]
    FunctionNotFound { name: String },

    #[error("The variable '{name}' is already declared")]
    VariableAlreadyDeclared { name: String },

    #[error("The function '{name}' is already connected")]
    FunctionAlreadyConnected { name: String },

    #[error("The length of the variable name exceeds the limit (MAX_NAME_CHAR_COUNT: '{limit}')")]
    VariableNameTooLong { limit: usize },

    #[error("The length of the function name exceeds the limit (MAX_NAME_CHAR_COUNT: '{limit}')")]
    FunctionNameTooLong { limit: usize },

    #[error("The number of variables has exceeded the limit of: '{limit}'")]
    VariableCountExceeded { limit: usize },

    #[error("Function Error ('{name}'): {message}")]
    FunctionError { name: String, message: String },

    #[error("\"reeval\" is not available before using \"eval\"")]
    ReevalNotAvailable,

    #[error("Interpreter invariant violated: {message}")]
    Internal { message: &'static str },

    #[error("Unexpected error occurred: {message}")]
    Unexpected { message: String },
}

impl EvalError {
    pub(crate) fn expression_too_long() -> Self {
        EvalError::ExpressionTooLong {
            limit: MAX_EXPRESSION_CHAR_COUNT,
        }
    }

    pub(crate) fn too_many_tokens() -> Self {
        EvalError::TooManyTokens {
            limit: MAX_TOKEN_COUNT,
        }
    }

    pub(crate) fn ast_depth_exceeded() -> Self {
        EvalError::AstDepthExceeded {
            limit: MAX_AST_DEPTH,
        }
    }

    pub(crate) fn variable_name_too_long() -> Self {
        EvalError::VariableNameTooLong {
            limit: MAX_NAME_CHAR_COUNT,
        }
    }

    pub(crate) fn function_name_too_long() -> Self {
        EvalError::FunctionNameTooLong {
            limit: MAX_NAME_CHAR_COUNT,
        }
    }

    pub(crate) fn variable_count_exceeded() -> Self {
        EvalError::VariableCountExceeded {
            limit: MAX_VARIABLE_COUNT,
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;
