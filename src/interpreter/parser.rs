//! Precedence-driven construction of the AST from analyzed tokens.

use log::debug;

use crate::error::{EvalError, EvalResult};

use super::{AstNode, OperatorKind, Token, TokenKind, MAX_AST_DEPTH};

/// Lid words marking, on the working stack, where a partial expression
/// ends. Popping stops at the matching lid.
const PARENTHESIS_STACK_LID: &str = "(PARENTHESIS_STACK_LID)";
const SEPARATOR_STACK_LID: &str = "(SEPARATOR_STACK_LID)";
const CALL_BEGIN_STACK_LID: &str = "(CALL_BEGIN_STACK_LID)";

fn stack_lid(word: &'static str) -> AstNode {
    AstNode::new(Token::new(TokenKind::StackLid, word))
}

pub struct Parser;

impl Parser {
    /// Parses tokens and constructs the AST, working left to right over a
    /// stack of partially built subtrees.
    ///
    /// For each operator, precomputed next-operator precedences decide
    /// whether the token to its right becomes its operand immediately, or
    /// belongs to a tighter-binding operator further right. Whenever an
    /// operator node is completed, stronger operators below it on the
    /// stack absorb it as their right operand.
    pub fn parse(tokens: &[Token]) -> EvalResult<AstNode> {
        let next_operator_precedences = next_operator_precedences(tokens);
        let mut stack: Vec<AstNode> = Vec::new();
        let mut itoken = 0;
        while itoken < tokens.len() {
            let token = &tokens[itoken];
            match token.kind {
                TokenKind::NumberLiteral
                | TokenKind::VariableIdentifier
                | TokenKind::FunctionIdentifier => {
                    stack.push(AstNode::new(token.clone()));
                }
                TokenKind::Parenthesis => {
                    if token.word == "(" {
                        stack.push(stack_lid(PARENTHESIS_STACK_LID));
                    } else {
                        let partial = pop_partial_expr_nodes(&mut stack, PARENTHESIS_STACK_LID)?
                            .into_iter()
                            .next()
                            .ok_or(EvalError::Internal {
                                message: "no partial expression between parentheses",
                            })?;
                        stack.push(partial);
                        connect_operators_in_stack(&mut stack, next_operator_precedences[itoken]);
                    }
                }
                TokenKind::ExpressionSeparator => {
                    stack.push(stack_lid(SEPARATOR_STACK_LID));
                }
                TokenKind::Operator => {
                    let operator = token.operator.ok_or(EvalError::Internal {
                        message: "operator token carries no operator descriptor",
                    })?;
                    let next_precedence = next_operator_precedences[itoken];
                    let mut operator_node = AstNode::new(token.clone());
                    match operator.kind {
                        OperatorKind::UnaryPrefix => {
                            if should_add_right_token_as_operand(
                                operator.precedence,
                                next_precedence,
                            ) {
                                itoken += 1;
                                let operand = tokens.get(itoken).ok_or(EvalError::Internal {
                                    message: "prefix operator at the end of the tokens",
                                })?;
                                operator_node.children.push(AstNode::new(operand.clone()));
                            }
                        }
                        OperatorKind::Binary => {
                            let left = stack.pop().ok_or(EvalError::Internal {
                                message: "no left operand on the stack for a binary operator",
                            })?;
                            operator_node.children.push(left);
                            if should_add_right_token_as_operand(
                                operator.precedence,
                                next_precedence,
                            ) {
                                itoken += 1;
                                let operand = tokens.get(itoken).ok_or(EvalError::Internal {
                                    message: "binary operator at the end of the tokens",
                                })?;
                                operator_node.children.push(AstNode::new(operand.clone()));
                            }
                        }
                        OperatorKind::Call => {
                            if token.word == "(" {
                                let callee = stack.pop().ok_or(EvalError::Internal {
                                    message: "no function identifier before a call parenthesis",
                                })?;
                                operator_node.children.push(callee);
                                stack.push(operator_node);
                                stack.push(stack_lid(CALL_BEGIN_STACK_LID));
                                itoken += 1;
                                continue;
                            }
                            let arguments =
                                pop_partial_expr_nodes(&mut stack, CALL_BEGIN_STACK_LID)?;
                            operator_node = stack.pop().ok_or(EvalError::Internal {
                                message: "no call-begin node on the stack at the call end",
                            })?;
                            operator_node.children.extend(arguments);
                        }
                    }
                    stack.push(operator_node);
                    connect_operators_in_stack(&mut stack, next_precedence);
                }
                TokenKind::StackLid => {
                    return Err(EvalError::Internal {
                        message: "stack-lid token appeared in analyzed tokens",
                    });
                }
            }
            itoken += 1;
        }

        let root = stack.pop().ok_or(EvalError::Internal {
            message: "no node left on the stack after parsing",
        })?;
        debug!("parsed AST root: {:?}", root.token.word);
        root.check_depth(1, MAX_AST_DEPTH)?;
        Ok(root)
    }
}

/// True when the token to the right of the target operator should become
/// its operand directly, instead of belonging to the next operator.
fn should_add_right_token_as_operand(
    target_operator_precedence: u64,
    next_operator_precedence: u64,
) -> bool {
    target_operator_precedence <= next_operator_precedence
}

fn is_stack_top_prior_operator(stack: &[AstNode], next_operator_precedence: u64) -> bool {
    stack.last().is_some_and(|node| {
        node.token.kind == TokenKind::Operator
            && node
                .token
                .operator
                .is_some_and(|operator| operator.precedence <= next_operator_precedence)
    })
}

/// Lets every operator on the stack that binds at least as tightly as the
/// next operator absorb the completed node above it as its right operand.
/// The node may be an operator subtree or a plain leaf, as when a
/// parenthesized group closes over a single literal or variable.
fn connect_operators_in_stack(stack: &mut Vec<AstNode>, next_operator_precedence: u64) {
    let Some(mut connecting) = stack.pop() else {
        return;
    };
    while is_stack_top_prior_operator(stack, next_operator_precedence) {
        if let Some(mut prior) = stack.pop() {
            prior.children.push(connecting);
            connecting = prior;
        }
    }
    stack.push(connecting);
}

/// Pops the root nodes of partial expressions down to the matching stack
/// lid, returning them in source order.
fn pop_partial_expr_nodes(stack: &mut Vec<AstNode>, end_lid_word: &str) -> EvalResult<Vec<AstNode>> {
    if stack.is_empty() {
        return Err(EvalError::UnexpectedPartialExpression);
    }
    let mut partials: Vec<AstNode> = Vec::new();
    while let Some(node) = stack.pop() {
        if node.token.kind == TokenKind::StackLid {
            if node.token.word == end_lid_word {
                break;
            }
        } else {
            partials.push(node);
        }
    }
    partials.reverse();
    Ok(partials)
}

/// For each token index, the precedence of the first operator to its
/// right, scanning right to left. An open parenthesis acts as the
/// strongest next operator, a closed one as the weakest.
fn next_operator_precedences(tokens: &[Token]) -> Vec<u64> {
    let mut precedences = vec![0u64; tokens.len()];
    let mut last_precedence = u64::MAX;
    for (index, token) in tokens.iter().enumerate().rev() {
        precedences[index] = last_precedence;
        if token.kind == TokenKind::Operator {
            if let Some(operator) = token.operator {
                last_precedence = operator.precedence;
            }
        }
        if token.kind == TokenKind::Parenthesis {
            last_precedence = if token.word == "(" { 0 } else { u64::MAX };
        }
    }
    precedences
}
