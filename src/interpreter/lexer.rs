//! Tokenization of expression text, with syntax checks that run before
//! parsing.

use std::collections::HashSet;

use log::debug;

use crate::error::{EvalError, EvalResult};

use super::{
    Operator, OperatorKind, Token, TokenKind, MAX_TOKEN_COUNT, OPERATOR_SYMBOLS,
    TOKEN_SPLITTER_SYMBOLS,
};

/// Number literals are replaced by this sentinel before the expression is
/// split at operator symbols, so that the '+'/'-' of an exponent part is
/// not mistaken for an operator.
pub(crate) const ESCAPED_NUMBER_LITERAL: &str = "@NUMBER_LITERAL@";

pub struct LexicalAnalyzer;

impl LexicalAnalyzer {
    /// Splits the expression into tokens and checks their syntax.
    pub fn analyze(expression: &str) -> EvalResult<Vec<Token>> {
        let mut number_literals: Vec<String> = Vec::new();
        let escaped = escape_number_literals(expression, &mut number_literals);

        let mut spaced = String::with_capacity(escaped.len() * 2);
        for symbol in escaped.chars() {
            if TOKEN_SPLITTER_SYMBOLS.contains(&symbol) {
                spaced.push(' ');
                spaced.push(symbol);
                spaced.push(' ');
            } else {
                spaced.push(symbol);
            }
        }

        let token_words: Vec<&str> = spaced.split_whitespace().collect();
        if token_words.is_empty() {
            return Err(EvalError::EmptyExpression);
        }
        if MAX_TOKEN_COUNT < token_words.len() {
            return Err(EvalError::too_many_tokens());
        }
        debug!("token words: {token_words:?}");

        let tokens = create_tokens_from_token_words(&token_words, &number_literals)?;
        check_parenthesis_balance(&tokens)?;
        check_empty_parentheses(&tokens)?;
        check_locations_of_operators_and_leafs(&tokens)?;
        Ok(tokens)
    }
}

/// Replaces each number literal with [`ESCAPED_NUMBER_LITERAL`], storing
/// the original texts in order of appearance.
///
/// A literal starts at a digit preceded by nothing, whitespace or a
/// splitter symbol. A digit glued to an identifier (as in `x2`) belongs to
/// the identifier and is left alone.
fn escape_number_literals(expression: &str, number_literals: &mut Vec<String>) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut escaped = String::with_capacity(expression.len());
    let mut index = 0;
    while index < chars.len() {
        let at_literal_start = chars[index].is_ascii_digit()
            && (index == 0 || {
                let prev = chars[index - 1];
                prev.is_whitespace() || TOKEN_SPLITTER_SYMBOLS.contains(&prev)
            });
        if !at_literal_start {
            escaped.push(chars[index]);
            index += 1;
            continue;
        }

        let start = index;
        while index < chars.len() && chars[index].is_ascii_digit() {
            index += 1;
        }
        // Fraction part. A trailing '.' without digits is not consumed.
        if index + 1 < chars.len() && chars[index] == '.' && chars[index + 1].is_ascii_digit() {
            index += 1;
            while index < chars.len() && chars[index].is_ascii_digit() {
                index += 1;
            }
        }
        // Exponent part, consumed only when at least one digit follows.
        if index < chars.len() && (chars[index] == 'e' || chars[index] == 'E') {
            let mut cursor = index + 1;
            if cursor < chars.len() && (chars[cursor] == '+' || chars[cursor] == '-') {
                cursor += 1;
            }
            let exponent_digits_start = cursor;
            while cursor < chars.len() && chars[cursor].is_ascii_digit() {
                cursor += 1;
            }
            if exponent_digits_start < cursor {
                index = cursor;
            }
        }

        number_literals.push(chars[start..index].iter().collect());
        escaped.push_str(ESCAPED_NUMBER_LITERAL);
    }
    escaped
}

fn single_operator_symbol(word: &str) -> Option<char> {
    let mut chars = word.chars();
    let symbol = chars.next()?;
    if chars.next().is_none() && OPERATOR_SYMBOLS.contains(&symbol) {
        Some(symbol)
    } else {
        None
    }
}

/// Converts token words into classified tokens.
///
/// A `(` directly after a function identifier opens a function call; the
/// set of call depths decides whether the matching `)` closes a call or a
/// plain parenthesis. `-` (and any future prefix symbol) is classified as
/// unary or binary from the preceding token.
fn create_tokens_from_token_words(
    token_words: &[&str],
    number_literals: &[String],
) -> EvalResult<Vec<Token>> {
    let mut parenthesis_depth: i64 = 0;
    let mut call_parenthesis_depths: HashSet<i64> = HashSet::new();
    let mut tokens: Vec<Token> = Vec::with_capacity(token_words.len());
    let mut literal_iter = number_literals.iter();

    for (index, &word) in token_words.iter().enumerate() {
        let token = if word == "(" {
            parenthesis_depth += 1;
            if tokens.last().map(|prev| prev.kind) == Some(TokenKind::FunctionIdentifier) {
                call_parenthesis_depths.insert(parenthesis_depth);
                Token::with_operator(word, Operator::CALL_BEGIN)
            } else {
                Token::new(TokenKind::Parenthesis, word)
            }
        } else if word == ")" {
            let token = if call_parenthesis_depths.remove(&parenthesis_depth) {
                Token::with_operator(word, Operator::CALL_END)
            } else {
                Token::new(TokenKind::Parenthesis, word)
            };
            parenthesis_depth -= 1;
            token
        } else if let Some(symbol) = single_operator_symbol(word) {
            let operator = match tokens.last() {
                None => classify_unary(symbol, word)?,
                Some(prev) if prev.word == "(" || prev.word == "," => {
                    classify_unary(symbol, word)?
                }
                Some(prev)
                    if prev.kind == TokenKind::Operator
                        && prev
                            .operator
                            .is_some_and(|operator| operator.kind != OperatorKind::Call) =>
                {
                    classify_unary(symbol, word)?
                }
                Some(prev)
                    if prev.word == ")"
                        || matches!(
                            prev.kind,
                            TokenKind::NumberLiteral | TokenKind::VariableIdentifier
                        ) =>
                {
                    classify_binary(symbol, word)?
                }
                Some(_) => {
                    return Err(EvalError::UnknownOperatorSyntax {
                        word: word.to_string(),
                    })
                }
            };
            Token::with_operator(word, operator)
        } else if word == ESCAPED_NUMBER_LITERAL {
            match literal_iter.next() {
                Some(literal) => Token::new(TokenKind::NumberLiteral, literal),
                None => {
                    return Err(EvalError::Internal {
                        message: "number literal store exhausted during token creation",
                    })
                }
            }
        } else if word == "," {
            Token::new(TokenKind::ExpressionSeparator, word)
        } else if token_words.get(index + 1) == Some(&"(") {
            Token::new(TokenKind::FunctionIdentifier, word)
        } else {
            Token::new(TokenKind::VariableIdentifier, word)
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn classify_unary(symbol: char, word: &str) -> EvalResult<Operator> {
    Operator::unary_prefix(symbol).ok_or_else(|| EvalError::UnknownUnaryPrefixOperator {
        word: word.to_string(),
    })
}

fn classify_binary(symbol: char, word: &str) -> EvalResult<Operator> {
    Operator::binary(symbol).ok_or_else(|| EvalError::UnknownBinaryOperator {
        word: word.to_string(),
    })
}

/// Checks the number and correspondence of open and closed parentheses.
fn check_parenthesis_balance(tokens: &[Token]) -> EvalResult<()> {
    let mut hierarchy: i64 = 0;
    for token in tokens {
        if token.word == "(" {
            hierarchy += 1;
        } else if token.word == ")" {
            hierarchy -= 1;
        }
        if hierarchy < 0 {
            return Err(EvalError::DeficientOpenParenthesis);
        }
    }
    if 0 < hierarchy {
        return Err(EvalError::DeficientClosedParenthesis);
    }
    Ok(())
}

/// Checks that no empty pair of plain parentheses exists. Call
/// parentheses are operator tokens, so a zero-argument call passes.
fn check_empty_parentheses(tokens: &[Token]) -> EvalResult<()> {
    let mut content_counter = 0;
    for token in tokens {
        if token.kind == TokenKind::Parenthesis {
            if token.word == "(" {
                content_counter = 0;
            } else if token.word == ")" && content_counter == 0 {
                return Err(EvalError::EmptyParenthesis);
            }
        } else {
            content_counter += 1;
        }
    }
    Ok(())
}

/// Checks that every operator has its operands and every leaf (literal or
/// variable) has an operator between it and any neighboring leaf.
fn check_locations_of_operators_and_leafs(tokens: &[Token]) -> EvalResult<()> {
    let is_leaf = |kind: TokenKind| {
        matches!(kind, TokenKind::NumberLiteral | TokenKind::VariableIdentifier)
    };
    for (index, token) in tokens.iter().enumerate() {
        let next = tokens.get(index + 1);
        let prev = index.checked_sub(1).and_then(|i| tokens.get(i));

        let next_is_leaf = next.is_some_and(|t| is_leaf(t.kind));
        let prev_is_leaf = prev.is_some_and(|t| is_leaf(t.kind));
        let next_is_open_parenthesis = next.is_some_and(|t| t.word == "(");
        let prev_is_close_parenthesis = prev.is_some_and(|t| t.word == ")");
        let next_is_prefix_operator = next.is_some_and(|t| {
            t.kind == TokenKind::Operator
                && t.operator
                    .is_some_and(|operator| operator.kind == OperatorKind::UnaryPrefix)
        });
        let next_is_function_call_begin = next_is_open_parenthesis
            && next.is_some_and(|t| {
                t.kind == TokenKind::Operator
                    && t.operator
                        .is_some_and(|operator| operator.kind == OperatorKind::Call)
            });
        let next_is_function_identifier =
            next.is_some_and(|t| t.kind == TokenKind::FunctionIdentifier);

        if token.kind == TokenKind::Operator {
            let operator_kind = token.operator.map(|operator| operator.kind);
            if operator_kind == Some(OperatorKind::UnaryPrefix)
                && !(next_is_leaf
                    || next_is_open_parenthesis
                    || next_is_prefix_operator
                    || next_is_function_identifier)
            {
                return Err(EvalError::RightOperandRequired {
                    word: token.word.clone(),
                });
            }
            if operator_kind == Some(OperatorKind::Binary) || token.word == "," {
                if !(next_is_leaf
                    || next_is_open_parenthesis
                    || next_is_prefix_operator
                    || next_is_function_identifier)
                {
                    return Err(EvalError::RightOperandRequired {
                        word: token.word.clone(),
                    });
                }
                if !(prev_is_leaf || prev_is_close_parenthesis) {
                    return Err(EvalError::LeftOperandRequired {
                        word: token.word.clone(),
                    });
                }
            }
        }

        if is_leaf(token.kind) {
            if !next_is_function_call_begin && (next_is_open_parenthesis || next_is_leaf) {
                return Err(EvalError::RightOperatorRequired {
                    word: token.word.clone(),
                });
            }
            if prev_is_close_parenthesis || prev_is_leaf {
                return Err(EvalError::LeftOperatorRequired {
                    word: token.word.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|token| token.word.as_str()).collect()
    }

    #[test]
    fn tokenizes_simple_arithmetic() {
        let tokens = LexicalAnalyzer::analyze("1.5+2*x").unwrap();
        assert_eq!(words(&tokens), vec!["1.5", "+", "2", "*", "x"]);
        assert_eq!(tokens[0].kind, TokenKind::NumberLiteral);
        assert_eq!(tokens[1].operator.unwrap().kind, OperatorKind::Binary);
        assert_eq!(tokens[4].kind, TokenKind::VariableIdentifier);
    }

    #[test]
    fn escapes_exponent_notation_as_one_literal() {
        let tokens = LexicalAnalyzer::analyze("1.25e+3").unwrap();
        assert_eq!(words(&tokens), vec!["1.25e+3"]);
        assert_eq!(tokens[0].kind, TokenKind::NumberLiteral);
    }

    #[test]
    fn digit_glued_to_identifier_is_not_a_literal() {
        let tokens = LexicalAnalyzer::analyze("x2+1").unwrap();
        assert_eq!(words(&tokens), vec!["x2", "+", "1"]);
        assert_eq!(tokens[0].kind, TokenKind::VariableIdentifier);
    }

    #[test]
    fn classifies_call_parentheses_as_operators() {
        let tokens = LexicalAnalyzer::analyze("f(1+2)").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::FunctionIdentifier);
        assert_eq!(tokens[1].operator, Some(Operator::CALL_BEGIN));
        assert_eq!(tokens[5].operator, Some(Operator::CALL_END));
    }

    #[test]
    fn plain_parentheses_stay_parentheses_inside_calls() {
        let tokens = LexicalAnalyzer::analyze("f((1+2)*3)").unwrap();
        assert_eq!(tokens[1].operator, Some(Operator::CALL_BEGIN));
        assert_eq!(tokens[2].kind, TokenKind::Parenthesis);
        assert_eq!(tokens[6].kind, TokenKind::Parenthesis);
        assert_eq!(tokens[9].operator, Some(Operator::CALL_END));
    }

    #[test]
    fn minus_is_unary_or_binary_by_context() {
        let tokens = LexicalAnalyzer::analyze("-1-2").unwrap();
        assert_eq!(tokens[0].operator.unwrap().kind, OperatorKind::UnaryPrefix);
        assert_eq!(tokens[2].operator.unwrap().kind, OperatorKind::Binary);
    }

    #[test]
    fn plus_has_no_unary_form() {
        assert_eq!(
            LexicalAnalyzer::analyze("+1"),
            Err(EvalError::UnknownUnaryPrefixOperator {
                word: "+".to_string()
            })
        );
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert_eq!(LexicalAnalyzer::analyze(""), Err(EvalError::EmptyExpression));
        assert_eq!(
            LexicalAnalyzer::analyze("   "),
            Err(EvalError::EmptyExpression)
        );
    }

    #[test]
    fn parenthesis_deficiencies_are_distinguished() {
        assert_eq!(
            LexicalAnalyzer::analyze("(1+2"),
            Err(EvalError::DeficientClosedParenthesis)
        );
        assert_eq!(
            LexicalAnalyzer::analyze("1+2)"),
            Err(EvalError::DeficientOpenParenthesis)
        );
    }

    #[test]
    fn empty_parentheses_are_rejected() {
        assert_eq!(
            LexicalAnalyzer::analyze("()"),
            Err(EvalError::EmptyParenthesis)
        );
        assert_eq!(
            LexicalAnalyzer::analyze("1+()"),
            Err(EvalError::EmptyParenthesis)
        );
    }

    #[test]
    fn operand_and_operator_adjacency_is_checked() {
        assert_eq!(
            LexicalAnalyzer::analyze("1+"),
            Err(EvalError::RightOperandRequired {
                word: "+".to_string()
            })
        );
        assert_eq!(
            LexicalAnalyzer::analyze("*2"),
            Err(EvalError::UnknownUnaryPrefixOperator {
                word: "*".to_string()
            })
        );
        assert_eq!(
            LexicalAnalyzer::analyze("1 2"),
            Err(EvalError::RightOperatorRequired {
                word: "1".to_string()
            })
        );
    }

    #[test]
    fn token_count_limit_is_enforced() {
        let expression = "1".to_string() + &"+1".repeat(40);
        assert_eq!(
            LexicalAnalyzer::analyze(&expression),
            Err(EvalError::too_many_tokens())
        );
    }
}
