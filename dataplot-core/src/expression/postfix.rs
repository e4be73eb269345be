//! Shunting-yard conversion to postfix and the stack machine that runs it.

use super::token::{Function, Operator, Token, TokenKind};
use crate::error::{PlotError, Result};

/// Reorders infix tokens into postfix (reverse Polish) order.
///
/// Prefix minus is pushed without popping anything, so it binds to the
/// operand that follows it. A function is popped together with the
/// parenthesized group right after it.
pub(crate) fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        match token.kind {
            TokenKind::Number(_) | TokenKind::Dataset(_) | TokenKind::Variable => output.push(token),
            TokenKind::Function(_) => {
                if !tokens.peek().is_some_and(|next| next.kind == TokenKind::OpenParen) {
                    return Err(PlotError::MissingArgument(token.text));
                }
                stack.push(token);
            }
            TokenKind::OpenParen => stack.push(token),
            TokenKind::CloseParen => {
                loop {
                    match stack.pop() {
                        Some(Token {
                            kind: TokenKind::OpenParen,
                            ..
                        }) => break,
                        Some(top) => output.push(top),
                        None => return Err(PlotError::UnbalancedParentheses),
                    }
                }
                if stack
                    .last()
                    .is_some_and(|top| matches!(top.kind, TokenKind::Function(_)))
                {
                    output.extend(stack.pop());
                }
            }
            TokenKind::Operator(Operator::Negate) => stack.push(token),
            TokenKind::Operator(operator) => {
                while let Some(top) = stack.last() {
                    let TokenKind::Operator(top_operator) = top.kind else {
                        break;
                    };
                    let pops = top_operator.precedence() > operator.precedence()
                        || (top_operator.precedence() == operator.precedence()
                            && !operator.is_right_associative());
                    if !pops {
                        break;
                    }
                    output.extend(stack.pop());
                }
                stack.push(token);
            }
        }
    }

    while let Some(top) = stack.pop() {
        if top.kind == TokenKind::OpenParen {
            return Err(PlotError::UnbalancedParentheses);
        }
        output.push(top);
    }
    Ok(output)
}

/// An evaluation strategy for postfix programs.
pub(crate) trait Backend {
    type Value;

    fn number(&self, value: f64) -> Self::Value;
    fn dataset(&self, index: usize, token: &Token) -> Result<Self::Value>;
    fn variable(&self, token: &Token) -> Result<Self::Value>;
    fn negate(&self, value: Self::Value) -> Result<Self::Value>;
    fn binary(&self, operator: Operator, lhs: Self::Value, rhs: Self::Value) -> Result<Self::Value>;
    fn function(&self, function: Function, token: &Token, argument: Self::Value) -> Result<Self::Value>;
}

/// Runs a postfix program on a single stack of backend values.
pub(crate) fn evaluate<B: Backend>(backend: &B, postfix: &[Token]) -> Result<B::Value> {
    let mut stack: Vec<B::Value> = Vec::new();
    let missing = |token: &Token| PlotError::MissingOperand(token.text.clone());

    for token in postfix {
        let value = match token.kind {
            TokenKind::Number(value) => backend.number(value),
            TokenKind::Dataset(index) => backend.dataset(index, token)?,
            TokenKind::Variable => backend.variable(token)?,
            TokenKind::Operator(Operator::Negate) => {
                let operand = stack.pop().ok_or_else(|| missing(token))?;
                backend.negate(operand)?
            }
            TokenKind::Operator(operator) => {
                let rhs = stack.pop().ok_or_else(|| missing(token))?;
                let lhs = stack.pop().ok_or_else(|| missing(token))?;
                backend.binary(operator, lhs, rhs)?
            }
            TokenKind::Function(function) => {
                let argument = stack.pop().ok_or_else(|| PlotError::MissingArgument(token.text.clone()))?;
                backend.function(function, token, argument)?
            }
            TokenKind::OpenParen | TokenKind::CloseParen => {
                return Err(PlotError::UnbalancedParentheses);
            }
        };
        stack.push(value);
    }

    let result = stack.pop().ok_or(PlotError::EmptyExpression)?;
    if !stack.is_empty() {
        let last = postfix.last().map(|t| (t.text.clone(), t.position)).unwrap_or_default();
        return Err(PlotError::MissingOperator {
            token: last.0,
            position: last.1,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::token::{Mode, tokenize};

    fn postfix(expression: &str) -> String {
        let tokens = tokenize(expression, &[], Mode::Symbolic).unwrap();
        to_postfix(tokens)
            .unwrap()
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(postfix("2+3*4"), "2 3 4 * +");
        assert_eq!(postfix("2^3^2"), "2 3 2 ^ ^");
        assert_eq!(postfix("8-4-2"), "8 4 - 2 -");
        assert_eq!(postfix("(1+2)%3"), "1 2 + 3 %");
    }

    #[test]
    fn negate_binds_tightest() {
        assert_eq!(postfix("-2^2"), "2 - 2 ^");
        assert_eq!(postfix("2^-2"), "2 2 - ^");
        assert_eq!(postfix("--s"), "s - -");
    }

    #[test]
    fn functions_take_the_following_group() {
        assert_eq!(postfix("sqrt(4)*2"), "4 sqrt 2 *");
        assert_eq!(postfix("exp(-(1+s))"), "1 s + - exp");
    }

    #[test]
    fn function_without_parentheses() {
        let tokens = tokenize("sin 2", &[], Mode::Symbolic).unwrap();
        assert_eq!(to_postfix(tokens), Err(PlotError::MissingArgument("sin".to_string())));
    }
}
