//! Tokenizer for plot expressions.
//!
//! At each position the scanner tries, in order: a number literal, a function
//! keyword, an operator (deciding unary minus from the previous token), and
//! finally a dataset reference or the Laplace variable `s`.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::error::{PlotError, Result};
use crate::series::NamedSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    /// Prefix minus.
    Negate,
}

impl Operator {
    pub(crate) fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Subtract => 1,
            Operator::Multiply | Operator::Divide | Operator::Modulo => 2,
            Operator::Power => 3,
            Operator::Negate => 4,
        }
    }

    pub(crate) fn is_right_associative(self) -> bool {
        matches!(self, Operator::Power | Operator::Negate)
    }

    pub(crate) fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract | Operator::Negate => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
            Operator::Modulo => '%',
            Operator::Power => '^',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Ln,
    Log10,
    Exp,
    Abs,
    Sqrt,
    Fft,
    Derivative,
    Integral,
    Rms,
}

impl Function {
    /// The function applied to one value; `None` for functions that only
    /// make sense on a whole series.
    pub(crate) fn apply_scalar(self, value: f64) -> Option<f64> {
        let result = match self {
            Function::Sin => value.sin(),
            Function::Cos => value.cos(),
            Function::Tan => value.tan(),
            Function::Asin => value.asin(),
            Function::Acos => value.acos(),
            Function::Atan => value.atan(),
            Function::Ln => value.ln(),
            Function::Log10 => value.log10(),
            Function::Exp => value.exp(),
            Function::Abs => value.abs(),
            Function::Sqrt => value.sqrt(),
            Function::Fft | Function::Derivative | Function::Integral | Function::Rms => {
                return None;
            }
        };
        Some(result)
    }
}

static FUNCTIONS: Lazy<BTreeMap<&'static str, Function>> = Lazy::new(|| {
    BTreeMap::from([
        ("sin", Function::Sin),
        ("cos", Function::Cos),
        ("tan", Function::Tan),
        ("asin", Function::Asin),
        ("acos", Function::Acos),
        ("atan", Function::Atan),
        ("ln", Function::Ln),
        ("log", Function::Ln),
        ("log10", Function::Log10),
        ("exp", Function::Exp),
        ("abs", Function::Abs),
        ("sqrt", Function::Sqrt),
        ("fft", Function::Fft),
        ("ddt", Function::Derivative),
        ("derivative", Function::Derivative),
        ("int", Function::Integral),
        ("integral", Function::Integral),
        ("rms", Function::Rms),
    ])
});

static BINARY_OPERATORS: Lazy<BTreeMap<char, Operator>> = Lazy::new(|| {
    BTreeMap::from([
        ('+', Operator::Add),
        ('-', Operator::Subtract),
        ('*', Operator::Multiply),
        ('/', Operator::Divide),
        ('%', Operator::Modulo),
        ('^', Operator::Power),
    ])
});

/// Whether `s` is read as the Laplace variable or as a dataset name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Numeric,
    Symbolic,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    /// Index into the dataset list.
    Dataset(usize),
    Variable,
    Operator(Operator),
    Function(Function),
    OpenParen,
    CloseParen,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) text: String,
    /// Byte offset into the expression.
    pub(crate) position: usize,
}

impl Token {
    fn is_operand(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Number(_) | TokenKind::Dataset(_) | TokenKind::Variable | TokenKind::CloseParen
        )
    }
}

/// Finds a dataset by exact description, then ignoring case.
fn find_dataset(datasets: &[NamedSeries], name: &str) -> Option<usize> {
    datasets
        .iter()
        .position(|d| d.description == name)
        .or_else(|| {
            let lower = name.to_lowercase();
            datasets
                .iter()
                .position(|d| d.description.to_lowercase() == lower)
        })
}

/// Resolves the contents of a `[...]` reference: a 1-based index or a description.
fn resolve_bracketed(datasets: &[NamedSeries], inner: &str) -> Result<usize> {
    let inner = inner.trim();
    if let Ok(index) = inner.parse::<usize>() {
        if index == 0 || index > datasets.len() {
            return Err(PlotError::UnknownDataset(format!("[{inner}]")));
        }
        return Ok(index - 1);
    }
    find_dataset(datasets, inner).ok_or_else(|| PlotError::UnknownDataset(inner.to_string()))
}

struct Scanner<'e> {
    expression: &'e str,
    bytes: &'e [u8],
    pos: usize,
}

impl<'e> Scanner<'e> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.pos += 1;
        }
    }

    fn next_non_space(&self) -> Option<u8> {
        self.bytes[self.pos..]
            .iter()
            .copied()
            .find(|b| !b.is_ascii_whitespace())
    }

    fn number(&mut self) -> Result<f64> {
        let start = self.pos;
        self.skip_while(|b| b.is_ascii_digit());
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.skip_while(|b| b.is_ascii_digit());
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some(b'+' | b'-')));
            self.pos += 1 + sign;
            if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
                return Err(PlotError::UnknownToken {
                    token: self.expression[start..self.pos].to_string(),
                    position: start,
                });
            }
            self.skip_while(|b| b.is_ascii_digit());
        }
        let text = &self.expression[start..self.pos];
        text.parse::<f64>().map_err(|_| PlotError::UnknownToken {
            token: text.to_string(),
            position: start,
        })
    }

    fn identifier(&mut self) -> &'e str {
        let start = self.pos;
        self.skip_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        &self.expression[start..self.pos]
    }
}

/// Splits `expression` into tokens, resolving dataset references against
/// `datasets`.
pub(crate) fn tokenize(expression: &str, datasets: &[NamedSeries], mode: Mode) -> Result<Vec<Token>> {
    let mut scanner = Scanner {
        expression,
        bytes: expression.as_bytes(),
        pos: 0,
    };
    let mut tokens: Vec<Token> = Vec::new();
    let mut depth: usize = 0;

    while let Some(byte) = scanner.peek() {
        let start = scanner.pos;
        if byte.is_ascii_whitespace() {
            scanner.pos += 1;
            continue;
        }
        let expects_operand = !tokens.last().is_some_and(Token::is_operand);

        let kind = if byte.is_ascii_digit()
            || (byte == b'.' && scanner.peek_at(1).is_some_and(|b| b.is_ascii_digit()))
        {
            TokenKind::Number(scanner.number()?)
        } else if byte.is_ascii_alphabetic() || byte == b'_' {
            let word = scanner.identifier();
            let lower = word.to_lowercase();
            if let Some(&function) = FUNCTIONS.get(lower.as_str()) {
                TokenKind::Function(function)
            } else if mode == Mode::Symbolic && lower == "s" {
                TokenKind::Variable
            } else if let Some(index) = find_dataset(datasets, word) {
                TokenKind::Dataset(index)
            } else if scanner.next_non_space() == Some(b'(') {
                return Err(PlotError::UnknownFunction(word.to_string()));
            } else {
                return Err(PlotError::UnknownDataset(word.to_string()));
            }
        } else if byte == b'[' {
            let Some(length) = expression[start..].find(']') else {
                return Err(PlotError::UnknownToken {
                    token: expression[start..].to_string(),
                    position: start,
                });
            };
            scanner.pos = start + length + 1;
            TokenKind::Dataset(resolve_bracketed(datasets, &expression[start + 1..start + length])?)
        } else if byte == b'(' {
            depth += 1;
            scanner.pos += 1;
            TokenKind::OpenParen
        } else if byte == b')' {
            depth = depth.checked_sub(1).ok_or(PlotError::UnbalancedParentheses)?;
            scanner.pos += 1;
            TokenKind::CloseParen
        } else if let Some(&operator) = BINARY_OPERATORS.get(&char::from(byte)) {
            scanner.pos += 1;
            if !expects_operand {
                TokenKind::Operator(operator)
            } else {
                match operator {
                    Operator::Subtract => TokenKind::Operator(Operator::Negate),
                    Operator::Add => continue,
                    _ => return Err(PlotError::MissingOperand(operator.symbol().to_string())),
                }
            }
        } else {
            let token = expression[start..].chars().next().map(String::from).unwrap_or_default();
            return Err(PlotError::UnknownToken {
                token,
                position: start,
            });
        };

        let token = Token {
            kind,
            text: expression[start..scanner.pos].to_string(),
            position: start,
        };
        let starts_operand = !matches!(token.kind, TokenKind::Operator(_) | TokenKind::CloseParen);
        if starts_operand && !expects_operand {
            return Err(PlotError::MissingOperator {
                token: token.text,
                position: start,
            });
        }
        tokens.push(token);
    }

    if depth != 0 {
        return Err(PlotError::UnbalancedParentheses);
    }
    if tokens.is_empty() {
        return Err(PlotError::EmptyExpression);
    }
    Ok(tokens)
}
