//! Recursive-descent parser over the token stream.

use thiserror::Error;

use super::tokenizer::{tokenize, Token, TokenKind};
use super::Locale;
use crate::expr::{Connective, Expr};

/// Why a string is not a well-formed proposition.
///
/// `found` holds the offending token text, or `end of input`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected a proposition at offset {offset}, found {found}")]
    UnexpectedToken { offset: usize, found: String },
    #[error("Missing ')' for the parenthesis opened at offset {open}, found {found} at offset {offset}")]
    UnclosedParenthesis {
        open: usize,
        offset: usize,
        found: String,
    },
    #[error("Unexpected {found} at offset {offset} after a complete proposition")]
    TrailingInput { offset: usize, found: String },
    #[error("Empty input")]
    EmptyInput,
}

impl ParseError {
    /// Byte offset of the problem, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::UnexpectedToken { offset, .. }
            | ParseError::UnclosedParenthesis { offset, .. }
            | ParseError::TrailingInput { offset, .. } => Some(*offset),
            ParseError::EmptyInput => None,
        }
    }
}

const END_OF_INPUT: &str = "end of input";

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Byte length of the input, reported as the offset of end of input.
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Offset and description of the current token.
    fn here(&self) -> (usize, String) {
        match self.peek() {
            Some(token) => (token.offset, format!("'{}'", token.text)),
            None => (self.end, END_OF_INPUT.to_string()),
        }
    }

    fn connective_at(&self, level: Connective) -> bool {
        let expected = match level {
            Connective::Iff => TokenKind::Iff,
            Connective::Implies => TokenKind::Implies,
            Connective::Or => TokenKind::Or,
            Connective::And => TokenKind::And,
        };
        self.peek().is_some_and(|t| t.kind == expected)
    }

    /// One binary level: collect operands, then fold them to the right.
    fn binary(&mut self, level: Connective) -> Result<Expr, ParseError> {
        let first = self.operand(level)?;
        let mut rest = Vec::new();
        while self.connective_at(level) {
            self.advance();
            rest.push(self.operand(level)?);
        }
        Ok(match rest.pop() {
            None => first,
            Some(last) => {
                let tail = rest
                    .into_iter()
                    .rev()
                    .fold(last, |acc, operand| level.build(operand, acc));
                level.build(first, tail)
            }
        })
    }

    fn operand(&mut self, level: Connective) -> Result<Expr, ParseError> {
        match level {
            Connective::Iff => self.binary(Connective::Implies),
            Connective::Implies => self.binary(Connective::Or),
            Connective::Or => self.binary(Connective::And),
            Connective::And => self.negation(),
        }
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.binary(Connective::Iff)
    }

    fn negation(&mut self) -> Result<Expr, ParseError> {
        let mut count = 0;
        while self.peek().is_some_and(|t| t.kind == TokenKind::Not) {
            self.advance();
            count += 1;
        }
        let mut expr = self.atom()?;
        for _ in 0..count {
            expr = Expr::not(expr);
        }
        Ok(expr)
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let (offset, found) = self.here();
        let Some(token) = self.advance() else {
            return Err(ParseError::UnexpectedToken { offset, found });
        };
        match &token.kind {
            TokenKind::True => Ok(Expr::truth()),
            TokenKind::False => Ok(Expr::falsity()),
            TokenKind::Variable(name) => Ok(Expr::var(name.clone())),
            TokenKind::MetaVariable(name) => Ok(Expr::meta(name.clone())),
            TokenKind::LeftParen => {
                let inner = self.expression()?;
                match self.peek() {
                    Some(t) if t.kind == TokenKind::RightParen => {
                        self.advance();
                        Ok(inner)
                    }
                    _ => {
                        let (at, found) = self.here();
                        Err(ParseError::UnclosedParenthesis {
                            open: token.offset,
                            offset: at,
                            found,
                        })
                    }
                }
            }
            _ => Err(ParseError::UnexpectedToken { offset, found }),
        }
    }
}

/// Parse an already tokenized proposition.
pub fn parse_tokens(tokens: &[Token], input_len: usize) -> Result<Expr, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input_len,
    };
    let expr = parser.expression()?;
    if parser.peek().is_some() {
        let (offset, found) = parser.here();
        return Err(ParseError::TrailingInput { offset, found });
    }
    Ok(expr)
}

/// Parse `input` with the keywords of `locale`.
pub fn parse(input: &str, locale: Locale) -> Result<Expr, ParseError> {
    parse_tokens(&tokenize(input, locale), input.len())
}
