use std::fmt::Display;
use std::rc::Rc;

use thiserror::Error;

use crate::lexer::Token;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("expected next token to be {expected}, got end of input instead")]
    PrematureEndOfInput { expected: Expected },
    #[error("expected next token to be {expected}, got {got} instead")]
    UnexpectedToken { expected: Expected, got: Token },
    #[error("could not parse {literal} as an integer: {source}")]
    InvalidIntegerLiteral {
        literal: Rc<str>,
        source: std::num::ParseIntError,
    },
    #[error("no prefix parse function for {0} found")]
    NoPrefixFunction(Token),
}

#[derive(Debug, PartialEq)]
pub enum Expected {
    Token(Token),
    Identifier,
    Expression,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(token) => write!(f, "{}", token),
            Expected::Identifier => write!(f, "an identifier"),
            Expected::Expression => write!(f, "an expression"),
        }
    }
}

impl ParseError {
    pub fn premature_end_expected_expression() -> Self {
        ParseError::PrematureEndOfInput {
            expected: Expected::Expression,
        }
    }

    pub fn unexpected_token(expected: Token, got: Option<Token>) -> ParseError {
        match got {
            Some(got) => ParseError::UnexpectedToken {
                expected: Expected::Token(expected),
                got,
            },
            None => ParseError::PrematureEndOfInput {
                expected: Expected::Token(expected),
            },
        }
    }

    pub fn unexpected_other(expected: Expected, got: Option<Token>) -> ParseError {
        match got {
            Some(got) => ParseError::UnexpectedToken { expected, got },
            None => ParseError::PrematureEndOfInput { expected },
        }
    }
}
