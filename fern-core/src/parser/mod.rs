pub mod error;
pub mod expressions;
pub mod statements;

use crate::lexer::Token;
pub use error::ParseError;
use statements::parse_statement;

pub struct Parser<'a> {
    pub iter: std::iter::Peekable<crate::lexer::Tokenizer<'a>>,
}

impl<'a> Parser<'a> {
    pub fn new(tokenizer: crate::lexer::Tokenizer<'a>) -> Self {
        let iter = tokenizer.peekable();
        Self { iter }
    }

    pub(crate) fn parse_ident(&mut self) -> Result<std::rc::Rc<str>, ParseError> {
        let token = self.iter.next();
        match token {
            Some(Token::Ident(name)) => Ok(name),
            _ => Err(ParseError::unexpected_other(
                error::Expected::Identifier,
                token,
            )),
        }
    }

    pub(crate) fn expect_token(&mut self, expected: Token) -> Result<(), ParseError> {
        let token = self.iter.next();
        match token {
            Some(ref got) if *got == expected => Ok(()),
            _ => Err(ParseError::unexpected_token(expected, token)),
        }
    }

    /// Parses the whole input, accumulating errors instead of stopping at the
    /// first one. A failed statement is skipped up to the next semicolon so
    /// that later statements are still parsed and reported; the program of
    /// successfully parsed statements is always returned alongside the error
    /// list, and it is the caller's decision whether to evaluate it.
    pub fn parse_program(&mut self) -> (crate::ast::Program, Vec<ParseError>) {
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        while self.iter.peek().is_some() {
            match parse_statement(self) {
                Ok(statement) => {
                    statements.push(statement);
                }
                Err(err) => {
                    errors.push(err);
                    for token in self.iter.by_ref() {
                        if token == Token::SemiColon {
                            break;
                        }
                    }
                    continue;
                }
            }
            self.iter.next_if(|token| *token == Token::SemiColon);
        }

        (crate::ast::Program { statements }, errors)
    }
}
