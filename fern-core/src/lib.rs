pub mod ast;
pub mod lexer;
pub mod parser;

/// Tokenizes and parses `source` in one step. Parse errors never prevent the
/// program of successfully parsed statements from being returned.
pub fn parse(source: &str) -> (ast::Program, Vec<parser::ParseError>) {
    let tokenizer = lexer::Tokenizer::new(source);
    parser::Parser::new(tokenizer).parse_program()
}
