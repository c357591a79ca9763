pub mod ast;
pub mod expr_parser;
pub mod lexer;
pub mod parser;
pub mod token;
