pub mod ast;
pub mod canonical;
pub mod simple_lexer;
pub mod simple_parser;
