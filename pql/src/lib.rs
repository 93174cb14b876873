pub mod config;
pub mod evaluator;
pub mod optimizer;
pub mod pql_lexer;
pub mod pql_parser;
pub mod projector;
pub mod query;
