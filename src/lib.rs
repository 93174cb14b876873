use pkb::design_extractor::DesignExtractor;
use pkb::error::ExtractionError;
use pkb::pkb_context::PkbContext;
use pql::config::EvaluatorConfig;
use pql::evaluator::cancellation::CancellationToken;
use pql::evaluator::QueryEvaluator;
use pql::optimizer::GroupingOptimizer;
use pql::pql_lexer::PqlLexer;
use pql::pql_parser::{PqlParser, PqlParserError};
use pql::projector::ResultProjector;
use pql::query::query_builder::PqlQueryBuilder;
use simple::ast::Node;
use simple::simple_parser::{SimpleParser, SimpleParserError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum SpaError {
    #[error("Invalid SIMPLE program: {0}")]
    Program(#[from] SimpleParserError),
    #[error("Invalid SIMPLE program: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("Invalid query: {0}")]
    Query(#[from] PqlParserError),
}

pub fn parse(source: &str) -> Result<Node, SpaError> {
    Ok(SimpleParser::default().parse_program(source)?)
}

/// Parses a SIMPLE program and extracts its knowledge base.
pub fn analyze(source: &str) -> Result<PkbContext, SpaError> {
    let ast = parse(source)?;
    Ok(DesignExtractor::extract(&ast)?)
}

/// Answers one PQL query. Invalid queries are errors; a query with no
/// matches answers with no lines, or `FALSE` when it is boolean.
pub fn answer(
    pkb: &PkbContext,
    query: &str,
    config: &EvaluatorConfig,
    token: &CancellationToken,
) -> Result<Vec<String>, SpaError> {
    let mut parser = PqlParser::new(Box::new(PqlLexer::default()), Box::new(PqlQueryBuilder::default()));
    let query = parser.parse(query)?;

    let mut optimizer = GroupingOptimizer::new(&query);
    let results = QueryEvaluator::new(pkb, config).evaluate(&query, &mut optimizer, token);
    let answer = ResultProjector::new(pkb).project(&query, &results);

    debug!(lines = answer.len(), "answer.done");
    Ok(answer)
}
