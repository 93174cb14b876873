use crate::pql_lexer::{PqlLexerError, PqlToken};
use crate::query::query_argument::{Argument, ExpressionArgument};
use crate::query::query_builder::{QueryBuilder, QueryError, ResultType};
use crate::query::Query;
use itertools::{peek_nth, Itertools, PeekNth};
use lexing::lexer::Lexer;
use thiserror::Error;

type Tokens = PeekNth<std::vec::IntoIter<PqlToken>>;

const DESIGN_ENTITIES: [&str; 11] = [
    "stmt",
    "read",
    "print",
    "call",
    "while",
    "if",
    "assign",
    "variable",
    "constant",
    "procedure",
    "prog_line",
];

pub struct PqlParser {
    lexer: Box<dyn Lexer<PqlToken, PqlLexerError>>,
    builder: Box<dyn QueryBuilder>,
}

#[derive(Debug, PartialEq, Error)]
pub enum PqlParserError {
    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("Unexpected declaration: {0}")]
    UnexpectedDeclaration(String),
    #[error("Lexer error: {0}")]
    LexerError(#[from] PqlLexerError),
    #[error(
        "Unexpected: {unexpected}. Expected: [{}]. Near: [{}]",
        .expected.iter().join(", "),
        .near_tokens.iter().join(", ")
    )]
    UnexpectedToken {
        unexpected: PqlToken,
        expected: Vec<PqlToken>,
        near_tokens: Vec<PqlToken>,
    },
    #[error("Expected a clause argument, found {0}")]
    ExpectedArgument(PqlToken),
    #[error(transparent)]
    QueryError(#[from] QueryError),
}

impl PqlParser {
    pub fn new(lexer: Box<dyn Lexer<PqlToken, PqlLexerError>>, builder: Box<dyn QueryBuilder>) -> Self {
        Self { lexer, builder }
    }

    pub fn parse(&mut self, input: &str) -> Result<Query, PqlParserError> {
        let mut tokens = peek_nth(self.lexer.tokenize(input)?);

        let parsed = select(&mut tokens, self.builder.as_mut());
        // Leaves the builder empty for the next query.
        let query = self.builder.build();
        parsed?;

        Ok(query?)
    }
}

fn unexpected(token: PqlToken, expected: Vec<PqlToken>, tokens: &mut Tokens) -> PqlParserError {
    PqlParserError::UnexpectedToken {
        unexpected: token,
        expected,
        near_tokens: tokens.take(6).collect(),
    }
}

fn next_token(tokens: &mut Tokens) -> Result<PqlToken, PqlParserError> {
    tokens.next().ok_or(PqlParserError::UnexpectedEndOfInput)
}

fn expect_token(tokens: &mut Tokens, expected: PqlToken) -> Result<(), PqlParserError> {
    let token = next_token(tokens)?;

    match token == expected {
        true => Ok(()),
        false => Err(unexpected(token, vec![expected], tokens)),
    }
}

fn expect_name(tokens: &mut Tokens) -> Result<String, PqlParserError> {
    match next_token(tokens)? {
        PqlToken::Word(word) => Ok(word),
        token => Err(unexpected(token, vec![PqlToken::word("name")], tokens)),
    }
}

fn select(tokens: &mut Tokens, builder: &mut dyn QueryBuilder) -> Result<(), PqlParserError> {
    loop {
        match tokens.peek() {
            Some(token) if token.is_word("Select") => {
                tokens.next();
                break;
            }
            Some(PqlToken::Eof) | None => return Err(PqlParserError::UnexpectedEndOfInput),
            Some(_) => {
                let declaration = declaration(tokens)?;
                builder.add_declaration(declaration);
            }
        }
    }

    result(tokens, builder)?;
    conditions(tokens, builder)
}

fn declaration(tokens: &mut Tokens) -> Result<(String, Vec<String>), PqlParserError> {
    let entity = match next_token(tokens)? {
        PqlToken::Word(entity) => entity,
        token => {
            let expected = DESIGN_ENTITIES.iter().map(|e| PqlToken::word(e)).collect();
            return Err(unexpected(token, expected, tokens));
        }
    };
    if !DESIGN_ENTITIES.contains(&entity.as_str()) {
        return Err(PqlParserError::UnexpectedDeclaration(entity));
    }

    let names = declaration_names(tokens)?;
    expect_token(tokens, PqlToken::SemiColon)?;

    Ok((entity, names))
}

fn declaration_names(tokens: &mut Tokens) -> Result<Vec<String>, PqlParserError> {
    let mut names = vec![expect_name(tokens)?];

    while tokens.peek() == Some(&PqlToken::Comma) {
        tokens.next();
        names.push(expect_name(tokens)?);
    }

    Ok(names)
}

fn result(tokens: &mut Tokens, builder: &mut dyn QueryBuilder) -> Result<(), PqlParserError> {
    let is_boolean = tokens.peek().is_some_and(|t| t.is_word("BOOLEAN"))
        && tokens.peek_nth(1) != Some(&PqlToken::Dot);

    if is_boolean {
        tokens.next();
        builder.set_result(ResultType::Boolean);
        return Ok(());
    }

    let elements = match tokens.peek() {
        Some(PqlToken::Less) => {
            tokens.next();
            let mut elements = vec![element(tokens)?];
            while tokens.peek() == Some(&PqlToken::Comma) {
                tokens.next();
                elements.push(element(tokens)?);
            }
            expect_token(tokens, PqlToken::Greater)?;
            elements
        }
        _ => vec![element(tokens)?],
    };

    builder.set_result(ResultType::Tuple(elements));
    Ok(())
}

/// `synonym` or `synonym.attribute`.
fn element(tokens: &mut Tokens) -> Result<Argument, PqlParserError> {
    let synonym = expect_name(tokens)?;

    if tokens.peek() == Some(&PqlToken::Dot) {
        tokens.next();
        let attribute = expect_name(tokens)?;
        return Ok(Argument::Attribute(synonym, attribute));
    }

    Ok(Argument::Synonym(synonym))
}

fn conditions(tokens: &mut Tokens, builder: &mut dyn QueryBuilder) -> Result<(), PqlParserError> {
    loop {
        let token = next_token(tokens)?;

        let clause: fn(&mut Tokens, &mut dyn QueryBuilder) -> Result<(), PqlParserError> = match token {
            PqlToken::Eof => return Ok(()),
            PqlToken::SuchThat => relationship,
            PqlToken::Word(ref word) if word == "pattern" => pattern,
            PqlToken::Word(ref word) if word == "with" => with,
            _ => {
                let expected = vec![
                    PqlToken::SuchThat,
                    PqlToken::word("pattern"),
                    PqlToken::word("with"),
                    PqlToken::Eof,
                ];
                return Err(unexpected(token, expected, tokens));
            }
        };

        clause(tokens, builder)?;
        while tokens.peek().is_some_and(|t| t.is_word("and")) {
            tokens.next();
            clause(tokens, builder)?;
        }
    }
}

fn relationship(tokens: &mut Tokens, builder: &mut dyn QueryBuilder) -> Result<(), PqlParserError> {
    let name = expect_name(tokens)?;

    expect_token(tokens, PqlToken::LeftParenthesis)?;
    let left = argument(tokens)?;
    expect_token(tokens, PqlToken::Comma)?;
    let right = argument(tokens)?;
    expect_token(tokens, PqlToken::RightParenthesis)?;

    builder.add_relationship(name, left, right);

    Ok(())
}

fn argument(tokens: &mut Tokens) -> Result<Argument, PqlParserError> {
    let result = match next_token(tokens)? {
        PqlToken::Underscore => Argument::Any,
        PqlToken::Word(word) => Argument::Synonym(word),
        PqlToken::Number(number) => Argument::Number(number),
        PqlToken::Quoted(name) => Argument::Quoted(name),
        token => return Err(PqlParserError::ExpectedArgument(token)),
    };

    Ok(result)
}

/// `syn(entRef, expression)` for assignments and whiles, `syn(entRef, _, _)`
/// for ifs. Which one applies is checked against the declaration later.
fn pattern(tokens: &mut Tokens, builder: &mut dyn QueryBuilder) -> Result<(), PqlParserError> {
    let synonym = expect_name(tokens)?;

    expect_token(tokens, PqlToken::LeftParenthesis)?;
    let variable = argument(tokens)?;
    expect_token(tokens, PqlToken::Comma)?;
    let expression = expression(tokens)?;

    let mut argument_count = 2;
    while tokens.peek() == Some(&PqlToken::Comma) {
        tokens.next();
        expect_token(tokens, PqlToken::Underscore)?;
        argument_count += 1;
    }
    expect_token(tokens, PqlToken::RightParenthesis)?;

    builder.add_pattern(synonym, variable, expression, argument_count);

    Ok(())
}

fn expression(tokens: &mut Tokens) -> Result<ExpressionArgument, PqlParserError> {
    match next_token(tokens)? {
        PqlToken::Quoted(text) => Ok(ExpressionArgument::Exact(text)),
        PqlToken::Underscore => match tokens.peek() {
            Some(PqlToken::Quoted(_)) => {
                let Some(PqlToken::Quoted(text)) = tokens.next() else {
                    return Err(PqlParserError::UnexpectedEndOfInput);
                };
                expect_token(tokens, PqlToken::Underscore)?;
                Ok(ExpressionArgument::SubExpression(text))
            }
            _ => Ok(ExpressionArgument::Any),
        },
        token => Err(PqlParserError::ExpectedArgument(token)),
    }
}

fn with(tokens: &mut Tokens, builder: &mut dyn QueryBuilder) -> Result<(), PqlParserError> {
    let left = reference(tokens)?;
    expect_token(tokens, PqlToken::Equal)?;
    let right = reference(tokens)?;

    builder.add_with(left, right);

    Ok(())
}

fn reference(tokens: &mut Tokens) -> Result<Argument, PqlParserError> {
    match tokens.peek() {
        Some(PqlToken::Word(_)) => element(tokens),
        _ => match next_token(tokens)? {
            PqlToken::Number(number) => Ok(Argument::Number(number)),
            PqlToken::Quoted(name) => Ok(Argument::Quoted(name)),
            token => Err(PqlParserError::ExpectedArgument(token)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::query_builder::MockQueryBuilder;
    use mockall::predicate::eq;
    use rstest::rstest;

    fn word(word: &str) -> PqlToken {
        PqlToken::word(word)
    }

    fn synonym(name: &str) -> Argument {
        Argument::Synonym(name.to_string())
    }

    #[rstest]
    #[case::follows_underscore_synonym(
        &[
            word("Follows"),
            PqlToken::LeftParenthesis,
            PqlToken::Underscore,
            PqlToken::Comma,
            word("s"),
            PqlToken::RightParenthesis,
            PqlToken::Eof,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_add_relationship().with(eq("Follows".to_string()), eq(Argument::Any), eq(synonym("s"))).times(1).returning(|_, _, _| {});
        }
    )]
    #[case::parent_transitive_numbers(
        &[
            word("Parent*"),
            PqlToken::LeftParenthesis,
            PqlToken::Number(1),
            PqlToken::Comma,
            PqlToken::Number(2),
            PqlToken::RightParenthesis,
            PqlToken::Eof,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_add_relationship().with(eq("Parent*".to_string()), eq(Argument::Number(1)), eq(Argument::Number(2))).times(1).returning(|_, _, _| {});
        }
    )]
    #[case::uses_quoted_names(
        &[
            word("Uses"),
            PqlToken::LeftParenthesis,
            PqlToken::Quoted("main".to_string()),
            PqlToken::Comma,
            PqlToken::Quoted("x".to_string()),
            PqlToken::RightParenthesis,
            PqlToken::Eof,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_add_relationship()
                .with(eq("Uses".to_string()), eq(Argument::Quoted("main".to_string())), eq(Argument::Quoted("x".to_string())))
                .times(1)
                .returning(|_, _, _| {});
        }
    )]
    fn test_relationship(
        #[case] tokens: &[PqlToken],
        #[case] mock_setup: fn(&mut MockQueryBuilder),
    ) -> Result<(), PqlParserError> {
        let mut builder = MockQueryBuilder::new();
        mock_setup(&mut builder);

        let mut tokens = peek_nth(tokens.to_vec());
        relationship(&mut tokens, &mut builder)
    }

    #[rstest]
    #[case::assign_exact(
        &[
            word("a"),
            PqlToken::LeftParenthesis,
            word("v"),
            PqlToken::Comma,
            PqlToken::Quoted("x + 1".to_string()),
            PqlToken::RightParenthesis,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_add_pattern()
                .with(eq("a".to_string()), eq(synonym("v")), eq(ExpressionArgument::Exact("x + 1".to_string())), eq(2))
                .times(1)
                .returning(|_, _, _, _| {});
        }
    )]
    #[case::assign_sub_expression(
        &[
            word("a"),
            PqlToken::LeftParenthesis,
            PqlToken::Underscore,
            PqlToken::Comma,
            PqlToken::Underscore,
            PqlToken::Quoted("y".to_string()),
            PqlToken::Underscore,
            PqlToken::RightParenthesis,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_add_pattern()
                .with(eq("a".to_string()), eq(Argument::Any), eq(ExpressionArgument::SubExpression("y".to_string())), eq(2))
                .times(1)
                .returning(|_, _, _, _| {});
        }
    )]
    #[case::if_three_arguments(
        &[
            word("ifs"),
            PqlToken::LeftParenthesis,
            PqlToken::Quoted("x".to_string()),
            PqlToken::Comma,
            PqlToken::Underscore,
            PqlToken::Comma,
            PqlToken::Underscore,
            PqlToken::RightParenthesis,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_add_pattern()
                .with(eq("ifs".to_string()), eq(Argument::Quoted("x".to_string())), eq(ExpressionArgument::Any), eq(3))
                .times(1)
                .returning(|_, _, _, _| {});
        }
    )]
    fn test_pattern(
        #[case] tokens: &[PqlToken],
        #[case] mock_setup: fn(&mut MockQueryBuilder),
    ) -> Result<(), PqlParserError> {
        let mut builder = MockQueryBuilder::new();
        mock_setup(&mut builder);

        let mut tokens = peek_nth(tokens.to_vec());
        pattern(&mut tokens, &mut builder)
    }

    struct TestLexer {
        tokens: Vec<PqlToken>,
    }
    impl Lexer<PqlToken, PqlLexerError> for TestLexer {
        fn tokenize(&self, _input: &str) -> Result<Vec<PqlToken>, PqlLexerError> {
            Ok(self.tokens.clone())
        }
    }

    #[rstest]
    #[case::follows_query_with_declarations(
        vec![
            word("stmt"),
            word("s"),
            PqlToken::SemiColon,
            word("assign"),
            word("a"),
            PqlToken::Comma,
            word("b"),
            PqlToken::SemiColon,
            word("Select"),
            word("s"),
            PqlToken::SuchThat,
            word("Follows"),
            PqlToken::LeftParenthesis,
            PqlToken::Underscore,
            PqlToken::Comma,
            word("s"),
            PqlToken::RightParenthesis,
            PqlToken::Eof,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_add_declaration().with(eq(("stmt".to_string(), vec!["s".to_string()]))).times(1).returning(|_| {});
            b.expect_add_declaration().with(eq(("assign".to_string(), vec!["a".to_string(), "b".to_string()]))).times(1).returning(|_| {});
            b.expect_set_result().with(eq(ResultType::Tuple(vec![synonym("s")]))).times(1).returning(|_| {});
            b.expect_add_relationship().with(eq("Follows".to_string()), eq(Argument::Any), eq(synonym("s"))).times(1).returning(|_, _, _| {});
            b.expect_build().times(1).returning(|| Ok(Query::default()));
        }
    )]
    #[case::boolean_with_and_chain(
        vec![
            word("Select"),
            word("BOOLEAN"),
            PqlToken::SuchThat,
            word("Next*"),
            PqlToken::LeftParenthesis,
            PqlToken::Number(1),
            PqlToken::Comma,
            PqlToken::Number(2),
            PqlToken::RightParenthesis,
            word("and"),
            word("Affects"),
            PqlToken::LeftParenthesis,
            PqlToken::Number(1),
            PqlToken::Comma,
            PqlToken::Underscore,
            PqlToken::RightParenthesis,
            PqlToken::Eof,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_set_result().with(eq(ResultType::Boolean)).times(1).returning(|_| {});
            b.expect_add_relationship().with(eq("Next*".to_string()), eq(Argument::Number(1)), eq(Argument::Number(2))).times(1).returning(|_, _, _| {});
            b.expect_add_relationship().with(eq("Affects".to_string()), eq(Argument::Number(1)), eq(Argument::Any)).times(1).returning(|_, _, _| {});
            b.expect_build().times(1).returning(|| Ok(Query::default()));
        }
    )]
    #[case::tuple_with_attributes(
        vec![
            word("call"),
            word("c"),
            PqlToken::SemiColon,
            word("Select"),
            PqlToken::Less,
            word("c"),
            PqlToken::Comma,
            word("c"),
            PqlToken::Dot,
            word("procName"),
            PqlToken::Greater,
            word("with"),
            word("c"),
            PqlToken::Dot,
            word("stmt#"),
            PqlToken::Equal,
            PqlToken::Number(5),
            PqlToken::Eof,
        ],
        |b: &mut MockQueryBuilder| {
            b.expect_add_declaration().with(eq(("call".to_string(), vec!["c".to_string()]))).times(1).returning(|_| {});
            b.expect_set_result()
                .with(eq(ResultType::Tuple(vec![synonym("c"), Argument::Attribute("c".to_string(), "procName".to_string())])))
                .times(1)
                .returning(|_| {});
            b.expect_add_with()
                .with(eq(Argument::Attribute("c".to_string(), "stmt#".to_string())), eq(Argument::Number(5)))
                .times(1)
                .returning(|_, _| {});
            b.expect_build().times(1).returning(|| Ok(Query::default()));
        }
    )]
    fn test_parse(
        #[case] tokens: Vec<PqlToken>,
        #[case] mock_setup: fn(&mut MockQueryBuilder),
    ) -> Result<(), PqlParserError> {
        let mut builder = MockQueryBuilder::new();
        mock_setup(&mut builder);

        let mut parser = PqlParser::new(Box::new(TestLexer { tokens }), Box::new(builder));
        parser.parse("")?;

        Ok(())
    }

    #[rstest]
    #[case::missing_select(vec![word("stmt"), word("s"), PqlToken::SemiColon, PqlToken::Eof], PqlParserError::UnexpectedEndOfInput)]
    #[case::unknown_entity(vec![word("statement"), word("s"), PqlToken::SemiColon], PqlParserError::UnexpectedDeclaration("statement".to_string()))]
    #[case::bad_argument(
        vec![word("Select"), word("s"), PqlToken::SuchThat, word("Follows"), PqlToken::LeftParenthesis, PqlToken::Comma],
        PqlParserError::ExpectedArgument(PqlToken::Comma)
    )]
    #[case::trailing_token(
        vec![word("Select"), word("s"), PqlToken::SemiColon, PqlToken::Eof],
        PqlParserError::UnexpectedToken {
            unexpected: PqlToken::SemiColon,
            expected: vec![PqlToken::SuchThat, word("pattern"), word("with"), PqlToken::Eof],
            near_tokens: vec![PqlToken::Eof],
        }
    )]
    fn test_parse_errors(#[case] tokens: Vec<PqlToken>, #[case] expected: PqlParserError) {
        let mut builder = MockQueryBuilder::new();
        builder.expect_add_declaration().returning(|_| {});
        builder.expect_set_result().returning(|_| {});
        builder.expect_build().times(1).returning(|| Ok(Query::default()));

        let mut parser = PqlParser::new(Box::new(TestLexer { tokens }), Box::new(builder));

        assert_eq!(parser.parse("").err(), Some(expected));
    }

    #[test]
    fn test_semantic_error_is_reported() {
        let mut builder = MockQueryBuilder::new();
        builder.expect_set_result().returning(|_| {});
        builder
            .expect_build()
            .times(1)
            .returning(|| Err(QueryError::UndeclaredSynonym("s".to_string())));

        let tokens = vec![word("Select"), word("s"), PqlToken::Eof];
        let mut parser = PqlParser::new(Box::new(TestLexer { tokens }), Box::new(builder));

        assert_eq!(
            parser.parse("").err(),
            Some(PqlParserError::QueryError(QueryError::UndeclaredSynonym("s".to_string())))
        );
    }
}
