use crate::ast::{Node, Operator, RelationOperator};
use crate::simple_lexer::{SimpleLexer, SimpleLexerError, SimpleToken};
use itertools::{peek_nth, Itertools, PeekNth};
use lexing::lexer::Lexer;
use thiserror::Error;

type Tokens = PeekNth<std::vec::IntoIter<SimpleToken>>;

pub struct SimpleParser {
    lexer: Box<dyn Lexer<SimpleToken, SimpleLexerError>>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SimpleParserError {
    #[error(
        "Unexpected: {unexpected}. Expected: [{}]. Near: [{}]",
        .expected.iter().join(", "),
        .near_tokens.iter().join(", ")
    )]
    UnexpectedToken {
        unexpected: SimpleToken,
        expected: Vec<SimpleToken>,
        near_tokens: Vec<SimpleToken>,
    },
    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("Program must contain at least one procedure")]
    EmptyProgram,
    #[error("Statement list before statement {0} is empty")]
    EmptyStatementList(u32),
    #[error("Lexer error: {0}")]
    LexerError(#[from] SimpleLexerError),
}

impl Default for SimpleParser {
    fn default() -> Self {
        SimpleParser::new(Box::new(SimpleLexer::default()))
    }
}

impl SimpleParser {
    pub fn new(lexer: Box<dyn Lexer<SimpleToken, SimpleLexerError>>) -> Self {
        SimpleParser { lexer }
    }

    /// Parses a standalone arithmetic expression, as used by pattern clauses.
    pub fn parse_expression(&self, input: &str) -> Result<Node, SimpleParserError> {
        let mut tokens = self.tokens(input)?;

        let node = expression(&mut tokens)?;
        expect_token(&mut tokens, SimpleToken::Eof)?;

        Ok(node)
    }

    pub fn parse_program(&self, input: &str) -> Result<Node, SimpleParserError> {
        let mut tokens = self.tokens(input)?;

        let mut procedures = Vec::new();
        let mut line = 1;
        while let Some(token) = tokens.peek() {
            if token == &SimpleToken::Eof {
                break;
            }
            procedures.push(procedure(&mut tokens, &mut line)?);
        }

        if procedures.is_empty() {
            return Err(SimpleParserError::EmptyProgram);
        }

        Ok(Node::Program { procedures })
    }

    fn tokens(&self, input: &str) -> Result<Tokens, SimpleParserError> {
        Ok(peek_nth(self.lexer.tokenize(input)?))
    }
}

fn unexpected(
    token: SimpleToken,
    expected: Vec<SimpleToken>,
    tokens: &mut Tokens,
) -> SimpleParserError {
    SimpleParserError::UnexpectedToken {
        unexpected: token,
        expected,
        near_tokens: tokens.take(6).collect(),
    }
}

fn next_token(tokens: &mut Tokens) -> Result<SimpleToken, SimpleParserError> {
    tokens.next().ok_or(SimpleParserError::UnexpectedEndOfInput)
}

fn expect_token(tokens: &mut Tokens, expected: SimpleToken) -> Result<(), SimpleParserError> {
    let token = next_token(tokens)?;

    match token == expected {
        true => Ok(()),
        false => Err(unexpected(token, vec![expected], tokens)),
    }
}

fn expect_keyword(tokens: &mut Tokens, keyword: &str) -> Result<(), SimpleParserError> {
    expect_token(tokens, SimpleToken::name(keyword))
}

fn expect_name(tokens: &mut Tokens) -> Result<String, SimpleParserError> {
    match next_token(tokens)? {
        SimpleToken::Name(name) => Ok(name),
        token => Err(unexpected(token, vec![SimpleToken::name("<name>")], tokens)),
    }
}

fn next_line(line: &mut u32) -> u32 {
    let current = *line;
    *line += 1;
    current
}

fn procedure(tokens: &mut Tokens, line: &mut u32) -> Result<Node, SimpleParserError> {
    expect_keyword(tokens, "procedure")?;
    let name = expect_name(tokens)?;

    let body = Box::new(statement_list(tokens, line)?);

    Ok(Node::Procedure { name, body })
}

fn statement_list(tokens: &mut Tokens, line: &mut u32) -> Result<Node, SimpleParserError> {
    expect_token(tokens, SimpleToken::LeftBrace)?;

    let mut statements = Vec::new();
    loop {
        match tokens.peek() {
            Some(SimpleToken::RightBrace) => {
                tokens.next();
                break;
            }
            Some(_) => statements.push(statement(tokens, line)?),
            None => return Err(SimpleParserError::UnexpectedEndOfInput),
        }
    }

    if statements.is_empty() {
        return Err(SimpleParserError::EmptyStatementList(*line));
    }

    Ok(Node::StatementList { statements })
}

fn statement(tokens: &mut Tokens, line: &mut u32) -> Result<Node, SimpleParserError> {
    // Keywords are not reserved, so `read = 1;` is an assignment.
    if tokens.peek_nth(1) == Some(&SimpleToken::Equal) {
        return assign(tokens, next_line(line));
    }

    let keyword = match tokens.peek() {
        Some(SimpleToken::Name(keyword)) => keyword.clone(),
        _ => String::new(),
    };

    match keyword.as_str() {
        "read" => read(tokens, next_line(line)),
        "print" => print(tokens, next_line(line)),
        "call" => call(tokens, next_line(line)),
        "while" => while_statement(tokens, line),
        "if" => if_statement(tokens, line),
        _ => {
            let token = next_token(tokens)?;
            Err(unexpected(
                token,
                ["<name>", "read", "print", "call", "while", "if"]
                    .into_iter()
                    .map(SimpleToken::name)
                    .collect(),
                tokens,
            ))
        }
    }
}

fn assign(tokens: &mut Tokens, line: u32) -> Result<Node, SimpleParserError> {
    let variable = expect_name(tokens)?;

    expect_token(tokens, SimpleToken::Equal)?;

    let expression = expression(tokens)?;

    expect_token(tokens, SimpleToken::SemiColon)?;

    Ok(Node::Assign {
        line,
        variable,
        expression: Box::new(expression),
    })
}

fn read(tokens: &mut Tokens, line: u32) -> Result<Node, SimpleParserError> {
    expect_keyword(tokens, "read")?;
    let variable = expect_name(tokens)?;
    expect_token(tokens, SimpleToken::SemiColon)?;

    Ok(Node::Read { line, variable })
}

fn print(tokens: &mut Tokens, line: u32) -> Result<Node, SimpleParserError> {
    expect_keyword(tokens, "print")?;
    let variable = expect_name(tokens)?;
    expect_token(tokens, SimpleToken::SemiColon)?;

    Ok(Node::Print { line, variable })
}

fn call(tokens: &mut Tokens, line: u32) -> Result<Node, SimpleParserError> {
    expect_keyword(tokens, "call")?;
    let name = expect_name(tokens)?;
    expect_token(tokens, SimpleToken::SemiColon)?;

    Ok(Node::Call { line, name })
}

fn while_statement(tokens: &mut Tokens, line: &mut u32) -> Result<Node, SimpleParserError> {
    expect_keyword(tokens, "while")?;
    let while_line = next_line(line);

    let condition = Box::new(parenthesized_condition(tokens)?);
    let statements = Box::new(statement_list(tokens, line)?);

    Ok(Node::While {
        line: while_line,
        condition,
        statements,
    })
}

fn if_statement(tokens: &mut Tokens, line: &mut u32) -> Result<Node, SimpleParserError> {
    expect_keyword(tokens, "if")?;
    let if_line = next_line(line);

    let condition = Box::new(parenthesized_condition(tokens)?);

    expect_keyword(tokens, "then")?;
    let if_statements = Box::new(statement_list(tokens, line)?);

    expect_keyword(tokens, "else")?;
    let else_statements = Box::new(statement_list(tokens, line)?);

    Ok(Node::If {
        line: if_line,
        condition,
        if_statements,
        else_statements,
    })
}

fn parenthesized_condition(tokens: &mut Tokens) -> Result<Node, SimpleParserError> {
    expect_token(tokens, SimpleToken::LeftParenthesis)?;
    let node = condition(tokens)?;
    expect_token(tokens, SimpleToken::RightParenthesis)?;

    Ok(node)
}

fn condition(tokens: &mut Tokens) -> Result<Node, SimpleParserError> {
    let is_logical = is_logical_operator_after_group(tokens);

    match tokens.peek() {
        Some(SimpleToken::Not) => {
            tokens.next();
            let condition = Box::new(parenthesized_condition(tokens)?);

            Ok(Node::Not { condition })
        }
        Some(SimpleToken::LeftParenthesis) if is_logical => {
            let left = Box::new(parenthesized_condition(tokens)?);
            let operator = next_token(tokens)?;
            let right = Box::new(parenthesized_condition(tokens)?);

            match operator {
                SimpleToken::And => Ok(Node::And { left, right }),
                _ => Ok(Node::Or { left, right }),
            }
        }
        _ => relation(tokens),
    }
}

/// Looks past the parenthesized group at the front of `tokens` and reports
/// whether it is followed by `&&` or `||`. A group followed by anything else
/// belongs to a relational expression such as `(x + 1) > y`.
fn is_logical_operator_after_group(tokens: &mut Tokens) -> bool {
    if tokens.peek() != Some(&SimpleToken::LeftParenthesis) {
        return false;
    }

    let mut depth = 0i32;
    let mut index = 0;
    loop {
        depth += match tokens.peek_nth(index) {
            Some(SimpleToken::LeftParenthesis) => 1,
            Some(SimpleToken::RightParenthesis) => -1,
            Some(SimpleToken::Eof) | None => return false,
            _ => 0,
        };
        index += 1;

        if depth == 0 {
            return matches!(
                tokens.peek_nth(index),
                Some(SimpleToken::And | SimpleToken::Or)
            );
        }
    }
}

fn relation(tokens: &mut Tokens) -> Result<Node, SimpleParserError> {
    let left = Box::new(expression(tokens)?);

    let token = next_token(tokens)?;
    let operator = match token {
        SimpleToken::Less => RelationOperator::Less,
        SimpleToken::LessEqual => RelationOperator::LessEqual,
        SimpleToken::Greater => RelationOperator::Greater,
        SimpleToken::GreaterEqual => RelationOperator::GreaterEqual,
        SimpleToken::DoubleEqual => RelationOperator::Equal,
        SimpleToken::NotEqual => RelationOperator::NotEqual,
        _ => {
            return Err(unexpected(
                token,
                vec![
                    SimpleToken::Less,
                    SimpleToken::LessEqual,
                    SimpleToken::Greater,
                    SimpleToken::GreaterEqual,
                    SimpleToken::DoubleEqual,
                    SimpleToken::NotEqual,
                ],
                tokens,
            ))
        }
    };

    let right = Box::new(expression(tokens)?);

    Ok(Node::Relation {
        left,
        operator,
        right,
    })
}

fn expression(tokens: &mut Tokens) -> Result<Node, SimpleParserError> {
    let mut node = term(tokens)?;

    loop {
        let operator = match tokens.peek() {
            Some(SimpleToken::Plus) => Operator::Plus,
            Some(SimpleToken::Minus) => Operator::Minus,
            _ => break,
        };
        tokens.next();

        let right = term(tokens)?;
        node = Node::Expression {
            left: Box::new(node),
            operator,
            right: Box::new(right),
        };
    }

    Ok(node)
}

fn term(tokens: &mut Tokens) -> Result<Node, SimpleParserError> {
    let mut node = factor(tokens)?;

    loop {
        let operator = match tokens.peek() {
            Some(SimpleToken::Multiply) => Operator::Times,
            Some(SimpleToken::Divide) => Operator::Divide,
            Some(SimpleToken::Modulo) => Operator::Modulo,
            _ => break,
        };
        tokens.next();

        let right = factor(tokens)?;
        node = Node::Expression {
            left: Box::new(node),
            operator,
            right: Box::new(right),
        };
    }

    Ok(node)
}

fn factor(tokens: &mut Tokens) -> Result<Node, SimpleParserError> {
    let token = next_token(tokens)?;

    match token {
        SimpleToken::Number(value) => Ok(Node::Constant { value }),
        SimpleToken::LeftParenthesis => {
            let node = expression(tokens)?;

            expect_token(tokens, SimpleToken::RightParenthesis)?;

            Ok(node)
        }
        SimpleToken::Name(name) => Ok(Node::Reference { name }),
        _ => Err(unexpected(
            token,
            vec![
                SimpleToken::Number(0),
                SimpleToken::LeftParenthesis,
                SimpleToken::name("<name>"),
            ],
            tokens,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct TestLexer {
        tokens: Vec<SimpleToken>,
    }
    impl Lexer<SimpleToken, SimpleLexerError> for TestLexer {
        fn tokenize(&self, _input: &str) -> Result<Vec<SimpleToken>, SimpleLexerError> {
            Ok(self.tokens.clone())
        }
    }

    fn constant(value: u32) -> Box<Node> {
        Box::new(Node::Constant { value })
    }

    fn reference(name: &str) -> Box<Node> {
        Box::new(Node::Reference {
            name: name.to_string(),
        })
    }

    fn binary(left: Box<Node>, operator: Operator, right: Box<Node>) -> Box<Node> {
        Box::new(Node::Expression {
            left,
            operator,
            right,
        })
    }

    fn program(statements: Vec<Node>) -> Node {
        Node::Program {
            procedures: vec![Node::Procedure {
                name: "main".to_string(),
                body: Box::new(Node::StatementList { statements }),
            }],
        }
    }

    #[rstest]
    #[case::constant(
        &[SimpleToken::Number(1), SimpleToken::Eof],
        Node::Constant { value: 1 }
    )]
    #[case::subtraction(
        &[SimpleToken::Number(1), SimpleToken::Minus, SimpleToken::Number(2), SimpleToken::Eof],
        *binary(constant(1), Operator::Minus, constant(2))
    )]
    #[case::left_associative_subtraction(
        &[SimpleToken::Number(1), SimpleToken::Minus, SimpleToken::Number(2), SimpleToken::Minus, SimpleToken::Number(3), SimpleToken::Eof],
        *binary(binary(constant(1), Operator::Minus, constant(2)), Operator::Minus, constant(3))
    )]
    #[case::precedence(
        &[SimpleToken::Number(1), SimpleToken::Plus, SimpleToken::Number(2), SimpleToken::Multiply, SimpleToken::Number(3), SimpleToken::Eof],
        *binary(constant(1), Operator::Plus, binary(constant(2), Operator::Times, constant(3)))
    )]
    #[case::divide_and_modulo(
        &[SimpleToken::name("a"), SimpleToken::Divide, SimpleToken::name("b"), SimpleToken::Modulo, SimpleToken::Number(2), SimpleToken::Eof],
        *binary(binary(reference("a"), Operator::Divide, reference("b")), Operator::Modulo, constant(2))
    )]
    #[case::parenthesis(
        &[SimpleToken::Number(1),
        SimpleToken::Plus,
        SimpleToken::LeftParenthesis,
        SimpleToken::name("x"),
        SimpleToken::Plus,
        SimpleToken::Number(2),
        SimpleToken::RightParenthesis,
        SimpleToken::Multiply,
        SimpleToken::name("z"),
        SimpleToken::Minus,
        SimpleToken::Number(3),
        SimpleToken::Eof],
        *binary(
            binary(
                constant(1),
                Operator::Plus,
                binary(binary(reference("x"), Operator::Plus, constant(2)), Operator::Times, reference("z")),
            ),
            Operator::Minus,
            constant(3),
        )
    )]
    fn test_parse_expression(
        #[case] tokens: &[SimpleToken],
        #[case] expected: Node,
    ) -> Result<(), SimpleParserError> {
        let test_lexer: Box<dyn Lexer<SimpleToken, SimpleLexerError>> = Box::new(TestLexer {
            tokens: tokens.to_vec(),
        });

        let parser = SimpleParser::new(test_lexer);

        let ast = parser.parse_expression("")?;

        assert_eq!(ast, expected);

        Ok(())
    }

    #[rstest]
    #[case::assignment(
        "procedure main { x = 1; }",
        program(vec![Node::Assign { line: 1, variable: "x".to_string(), expression: constant(1) }])
    )]
    #[case::keywords_as_names(
        "procedure main { read = print + 1; read print; call while; }",
        program(vec![
            Node::Assign { line: 1, variable: "read".to_string(), expression: binary(reference("print"), Operator::Plus, constant(1)) },
            Node::Read { line: 2, variable: "print".to_string() },
            Node::Call { line: 3, name: "while".to_string() },
        ])
    )]
    #[case::while_with_nested_if(
        "procedure main { while (x > 0) { if (y == 1) then { y = 1; } else { print y; } } x = 2; }",
        program(vec![
            Node::While {
                line: 1,
                condition: Box::new(Node::Relation { left: reference("x"), operator: RelationOperator::Greater, right: constant(0) }),
                statements: Box::new(Node::StatementList { statements: vec![
                    Node::If {
                        line: 2,
                        condition: Box::new(Node::Relation { left: reference("y"), operator: RelationOperator::Equal, right: constant(1) }),
                        if_statements: Box::new(Node::StatementList { statements: vec![
                            Node::Assign { line: 3, variable: "y".to_string(), expression: constant(1) },
                        ] }),
                        else_statements: Box::new(Node::StatementList { statements: vec![
                            Node::Print { line: 4, variable: "y".to_string() },
                        ] }),
                    },
                ] }),
            },
            Node::Assign { line: 5, variable: "x".to_string(), expression: constant(2) },
        ])
    )]
    #[case::logical_conditions(
        "procedure main { while ((!((x + 1) < 2)) && (y != 0)) { read x; } }",
        program(vec![
            Node::While {
                line: 1,
                condition: Box::new(Node::And {
                    left: Box::new(Node::Not {
                        condition: Box::new(Node::Relation {
                            left: binary(reference("x"), Operator::Plus, constant(1)),
                            operator: RelationOperator::Less,
                            right: constant(2),
                        }),
                    }),
                    right: Box::new(Node::Relation { left: reference("y"), operator: RelationOperator::NotEqual, right: constant(0) }),
                }),
                statements: Box::new(Node::StatementList { statements: vec![
                    Node::Read { line: 2, variable: "x".to_string() },
                ] }),
            },
        ])
    )]
    fn test_parse_program(#[case] source: &str, #[case] expected: Node) -> Result<(), SimpleParserError> {
        let parser = SimpleParser::default();

        let ast = parser.parse_program(source)?;

        assert_eq!(ast, expected);

        Ok(())
    }

    #[test]
    fn test_statement_numbers_continue_across_procedures() -> Result<(), SimpleParserError> {
        let parser = SimpleParser::default();

        let ast = parser.parse_program("procedure a { x = 1; call b; } procedure b { print x; }")?;

        let Node::Program { procedures } = ast else {
            panic!("expected a program");
        };
        let lines = procedures
            .iter()
            .flat_map(|procedure| match procedure {
                Node::Procedure { body, .. } => body
                    .statements()
                    .iter()
                    .filter_map(Node::line)
                    .collect::<Vec<_>>(),
                _ => vec![],
            })
            .collect::<Vec<_>>();

        assert_eq!(lines, vec![1, 2, 3]);

        Ok(())
    }

    #[rstest]
    #[case::empty_program("", SimpleParserError::EmptyProgram)]
    #[case::empty_statement_list("procedure main { }", SimpleParserError::EmptyStatementList(1))]
    #[case::missing_semicolon("procedure main { x = 1 }", SimpleParserError::UnexpectedToken {
        unexpected: SimpleToken::RightBrace,
        expected: vec![SimpleToken::SemiColon],
        near_tokens: vec![SimpleToken::Eof],
    })]
    #[case::unterminated("procedure main { x = 1;", SimpleParserError::UnexpectedToken {
        unexpected: SimpleToken::Eof,
        expected: vec!["<name>", "read", "print", "call", "while", "if"].into_iter().map(SimpleToken::name).collect(),
        near_tokens: vec![],
    })]
    fn test_parse_program_errors(#[case] source: &str, #[case] expected: SimpleParserError) {
        let parser = SimpleParser::default();

        assert_eq!(parser.parse_program(source), Err(expected));
    }
}
