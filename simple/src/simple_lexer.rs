use lexing::lexer::basic_lexer::{BasicLexer, LexerError, Token};
use lexing::lexer::Lexer;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Default)]
pub struct SimpleLexer {
    base_lexer: BasicLexer,
}

/// Keywords are not reserved in SIMPLE, so every word is lexed as a `Name`
/// and the parser decides from context.
#[derive(Debug, PartialEq, Clone)]
pub enum SimpleToken {
    Number(u32),
    Name(String),
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Eof,
    LeftParenthesis,
    RightParenthesis,
    LeftBrace,
    RightBrace,
    Equal,
    SemiColon,
    Not,
    And,
    Or,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    DoubleEqual,
    NotEqual,
}

impl SimpleToken {
    pub fn name(name: &str) -> Self {
        SimpleToken::Name(name.to_string())
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, SimpleToken::Name(name) if name == keyword)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            SimpleToken::Less
                | SimpleToken::LessEqual
                | SimpleToken::Greater
                | SimpleToken::GreaterEqual
                | SimpleToken::DoubleEqual
                | SimpleToken::NotEqual
        )
    }
}

impl Display for SimpleToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SimpleToken::Number(n) => write!(f, "{}", n),
            SimpleToken::Name(name) => write!(f, "{}", name),
            SimpleToken::Plus => write!(f, "+"),
            SimpleToken::Minus => write!(f, "-"),
            SimpleToken::Multiply => write!(f, "*"),
            SimpleToken::Divide => write!(f, "/"),
            SimpleToken::Modulo => write!(f, "%"),
            SimpleToken::Eof => write!(f, "<eof>"),
            SimpleToken::LeftParenthesis => write!(f, "("),
            SimpleToken::RightParenthesis => write!(f, ")"),
            SimpleToken::LeftBrace => write!(f, "{{"),
            SimpleToken::RightBrace => write!(f, "}}"),
            SimpleToken::Equal => write!(f, "="),
            SimpleToken::SemiColon => write!(f, ";"),
            SimpleToken::Not => write!(f, "!"),
            SimpleToken::And => write!(f, "&&"),
            SimpleToken::Or => write!(f, "||"),
            SimpleToken::Less => write!(f, "<"),
            SimpleToken::LessEqual => write!(f, "<="),
            SimpleToken::Greater => write!(f, ">"),
            SimpleToken::GreaterEqual => write!(f, ">="),
            SimpleToken::DoubleEqual => write!(f, "=="),
            SimpleToken::NotEqual => write!(f, "!="),
        }
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum SimpleLexerError {
    #[error("Unexpected character: {0}")]
    UnexpectedCharacter(char),
    #[error("Number too large: {0}")]
    NumberTooLarge(String),
    #[error("Unexpected symbol in SIMPLE source: {0}")]
    UnexpectedSymbol(Token),
}

impl From<LexerError> for SimpleLexerError {
    fn from(err: LexerError) -> Self {
        match err {
            LexerError::UnexpectedCharacter(ch) => SimpleLexerError::UnexpectedCharacter(ch),
            LexerError::NumberTooLarge(digits) => SimpleLexerError::NumberTooLarge(digits),
        }
    }
}

impl Lexer<SimpleToken, SimpleLexerError> for SimpleLexer {
    fn tokenize(&self, input: &str) -> Result<Vec<SimpleToken>, SimpleLexerError> {
        self.base_lexer
            .tokenize(input)?
            .into_iter()
            .map(map_token)
            .collect()
    }
}

fn map_token(token: Token) -> Result<SimpleToken, SimpleLexerError> {
    let result = match token {
        Token::Number(n) => SimpleToken::Number(n),
        Token::Word(word) => SimpleToken::Name(word),
        Token::Plus => SimpleToken::Plus,
        Token::Minus => SimpleToken::Minus,
        Token::Multiply => SimpleToken::Multiply,
        Token::Divide => SimpleToken::Divide,
        Token::Modulo => SimpleToken::Modulo,
        Token::Eof => SimpleToken::Eof,
        Token::LeftParenthesis => SimpleToken::LeftParenthesis,
        Token::RightParenthesis => SimpleToken::RightParenthesis,
        Token::LeftBrace => SimpleToken::LeftBrace,
        Token::RightBrace => SimpleToken::RightBrace,
        Token::Equal => SimpleToken::Equal,
        Token::SemiColon => SimpleToken::SemiColon,
        Token::Not => SimpleToken::Not,
        Token::And => SimpleToken::And,
        Token::Or => SimpleToken::Or,
        Token::Less => SimpleToken::Less,
        Token::LessEqual => SimpleToken::LessEqual,
        Token::Greater => SimpleToken::Greater,
        Token::GreaterEqual => SimpleToken::GreaterEqual,
        Token::DoubleEqual => SimpleToken::DoubleEqual,
        Token::NotEqual => SimpleToken::NotEqual,
        Token::Comma | Token::Underscore | Token::Quote | Token::Dot | Token::Hash => {
            return Err(SimpleLexerError::UnexpectedSymbol(token))
        }
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::procedure_main("procedure main { }", &[
        SimpleToken::name("procedure"),
        SimpleToken::name("main"),
        SimpleToken::LeftBrace,
        SimpleToken::RightBrace,
        SimpleToken::Eof,
    ])]
    #[case::while_condition("while (x != 0) { }", &[
        SimpleToken::name("while"),
        SimpleToken::LeftParenthesis,
        SimpleToken::name("x"),
        SimpleToken::NotEqual,
        SimpleToken::Number(0),
        SimpleToken::RightParenthesis,
        SimpleToken::LeftBrace,
        SimpleToken::RightBrace,
        SimpleToken::Eof,
    ])]
    #[case::keyword_as_variable("read = read + 1;", &[
        SimpleToken::name("read"),
        SimpleToken::Equal,
        SimpleToken::name("read"),
        SimpleToken::Plus,
        SimpleToken::Number(1),
        SimpleToken::SemiColon,
        SimpleToken::Eof,
    ])]
    #[case::simple_expression_with_parenthesis("1 + (2 * 3)", &[
        SimpleToken::Number(1),
        SimpleToken::Plus,
        SimpleToken::LeftParenthesis,
        SimpleToken::Number(2),
        SimpleToken::Multiply,
        SimpleToken::Number(3),
        SimpleToken::RightParenthesis,
        SimpleToken::Eof,
    ])]
    fn test_simple_lexer(#[case] input: &'static str, #[case] output: &[SimpleToken]) {
        let lexer = SimpleLexer::default();
        let tokens = lexer.tokenize(input).unwrap();

        assert_eq!(tokens, output);
    }

    #[rstest]
    #[case::underscore("x = _;", SimpleLexerError::UnexpectedSymbol(Token::Underscore))]
    #[case::comma("x = a, b;", SimpleLexerError::UnexpectedSymbol(Token::Comma))]
    #[case::bad_character("x = $;", SimpleLexerError::UnexpectedCharacter('$'))]
    fn test_simple_lexer_rejects(#[case] input: &'static str, #[case] expected: SimpleLexerError) {
        let lexer = SimpleLexer::default();

        assert_eq!(lexer.tokenize(input), Err(expected));
    }
}
