use itertools::{peek_nth, Itertools, PeekNth};
use lexing::lexer::basic_lexer::{BasicLexer, LexerError, Token};
use lexing::lexer::Lexer;
use std::fmt::{Display, Formatter};
use thiserror::Error;

type Tokens = PeekNth<std::vec::IntoIter<Token>>;

#[derive(Default)]
pub struct PqlLexer {
    base_lexer: BasicLexer,
}

/// Keywords stay words and are recognised by the parser from context, since
/// a synonym may be called `pattern` or `with`. Relationship names followed
/// by `*`, `stmt#` and `prog_line` are fused into single words.
#[derive(Debug, PartialEq, Clone)]
pub enum PqlToken {
    Number(u32),
    Word(String),
    Quoted(String),
    SuchThat,
    Comma,
    SemiColon,
    Dot,
    Equal,
    Underscore,
    Less,
    Greater,
    LeftParenthesis,
    RightParenthesis,
    Eof,
}

impl PqlToken {
    pub fn word(word: &str) -> Self {
        PqlToken::Word(word.to_string())
    }

    pub fn is_word(&self, word: &str) -> bool {
        matches!(self, PqlToken::Word(w) if w == word)
    }
}

impl Display for PqlToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PqlToken::Number(number) => write!(f, "{}", number),
            PqlToken::Word(word) => write!(f, "{}", word),
            PqlToken::Quoted(text) => write!(f, "\"{}\"", text),
            PqlToken::SuchThat => write!(f, "such that"),
            PqlToken::Comma => write!(f, ","),
            PqlToken::SemiColon => write!(f, ";"),
            PqlToken::Dot => write!(f, "."),
            PqlToken::Equal => write!(f, "="),
            PqlToken::Underscore => write!(f, "_"),
            PqlToken::Less => write!(f, "<"),
            PqlToken::Greater => write!(f, ">"),
            PqlToken::LeftParenthesis => write!(f, "("),
            PqlToken::RightParenthesis => write!(f, ")"),
            PqlToken::Eof => write!(f, "<eof>"),
        }
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum PqlLexerError {
    #[error("Unexpected character: {0}")]
    UnexpectedCharacter(char),
    #[error("Number too large: {0}")]
    NumberTooLarge(String),
    #[error("Unexpected symbol: {0}")]
    UnexpectedToken(Token),
    #[error("Unterminated quoted text")]
    UnterminatedQuote,
}

impl From<LexerError> for PqlLexerError {
    fn from(err: LexerError) -> Self {
        match err {
            LexerError::UnexpectedCharacter(ch) => PqlLexerError::UnexpectedCharacter(ch),
            LexerError::NumberTooLarge(number) => PqlLexerError::NumberTooLarge(number),
        }
    }
}

impl Lexer<PqlToken, PqlLexerError> for PqlLexer {
    fn tokenize(&self, input: &str) -> Result<Vec<PqlToken>, PqlLexerError> {
        let tokens = self.base_lexer.tokenize(input)?;

        let mut iter = peek_nth(tokens);
        let mut result = Vec::new();

        while let Some(token) = iter.next() {
            match token {
                Token::Word(word) => result.push(word_token(word, &mut iter)),
                Token::Quote => result.push(quoted(&mut iter)?),
                _ => result.push(map_token(token)?),
            }
        }

        Ok(result)
    }
}

fn word_token(word: String, iter: &mut Tokens) -> PqlToken {
    let next = iter.peek().cloned();
    let after = iter.peek_nth(1).cloned();
    let fused = match (word.as_str(), next.as_ref(), after.as_ref()) {
        ("such", Some(Token::Word(next)), _) if next == "that" => Some((1, PqlToken::SuchThat)),
        ("stmt", Some(Token::Hash), _) => Some((1, PqlToken::word("stmt#"))),
        ("prog", Some(Token::Underscore), Some(Token::Word(next))) if next == "line" => {
            Some((2, PqlToken::word("prog_line")))
        }
        (_, Some(Token::Multiply), _) => Some((1, PqlToken::Word(format!("{}*", word)))),
        _ => None,
    };

    match fused {
        Some((consumed, token)) => {
            for _ in 0..consumed {
                iter.next();
            }
            token
        }
        None => PqlToken::Word(word),
    }
}

/// Text between quotes, rendered token by token so the SIMPLE expression
/// parser can read it back.
fn quoted(iter: &mut Tokens) -> Result<PqlToken, PqlLexerError> {
    let mut parts = Vec::new();
    loop {
        match iter.next() {
            Some(Token::Quote) => break,
            Some(Token::Eof) | None => return Err(PqlLexerError::UnterminatedQuote),
            Some(token) => parts.push(token),
        }
    }

    Ok(PqlToken::Quoted(parts.iter().join(" ")))
}

fn map_token(token: Token) -> Result<PqlToken, PqlLexerError> {
    let result = match token {
        Token::Number(number) => PqlToken::Number(number),
        Token::Eof => PqlToken::Eof,
        Token::LeftParenthesis => PqlToken::LeftParenthesis,
        Token::RightParenthesis => PqlToken::RightParenthesis,
        Token::Comma => PqlToken::Comma,
        Token::Underscore => PqlToken::Underscore,
        Token::SemiColon => PqlToken::SemiColon,
        Token::Dot => PqlToken::Dot,
        Token::Equal => PqlToken::Equal,
        Token::Less => PqlToken::Less,
        Token::Greater => PqlToken::Greater,
        Token::Word(word) => PqlToken::Word(word),
        _ => return Err(PqlLexerError::UnexpectedToken(token)),
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn word(word: &str) -> PqlToken {
        PqlToken::word(word)
    }

    #[rstest]
    #[case::follows_underscore_reference("Select s such that Follows(_, s)", &[
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
    ])]
    #[case::follows_transitive_underscore_reference("Select s such that Follows*(_, s)", &[
        word("Select"),
        word("s"),
        PqlToken::SuchThat,
        word("Follows*"),
        PqlToken::LeftParenthesis,
        PqlToken::Underscore,
        PqlToken::Comma,
        word("s"),
        PqlToken::RightParenthesis,
        PqlToken::Eof,
    ])]
    #[case::declarations("prog_line n; stmt s;", &[
        word("prog_line"),
        word("n"),
        PqlToken::SemiColon,
        word("stmt"),
        word("s"),
        PqlToken::SemiColon,
        PqlToken::Eof,
    ])]
    #[case::tuple_with_attribute("Select <s.stmt#, v>", &[
        word("Select"),
        PqlToken::Less,
        word("s"),
        PqlToken::Dot,
        word("stmt#"),
        PqlToken::Comma,
        word("v"),
        PqlToken::Greater,
        PqlToken::Eof,
    ])]
    #[case::sub_expression_pattern("pattern a(_, _\"cenX + x\"_)", &[
        word("pattern"),
        word("a"),
        PqlToken::LeftParenthesis,
        PqlToken::Underscore,
        PqlToken::Comma,
        PqlToken::Underscore,
        PqlToken::Quoted("cenX + x".to_string()),
        PqlToken::Underscore,
        PqlToken::RightParenthesis,
        PqlToken::Eof,
    ])]
    #[case::with_clause("with p.procName = \"b\" and 10 = n", &[
        word("with"),
        word("p"),
        PqlToken::Dot,
        word("procName"),
        PqlToken::Equal,
        PqlToken::Quoted("b".to_string()),
        word("and"),
        PqlToken::Number(10),
        PqlToken::Equal,
        word("n"),
        PqlToken::Eof,
    ])]
    fn test_tokenize(#[case] input: &str, #[case] expected: &[PqlToken]) {
        let pql_lexer = PqlLexer::default();
        let tokens = pql_lexer.tokenize(input).unwrap();

        assert_eq!(tokens, expected);
    }

    #[rstest]
    #[case::unterminated_quote("pattern a(\"x, _)", PqlLexerError::UnterminatedQuote)]
    #[case::stray_hash("Select #", PqlLexerError::UnexpectedToken(Token::Hash))]
    #[case::unknown_character("Select s?", PqlLexerError::UnexpectedCharacter('?'))]
    fn test_tokenize_errors(#[case] input: &str, #[case] expected: PqlLexerError) {
        let pql_lexer = PqlLexer::default();

        assert_eq!(pql_lexer.tokenize(input), Err(expected));
    }
}
