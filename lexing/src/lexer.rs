pub trait Lexer<TToken, TError> {
    fn tokenize(&self, input: &str) -> Result<Vec<TToken>, TError>;
}

pub mod basic_lexer {
    use super::Lexer;
    use std::fmt::{Display, Formatter};
    use std::iter::Peekable;
    use std::str::Chars;
    use thiserror::Error;

    #[derive(Default)]
    pub struct BasicLexer;

    #[derive(Debug, PartialEq, Clone)]
    pub enum Token {
        Number(u32),
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
        DoubleEqual,
        NotEqual,
        Not,
        And,
        Or,
        Less,
        LessEqual,
        Greater,
        GreaterEqual,
        SemiColon,
        Comma,
        Underscore,
        Quote,
        Dot,
        Hash,
        Word(String),
    }

    impl Display for Token {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            match self {
                Token::Number(n) => write!(f, "{}", n),
                Token::Word(word) => write!(f, "{}", word),
                Token::Plus => write!(f, "+"),
                Token::Minus => write!(f, "-"),
                Token::Multiply => write!(f, "*"),
                Token::Divide => write!(f, "/"),
                Token::Modulo => write!(f, "%"),
                Token::Eof => write!(f, "<eof>"),
                Token::LeftParenthesis => write!(f, "("),
                Token::RightParenthesis => write!(f, ")"),
                Token::LeftBrace => write!(f, "{{"),
                Token::RightBrace => write!(f, "}}"),
                Token::Equal => write!(f, "="),
                Token::DoubleEqual => write!(f, "=="),
                Token::NotEqual => write!(f, "!="),
                Token::Not => write!(f, "!"),
                Token::And => write!(f, "&&"),
                Token::Or => write!(f, "||"),
                Token::Less => write!(f, "<"),
                Token::LessEqual => write!(f, "<="),
                Token::Greater => write!(f, ">"),
                Token::GreaterEqual => write!(f, ">="),
                Token::SemiColon => write!(f, ";"),
                Token::Comma => write!(f, ","),
                Token::Underscore => write!(f, "_"),
                Token::Quote => write!(f, "\""),
                Token::Dot => write!(f, "."),
                Token::Hash => write!(f, "#"),
            }
        }
    }

    #[derive(Debug, PartialEq, Error)]
    pub enum LexerError {
        #[error("Unexpected character: {0}")]
        UnexpectedCharacter(char),
        #[error("Number too large: {0}")]
        NumberTooLarge(String),
    }

    impl Lexer<Token, LexerError> for BasicLexer {
        fn tokenize(&self, input: &str) -> Result<Vec<Token>, LexerError> {
            let mut iter = input.chars().peekable();
            let mut tokens = Vec::new();

            while let Some(ch) = iter.next() {
                match ch {
                    '+' => tokens.push(Token::Plus),
                    '-' => tokens.push(Token::Minus),
                    '*' => tokens.push(Token::Multiply),
                    '/' => tokens.push(Token::Divide),
                    '%' => tokens.push(Token::Modulo),
                    '(' => tokens.push(Token::LeftParenthesis),
                    ')' => tokens.push(Token::RightParenthesis),
                    '{' => tokens.push(Token::LeftBrace),
                    '}' => tokens.push(Token::RightBrace),
                    ';' => tokens.push(Token::SemiColon),
                    ',' => tokens.push(Token::Comma),
                    '_' => tokens.push(Token::Underscore),
                    '"' => tokens.push(Token::Quote),
                    '.' => tokens.push(Token::Dot),
                    '#' => tokens.push(Token::Hash),
                    '=' => tokens.push(with_equal(&mut iter, Token::Equal, Token::DoubleEqual)),
                    '!' => tokens.push(with_equal(&mut iter, Token::Not, Token::NotEqual)),
                    '<' => tokens.push(with_equal(&mut iter, Token::Less, Token::LessEqual)),
                    '>' => tokens.push(with_equal(&mut iter, Token::Greater, Token::GreaterEqual)),
                    '&' => match iter.next_if_eq(&'&') {
                        Some(_) => tokens.push(Token::And),
                        None => return Err(LexerError::UnexpectedCharacter(ch)),
                    },
                    '|' => match iter.next_if_eq(&'|') {
                        Some(_) => tokens.push(Token::Or),
                        None => return Err(LexerError::UnexpectedCharacter(ch)),
                    },
                    '0'..='9' => {
                        let mut digits = ch.to_string();
                        while let Some(digit) = iter.next_if(|c| c.is_ascii_digit()) {
                            digits.push(digit);
                        }

                        let number = digits
                            .parse::<u32>()
                            .map_err(|_| LexerError::NumberTooLarge(digits.clone()))?;
                        tokens.push(Token::Number(number));
                    }
                    _ => {
                        if ch.is_whitespace() {
                            continue;
                        }

                        if ch.is_ascii_alphabetic() {
                            let mut word = ch.to_string();

                            while let Some(ch) = iter.next_if(|c| c.is_ascii_alphanumeric()) {
                                word.push(ch);
                            }

                            tokens.push(Token::Word(word));

                            continue;
                        }

                        return Err(LexerError::UnexpectedCharacter(ch));
                    }
                }
            }

            tokens.push(Token::Eof);

            Ok(tokens)
        }
    }

    fn with_equal(iter: &mut Peekable<Chars>, single: Token, double: Token) -> Token {
        match iter.next_if_eq(&'=') {
            Some(_) => double,
            None => single,
        }
    }
}
