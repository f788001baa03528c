use crate::error::{Result, SandboxError};

/// A lexical token in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A numeric literal.
    Number(f64),
    /// An identifier (name or function callee).
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    StarStar,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
}

/// Tokenizes `source`, rejecting characters outside the allowed grammar.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) {
            let start = i;
            let mut seen_dot = c == '.';
            i += 1;
            while i < chars.len() {
                let c = chars[i];
                if c.is_ascii_digit() {
                    i += 1;
                } else if c == '.' && !seen_dot {
                    seen_dot = true;
                    i += 1;
                } else if (c == 'e' || c == 'E')
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit() || *n == '+' || *n == '-')
                {
                    i += 2;
                } else {
                    break;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value: f64 = text
                .parse()
                .map_err(|_| SandboxError::Syntax(format!("invalid number literal '{text}'")))?;
            tokens.push(Token::Number(value));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(Token::Ident(text));
            continue;
        }

        macro_rules! two_char {
            ($next:expr, $two:expr, $one:expr) => {{
                if chars.get(i + 1) == Some(&$next) {
                    i += 2;
                    tokens.push($two);
                } else {
                    i += 1;
                    tokens.push($one);
                }
            }};
        }

        match c {
            '+' => {
                i += 1;
                tokens.push(Token::Plus);
            }
            '-' => {
                i += 1;
                tokens.push(Token::Minus);
            }
            '*' => two_char!('*', Token::StarStar, Token::Star),
            '/' => two_char!('/', Token::SlashSlash, Token::Slash),
            '%' => {
                i += 1;
                tokens.push(Token::Percent);
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    tokens.push(Token::Eq);
                } else {
                    return Err(SandboxError::Syntax("unexpected '='; did you mean '=='?".into()));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    tokens.push(Token::NotEq);
                } else {
                    return Err(SandboxError::Syntax("unexpected '!'".into()));
                }
            }
            '<' => two_char!('=', Token::LtEq, Token::Lt),
            '>' => two_char!('=', Token::GtEq, Token::Gt),
            '(' => {
                i += 1;
                tokens.push(Token::LParen);
            }
            ')' => {
                i += 1;
                tokens.push(Token::RParen);
            }
            ',' => {
                i += 1;
                tokens.push(Token::Comma);
            }
            '?' => {
                i += 1;
                tokens.push(Token::Question);
            }
            ':' => {
                i += 1;
                tokens.push(Token::Colon);
            }
            other => return Err(SandboxError::Syntax(format!("unexpected character '{other}'"))),
        }
    }

    Ok(tokens)
}
