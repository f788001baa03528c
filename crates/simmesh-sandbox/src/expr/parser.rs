use super::ast::{BinaryOp, CompareOp, Expr, UnaryOp};
use super::lexer::{tokenize, Token};
use crate::error::{Result, SandboxError};

/// Parses `source` into an [`Expr`]. Grammar, lowest to highest precedence:
/// ternary, chained comparison, additive, multiplicative, unary, power, atom.
pub fn parse_expr(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_ternary()?;
    if parser.pos != parser.tokens.len() {
        return Err(SandboxError::Syntax(format!(
            "unexpected trailing tokens starting at {:?}",
            parser.tokens[parser.pos]
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.peek() == Some(token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(SandboxError::Syntax(format!("expected {token:?}, got {:?}", self.peek())))
        }
    }

    fn parse_ternary(&mut self) -> Result<Expr> {
        let cond = self.parse_comparison()?;
        if self.peek() == Some(&Token::Question) {
            self.advance();
            let then_branch = self.parse_ternary()?;
            self.expect(&Token::Colon)?;
            let else_branch = self.parse_ternary()?;
            Ok(Expr::Ternary(Box::new(cond), Box::new(then_branch), Box::new(else_branch)))
        } else {
            Ok(cond)
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let first = self.parse_additive()?;
        let mut chain = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CompareOp::Eq,
                Some(Token::NotEq) => CompareOp::Ne,
                Some(Token::Lt) => CompareOp::Lt,
                Some(Token::LtEq) => CompareOp::Le,
                Some(Token::Gt) => CompareOp::Gt,
                Some(Token::GtEq) => CompareOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            chain.push((op, rhs));
        }
        if chain.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), chain))
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::SlashSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Pos, Box::new(self.parse_unary()?)))
            }
            Some(Token::Minus) => {
                self.advance();
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.parse_unary()?)))
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_atom()?;
        if self.peek() == Some(&Token::StarStar) {
            self.advance();
            let exponent = self.parse_unary()?;
            Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)))
        } else {
            Ok(base)
        }
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.advance();
                    let args = self.parse_args()?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Name(name))
                }
            }
            Some(Token::LParen) => {
                let inner = self.parse_ternary()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            other => Err(SandboxError::Syntax(format!("unexpected token {other:?}"))),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_ternary()?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(Token::RParen) => {
                    self.advance();
                    break;
                }
                other => return Err(SandboxError::Syntax(format!("expected ',' or ')', got {other:?}"))),
            }
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_binary() {
        let expr = parse_expr("x + y * 2").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Name("x".into())),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Name("y".into())),
                    Box::new(Expr::Number(2.0))
                ))
            )
        );
    }

    #[test]
    fn power_is_right_associative_and_binds_tighter_than_unary() {
        let expr = parse_expr("-x**2").unwrap();
        assert_eq!(
            expr,
            Expr::Unary(
                UnaryOp::Neg,
                Box::new(Expr::Binary(
                    BinaryOp::Pow,
                    Box::new(Expr::Name("x".into())),
                    Box::new(Expr::Number(2.0))
                ))
            )
        );
    }

    #[test]
    fn parses_call_and_ternary() {
        let expr = parse_expr("x > 0 ? sqrt(x) : 0").unwrap();
        match expr {
            Expr::Ternary(cond, then_branch, else_branch) => {
                assert!(matches!(*cond, Expr::Compare(_, _)));
                assert!(matches!(*then_branch, Expr::Call(_, _)));
                assert!(matches!(*else_branch, Expr::Number(_)));
            }
            _ => panic!("expected ternary"),
        }
    }

    #[test]
    fn rejects_unknown_character() {
        assert!(parse_expr("x @ y").is_err());
    }

    #[test]
    fn rejects_trailing_tokens() {
        assert!(parse_expr("x + y )").is_err());
    }
}
