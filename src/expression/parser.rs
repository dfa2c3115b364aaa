use crate::expression::ast::{BinaryOp, Expr, Lit, UnaryOp};
use crate::expression::error::ExprError;
use crate::expression::lexer::{Span, Token, TokenKind, lex};

pub(crate) fn parse_expr(src: &str) -> Result<Expr, ExprError> {
    let tokens = lex(src.trim())?;
    let mut p = Parser { tokens, pos: 0 };
    let expr = p.parse_cond()?;
    p.expect(TokenKind::Eof)?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Binding power of binary operators, loosest first.
fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    let v = match kind {
        TokenKind::OrOr => (BinaryOp::Or, 1),
        TokenKind::AndAnd => (BinaryOp::And, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::Ne => (BinaryOp::Ne, 3),
        TokenKind::Lt => (BinaryOp::Lt, 4),
        TokenKind::Le => (BinaryOp::Le, 4),
        TokenKind::Gt => (BinaryOp::Gt, 4),
        TokenKind::Ge => (BinaryOp::Ge, 4),
        TokenKind::Plus => (BinaryOp::Add, 5),
        TokenKind::Minus => (BinaryOp::Sub, 5),
        TokenKind::Star => (BinaryOp::Mul, 6),
        TokenKind::Slash => (BinaryOp::Div, 6),
        TokenKind::Percent => (BinaryOp::Mod, 6),
        _ => return None,
    };
    Some(v)
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ExprError> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ExprError::new(
                self.span().start,
                format!("expected {kind:?}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn parse_cond(&mut self) -> Result<Expr, ExprError> {
        let cond = self.parse_binary(1)?;
        if !self.consume(TokenKind::Question) {
            return Ok(cond);
        }
        let then = self.parse_cond()?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.parse_cond()?;
        Ok(Expr::Cond {
            cond: Box::new(cond),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_binary(&mut self, min_power: u8) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        while let Some((op, power)) = binary_op(&self.peek().kind) {
            if power < min_power {
                break;
            }
            self.bump();
            let right = self.parse_binary(power + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = if self.consume(TokenKind::Minus) {
            UnaryOp::Neg
        } else if self.consume(TokenKind::Bang) {
            UnaryOp::Not
        } else {
            return self.parse_postfix();
        };
        let expr = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_primary()?;

        loop {
            if self.consume(TokenKind::Dot) {
                let t = self.bump();
                let name = match t.kind {
                    TokenKind::Ident(s) => s,
                    other => {
                        return Err(ExprError::new(
                            t.span.start,
                            format!("expected ident after '.', found {other:?}"),
                        ));
                    }
                };
                match &mut e {
                    Expr::Path(p) => p.push(name),
                    _ => {
                        return Err(ExprError::new(
                            t.span.start,
                            "member access base must be an identifier path",
                        ));
                    }
                }
                continue;
            }

            if self.peek().kind == TokenKind::LParen {
                let at = self.span().start;
                self.bump();
                let args = self.parse_args()?;
                let func = match e {
                    Expr::Path(mut p) if p.len() == 1 => p.remove(0),
                    _ => {
                        return Err(ExprError::new(at, "call target must be an identifier"));
                    }
                };
                e = Expr::Call { func, args };
                continue;
            }

            return Ok(e);
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.consume(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_cond()?);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let t = self.bump();
        match t.kind {
            TokenKind::Number(v) => Ok(Expr::Lit(Lit::F64(v))),
            TokenKind::True => Ok(Expr::Lit(Lit::Bool(true))),
            TokenKind::False => Ok(Expr::Lit(Lit::Bool(false))),
            TokenKind::Ident(s) => Ok(Expr::Path(vec![s])),
            TokenKind::LParen => {
                let e = self.parse_cond()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            other => Err(ExprError::new(
                t.span.start,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/parser.rs"]
mod tests;
