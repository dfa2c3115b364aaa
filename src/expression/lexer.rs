use crate::expression::error::ExprError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) start: usize,
    pub(crate) end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    True,
    False,

    LParen,
    RParen,
    Comma,
    Dot,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    Bang,

    EqEq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    AndAnd,
    OrOr,

    Question,
    Colon,

    Eof,
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn eat_while(&mut self, f: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&f) {
            self.pos += 1;
        }
    }

    fn number(&mut self, start: usize) -> Result<TokenKind, ExprError> {
        self.eat_while(|b| b.is_ascii_digit());
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_digit());
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let e_pos = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            let digits = self.pos;
            self.eat_while(|b| b.is_ascii_digit());
            if digits == self.pos {
                return Err(ExprError::new(
                    e_pos,
                    "invalid number exponent (expected digits)",
                ));
            }
        }
        self.src[start..self.pos]
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ExprError::new(start, "invalid number"))
    }
}

pub(crate) fn lex(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut out = Vec::new();
    let mut cur = Cursor::new(input);

    while let Some(b) = cur.peek() {
        if b.is_ascii_whitespace() {
            cur.pos += 1;
            continue;
        }
        let start = cur.pos;

        let kind = if b.is_ascii_digit()
            || (b == b'.' && cur.peek_at(1).is_some_and(|n| n.is_ascii_digit()))
        {
            cur.number(start)?
        } else if b.is_ascii_alphabetic() || b == b'_' {
            cur.eat_while(|c| c.is_ascii_alphanumeric() || c == b'_');
            match &input[start..cur.pos] {
                "true" => TokenKind::True,
                "false" => TokenKind::False,
                s => TokenKind::Ident(s.to_owned()),
            }
        } else {
            let two = match (b, cur.peek_at(1)) {
                (b'&', Some(b'&')) => Some(TokenKind::AndAnd),
                (b'|', Some(b'|')) => Some(TokenKind::OrOr),
                (b'=', Some(b'=')) => Some(TokenKind::EqEq),
                (b'!', Some(b'=')) => Some(TokenKind::Ne),
                (b'<', Some(b'=')) => Some(TokenKind::Le),
                (b'>', Some(b'=')) => Some(TokenKind::Ge),
                _ => None,
            };
            if let Some(kind) = two {
                cur.pos += 2;
                out.push(Token {
                    kind,
                    span: Span {
                        start,
                        end: cur.pos,
                    },
                });
                continue;
            }
            cur.pos += 1;
            match b {
                b'(' => TokenKind::LParen,
                b')' => TokenKind::RParen,
                b',' => TokenKind::Comma,
                b'.' => TokenKind::Dot,
                b'+' => TokenKind::Plus,
                b'-' => TokenKind::Minus,
                b'*' => TokenKind::Star,
                b'/' => TokenKind::Slash,
                b'%' => TokenKind::Percent,
                b'!' => TokenKind::Bang,
                b'<' => TokenKind::Lt,
                b'>' => TokenKind::Gt,
                b'?' => TokenKind::Question,
                b':' => TokenKind::Colon,
                _ => {
                    let c = input[start..].chars().next().unwrap_or('?');
                    return Err(ExprError::new(start, format!("unexpected character '{c}'")));
                }
            }
        };

        out.push(Token {
            kind,
            span: Span {
                start,
                end: cur.pos,
            },
        });
    }

    out.push(Token {
        kind: TokenKind::Eof,
        span: Span {
            start: input.len(),
            end: input.len(),
        },
    });

    Ok(out)
}
