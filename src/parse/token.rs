use std::fmt;

use rust_decimal::Decimal;

use crate::CompareOp;

/// Lexical categories of the condition DSL.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    And,
    Or,
    Not,
    True,
    False,
    Compare(CompareOp),
    Ident(String),
    Number(Decimal),
    Str(String),
    LParen,
    RParen,
    Dot,
    Comma,
    Eof,
}

/// A token and the byte offset in the condition text where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::And => write!(f, "'and'"),
            TokenKind::Or => write!(f, "'or'"),
            TokenKind::Not => write!(f, "'not'"),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Compare(op) => write!(f, "'{op}'"),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Str(s) => write!(f, "string \"{s}\""),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
