use thiserror::Error;

use crate::CompareOp;

/// Errors produced while splitting condition text into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("lex error: unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("lex error: unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("lex error: malformed number '{literal}' at offset {offset}")]
    MalformedNumber { literal: String, offset: usize },
}

/// Errors produced while building an expression tree from tokens.
///
/// Token errors name both what the grammar expected and what it found, so a
/// rule author can fix the condition without reading the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parse error: expected {expected}, found {found} at offset {offset}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("parse error: expected identifier after '.', found {found} at offset {offset}")]
    ExpectedIdentifier { found: String, offset: usize },

    #[error(
        "parse error: comparisons do not chain, found a second '{op}' at offset {offset}; \
         combine them with 'and'"
    )]
    ChainedComparison { op: CompareOp, offset: usize },

    #[error("parse error: expression nesting exceeds the limit of {limit}")]
    TooDeep { limit: usize },
}
