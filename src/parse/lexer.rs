use std::str::FromStr;

use rust_decimal::Decimal;
use winnow::combinator::{alt, delimited, opt};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

use crate::CompareOp;

use super::error::LexError;
use super::token::{Token, TokenKind};

/// Split condition text into tokens.
///
/// Whitespace between tokens is skipped. The returned sequence always ends
/// with a [`TokenKind::Eof`] marker.
///
/// # Errors
///
/// Returns [`LexError`] on the first character that cannot start a token, an
/// unterminated string literal, or a malformed number.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let mut input = text;
    let mut tokens = Vec::new();

    loop {
        input = input.trim_start();
        let offset = text.len() - input.len();
        let Some(first) = input.chars().next() else {
            tokens.push(Token::new(TokenKind::Eof, offset));
            return Ok(tokens);
        };
        let kind = next_token(&mut input, first, offset)?;
        tokens.push(Token::new(kind, offset));
    }
}

fn next_token(input: &mut &str, first: char, offset: usize) -> Result<TokenKind, LexError> {
    if first == '"' {
        return string_literal
            .parse_next(input)
            .map(TokenKind::Str)
            .map_err(|_| LexError::UnterminatedString { offset });
    }

    if starts_number(input) {
        let literal = number_literal
            .parse_next(input)
            .map_err(|_| LexError::MalformedNumber {
                literal: first.to_string(),
                offset,
            })?;
        return parse_number(literal)
            .map(TokenKind::Number)
            .ok_or_else(|| LexError::MalformedNumber {
                literal: literal.to_owned(),
                offset,
            });
    }

    if first.is_alphabetic() || first == '_' {
        return ident
            .parse_next(input)
            .map(keyword_or_ident)
            .map_err(|_| LexError::UnexpectedChar { ch: first, offset });
    }

    symbol
        .parse_next(input)
        .map_err(|_| LexError::UnexpectedChar { ch: first, offset })
}

// -- Literals ---------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    delimited('"', take_till(0.., '"'), '"')
        .map(|s: &str| s.to_owned())
        .parse_next(input)
}

fn starts_number(input: &str) -> bool {
    let digits = input.strip_prefix('-').unwrap_or(input);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

/// Greedy: takes every character that could belong to a numeric literal so
/// that `12abc` or `1.2.3` is reported whole instead of splitting silently.
fn number_literal<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        opt('-'),
        take_while(1.., |c: char| c.is_ascii_digit()),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '.' || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn parse_number(literal: &str) -> Option<Decimal> {
    let unsigned = literal.strip_prefix('-').unwrap_or(literal);
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let well_formed = match unsigned.split_once('.') {
        Some((int, frac)) => all_digits(int) && all_digits(frac),
        None => all_digits(unsigned),
    };
    if !well_formed {
        return None;
    }
    Decimal::from_str(literal).ok()
}

// -- Identifiers & keywords -------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

fn keyword_or_ident(word: &str) -> TokenKind {
    if word.eq_ignore_ascii_case("and") {
        TokenKind::And
    } else if word.eq_ignore_ascii_case("or") {
        TokenKind::Or
    } else if word.eq_ignore_ascii_case("not") {
        TokenKind::Not
    } else if word.eq_ignore_ascii_case("true") {
        TokenKind::True
    } else if word.eq_ignore_ascii_case("false") {
        TokenKind::False
    } else {
        TokenKind::Ident(word.to_owned())
    }
}

// -- Operators & punctuation ------------------------------------------------

fn symbol(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        alt(("!=", "≠")).value(TokenKind::Compare(CompareOp::Neq)),
        alt((">=", "≥")).value(TokenKind::Compare(CompareOp::Gte)),
        '>'.value(TokenKind::Compare(CompareOp::Gt)),
        alt(("<=", "≤")).value(TokenKind::Compare(CompareOp::Lte)),
        '<'.value(TokenKind::Compare(CompareOp::Lt)),
        alt(("==", "=")).value(TokenKind::Compare(CompareOp::Eq)),
        '!'.value(TokenKind::Not),
        '('.value(TokenKind::LParen),
        ')'.value(TokenKind::RParen),
        '.'.value(TokenKind::Dot),
        ','.value(TokenKind::Comma),
    ))
    .parse_next(input)
}
