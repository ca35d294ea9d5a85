use crate::{Expr, VarPath};

use super::error::ParseError;
use super::token::{Token, TokenKind};

static EOF: Token = Token {
    kind: TokenKind::Eof,
    offset: 0,
};

/// A parsed subtree and its depth.
type Node = (Expr, usize);

/// Build an expression tree from a token sequence.
///
/// Grammar, lowest to highest precedence:
///
/// ```text
/// expr       := or_expr
/// or_expr    := and_expr ("or" and_expr)*
/// and_expr   := not_expr ("and" not_expr)*
/// not_expr   := "not" not_expr | comparison
/// comparison := primary (COMPARATOR primary)?
/// primary    := "true" | "false" | NUMBER | STRING
///             | IDENT ("." IDENT)* ( "(" (expr ("," expr)*)? ")" )?
///             | "(" expr ")"
/// ```
///
/// Comparisons do not chain: `a < b < c` is rejected with
/// [`ParseError::ChainedComparison`] rather than read as `(a < b) and (b < c)`
/// or `(a < b) < c`. Trees deeper than `max_depth` are rejected with
/// [`ParseError::TooDeep`].
///
/// # Errors
///
/// Returns [`ParseError`] describing the first token that does not fit the
/// grammar.
pub fn parse(tokens: &[Token], max_depth: usize) -> Result<Expr, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        nesting: 0,
        max_depth,
    };
    let (expr, _) = parser.or_expr()?;
    parser.expect(&TokenKind::Eof, "end of input")?;
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    nesting: usize,
    max_depth: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> &'t Token {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .unwrap_or(&EOF)
    }

    fn advance(&mut self) -> &'t Token {
        let token = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(unexpected(expected, self.peek()))
        }
    }

    fn limit(&self, depth: usize) -> Result<usize, ParseError> {
        if depth > self.max_depth {
            Err(ParseError::TooDeep {
                limit: self.max_depth,
            })
        } else {
            Ok(depth)
        }
    }

    /// Bounds parser recursion (parentheses, `not`, call arguments) by the
    /// same limit as tree depth.
    fn descend(&mut self) -> Result<(), ParseError> {
        self.nesting += 1;
        self.limit(self.nesting).map(|_| ())
    }

    fn ascend(&mut self) {
        self.nesting -= 1;
    }

    fn or_expr(&mut self) -> Result<Node, ParseError> {
        let (mut left, mut depth) = self.and_expr()?;
        while self.eat(&TokenKind::Or) {
            let (right, right_depth) = self.and_expr()?;
            depth = self.limit(1 + depth.max(right_depth))?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok((left, depth))
    }

    fn and_expr(&mut self) -> Result<Node, ParseError> {
        let (mut left, mut depth) = self.not_expr()?;
        while self.eat(&TokenKind::And) {
            let (right, right_depth) = self.not_expr()?;
            depth = self.limit(1 + depth.max(right_depth))?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok((left, depth))
    }

    fn not_expr(&mut self) -> Result<Node, ParseError> {
        if !self.eat(&TokenKind::Not) {
            return self.comparison();
        }
        self.descend()?;
        let (inner, depth) = self.not_expr()?;
        self.ascend();
        Ok((Expr::Not(Box::new(inner)), self.limit(depth + 1)?))
    }

    fn comparison(&mut self) -> Result<Node, ParseError> {
        let (left, left_depth) = self.primary()?;
        let TokenKind::Compare(op) = self.peek().kind else {
            return Ok((left, left_depth));
        };
        self.advance();

        let (right, right_depth) = self.primary()?;
        let next = self.peek();
        if let TokenKind::Compare(second) = next.kind {
            return Err(ParseError::ChainedComparison {
                op: second,
                offset: next.offset,
            });
        }

        let depth = self.limit(1 + left_depth.max(right_depth))?;
        Ok((
            Expr::Compare {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            depth,
        ))
    }

    fn primary(&mut self) -> Result<Node, ParseError> {
        let token = self.advance();
        match &token.kind {
            TokenKind::True => Ok((Expr::Bool(true), 1)),
            TokenKind::False => Ok((Expr::Bool(false), 1)),
            TokenKind::Number(n) => Ok((Expr::Number(*n), 1)),
            TokenKind::Str(s) => Ok((Expr::String(s.clone()), 1)),
            TokenKind::Ident(first) => self.path_or_call(first),
            TokenKind::LParen => {
                self.descend()?;
                let node = self.or_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                self.ascend();
                Ok(node)
            }
            _ => Err(unexpected("expression", token)),
        }
    }

    fn path_or_call(&mut self, first: &str) -> Result<Node, ParseError> {
        let mut segments = vec![first];
        while self.eat(&TokenKind::Dot) {
            let token = self.advance();
            match &token.kind {
                TokenKind::Ident(segment) => segments.push(segment),
                other => {
                    return Err(ParseError::ExpectedIdentifier {
                        found: other.to_string(),
                        offset: token.offset,
                    });
                }
            }
        }

        if !self.eat(&TokenKind::LParen) {
            return Ok((Expr::Variable(VarPath::from_segments(&segments)), 1));
        }

        self.descend()?;
        let mut args = Vec::new();
        let mut depth = 1;
        if !self.eat(&TokenKind::RParen) {
            loop {
                let (arg, arg_depth) = self.or_expr()?;
                depth = self.limit(depth.max(arg_depth + 1))?;
                args.push(arg);
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(&TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }
        self.ascend();

        Ok((
            Expr::Call {
                name: segments.join("."),
                args,
            },
            depth,
        ))
    }
}

fn unexpected(expected: &str, found: &Token) -> ParseError {
    ParseError::UnexpectedToken {
        expected: expected.to_owned(),
        found: found.kind.to_string(),
        offset: found.offset,
    }
}
