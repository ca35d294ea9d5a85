use std::fmt;
use std::ops::Not;

use rust_decimal::Decimal;

/// Comparison operators supported in rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// A dotted variable path such as `order.total`.
///
/// Stored in its dotted form because a [`Resolver`](crate::Resolver) looks
/// variables up by the full path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarPath(String);

impl VarPath {
    /// Build a path from its identifier segments.
    #[must_use]
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let joined: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
        Self(joined.join("."))
    }

    /// The full dotted path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl fmt::Display for VarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Condition AST produced by the parser.
///
/// Immutable once built; a compiled [`Rule`](crate::Rule) owns its tree and
/// shares it read-only with every concurrent evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(bool),
    Number(Decimal),
    String(String),
    Variable(VarPath),
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

/// Renders the tree back into DSL text that parses to an equal tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Number(n) => write!(f, "{n}"),
            Expr::String(s) => write!(f, "\"{s}\""),
            Expr::Variable(path) => write!(f, "{path}"),
            Expr::Compare { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::And(a, b) => write!(f, "({a} and {b})"),
            Expr::Or(a, b) => write!(f, "({a} or {b})"),
            Expr::Not(inner) => write!(f, "(not {inner})"),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl Expr {
    #[must_use]
    pub fn and(self, other: impl Into<Expr>) -> Expr {
        Expr::And(Box::new(self), Box::new(other.into()))
    }

    #[must_use]
    pub fn or(self, other: impl Into<Expr>) -> Expr {
        Expr::Or(Box::new(self), Box::new(other.into()))
    }

    /// Nesting depth of the tree; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Expr::Bool(_) | Expr::Number(_) | Expr::String(_) | Expr::Variable(_) => 1,
            Expr::Compare { left, right, .. } => 1 + left.depth().max(right.depth()),
            Expr::And(a, b) | Expr::Or(a, b) => 1 + a.depth().max(b.depth()),
            Expr::Not(inner) => 1 + inner.depth(),
            Expr::Call { args, .. } => 1 + args.iter().map(Expr::depth).max().unwrap_or(0),
        }
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Expr::Bool(v)
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::Number(Decimal::from(v))
    }
}

impl From<Decimal> for Expr {
    fn from(v: Decimal) -> Self {
        Expr::Number(v)
    }
}

/// A string literal, not a variable; use [`var()`] for paths.
impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Expr::String(v.to_owned())
    }
}

impl From<VarExpr> for Expr {
    fn from(v: VarExpr) -> Self {
        Expr::Variable(v.path)
    }
}

/// Intermediate builder for variable comparisons.
/// Created by [`var()`]; convert with `Expr::from` to use the variable as a
/// boolean on its own.
#[derive(Debug, Clone)]
pub struct VarExpr {
    path: VarPath,
}

impl VarExpr {
    fn compare(self, op: CompareOp, value: impl Into<Expr>) -> Expr {
        Expr::Compare {
            op,
            left: Box::new(Expr::Variable(self.path)),
            right: Box::new(value.into()),
        }
    }

    #[must_use]
    pub fn eq(self, value: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Eq, value)
    }

    #[must_use]
    pub fn neq(self, value: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Neq, value)
    }

    #[must_use]
    pub fn gt(self, value: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(self, value: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Gte, value)
    }

    #[must_use]
    pub fn lt(self, value: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(self, value: impl Into<Expr>) -> Expr {
        self.compare(CompareOp::Lte, value)
    }
}

impl Not for VarExpr {
    type Output = Expr;

    fn not(self) -> Expr {
        !Expr::from(self)
    }
}

#[must_use]
pub fn var(path: &str) -> VarExpr {
    VarExpr {
        path: VarPath(path.to_owned()),
    }
}

/// A literal expression: `lit(5_i64)`, `lit("gold")`, `lit(true)`.
#[must_use]
pub fn lit(value: impl Into<Expr>) -> Expr {
    value.into()
}

#[must_use]
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call {
        name: name.to_owned(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_gte_builds_compare() {
        let expr = var("order.total").gte(200_i64);
        assert_eq!(
            expr,
            Expr::Compare {
                op: CompareOp::Gte,
                left: Box::new(Expr::Variable(VarPath::from_segments(&["order", "total"]))),
                right: Box::new(Expr::Number(Decimal::from(200))),
            }
        );
    }

    #[test]
    fn path_segments() {
        let path = VarPath::from_segments(&["user", "profile", "tier"]);
        assert_eq!(path.as_str(), "user.profile.tier");
        assert_eq!(path.segments().collect::<Vec<_>>(), ["user", "profile", "tier"]);
    }

    #[test]
    fn and_is_left_associative() {
        let expr = Expr::from(var("a")).and(var("b")).and(var("c"));
        match &expr {
            Expr::And(left, right) => {
                assert_eq!(**right, Expr::from(var("c")));
                assert!(matches!(left.as_ref(), Expr::And(_, _)));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn not_wraps() {
        let expr = !Expr::from(var("user.banned"));
        assert!(matches!(expr, Expr::Not(_)));
    }

    #[test]
    fn display_renders_dsl() {
        let expr = Expr::from(var("user.is_vip"))
            .and(var("order.total").gte(200_i64))
            .or(call("contains", vec![var("user.tags").into(), "gold".into()]));
        assert_eq!(
            expr.to_string(),
            "((user.is_vip and (order.total >= 200)) or contains(user.tags, \"gold\"))"
        );
    }

    #[test]
    fn depth_counts_nesting() {
        assert_eq!(Expr::Bool(true).depth(), 1);
        assert_eq!(var("x").eq(1_i64).depth(), 2);
        assert_eq!((!var("x").eq(1_i64)).depth(), 3);
        assert_eq!(call("f", vec![]).depth(), 1);
    }
}
