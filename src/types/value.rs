use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;

use super::error::EvalError;
use super::expr::CompareOp;

/// Runtime values produced by the evaluator and supplied by a context.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An exact decimal number. Monetary amounts are always numbers.
    Number(Decimal),
    /// A UTF-8 string.
    String(String),
    /// An ordered list of values, e.g. a user's tags.
    List(Vec<Value>),
}

impl Value {
    /// Short lowercase name of this value's kind, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compare this value to another using the given operator.
    ///
    /// Both sides must be the same kind; nothing is coerced. Numbers and
    /// strings are ordered, booleans and lists only support `=` and `!=`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::TypeMismatch`] when the kinds differ or the
    /// operator is not defined for the kind.
    pub fn compare(&self, op: CompareOp, other: &Value) -> Result<bool, EvalError> {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return Err(EvalError::TypeMismatch {
                operation: op.to_string(),
                expected: self.kind().to_owned(),
                found: other.kind().to_owned(),
            });
        }

        let ord = match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => {
                return match op {
                    CompareOp::Eq => Ok(self == other),
                    CompareOp::Neq => Ok(self != other),
                    _ => Err(EvalError::TypeMismatch {
                        operation: op.to_string(),
                        expected: "number or string".to_owned(),
                        found: self.kind().to_owned(),
                    }),
                };
            }
        };

        Ok(match op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Neq => ord != Ordering::Equal,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
        })
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(Decimal::from(v))
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Number(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
