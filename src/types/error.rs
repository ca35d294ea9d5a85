use thiserror::Error;

use crate::parse::{LexError, ParseError};

/// Errors returned when a rule definition cannot be compiled into the engine.
///
/// A rule that fails to compile is never stored, and the engine's current
/// rule set is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("duplicate rule id '{id}'")]
    DuplicateRule { id: String },

    #[error("rule id must not be empty")]
    EmptyId,

    #[error("no rule with id '{id}'")]
    UnknownRule { id: String },

    #[error("invalid action in rule '{rule}': {reason}")]
    InvalidAction { rule: String, reason: String },

    #[error("rule '{rule}' has valid_from after valid_to")]
    InvalidWindow { rule: String },
}

/// Errors raised while evaluating a single condition.
///
/// The engine never propagates these; the affected rule is treated as not
/// matching and the error is logged and recorded in the evaluation trace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unknown variable '{path}'")]
    UnknownVariable { path: String },

    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },

    #[error("function '{function}' takes {expected} argument(s), got {found}")]
    WrongArgCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("type mismatch in '{operation}': expected {expected}, found {found}")]
    TypeMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    #[error("function '{function}' failed: {reason}")]
    FunctionFailed { function: String, reason: String },
}

/// Errors raised while applying an action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("cannot read base amount: {0}")]
    Amount(#[source] EvalError),
}
