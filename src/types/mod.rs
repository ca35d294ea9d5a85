mod action;
mod action_result;
mod config;
mod context;
mod engine;
mod error;
mod expr;
mod rule;
mod ruleset;
mod trace;
mod value;

pub use action::{Action, Tier};
pub use action_result::ActionResult;
pub use config::{EngineConfig, DEFAULT_AMOUNT_FIELD, DEFAULT_MAX_DEPTH};
pub use context::{Context, Function, Resolver};
pub use engine::RuleEngine;
pub use error::{ActionError, CompileError, EvalError};
pub use expr::{call, lit, var, CompareOp, Expr, VarExpr, VarPath};
pub use rule::{Rule, RuleDefinition};
pub use ruleset::RuleSet;
pub use trace::{EvaluationReport, RuleOutcome, RuleTrace, SkipReason};
pub use value::Value;
