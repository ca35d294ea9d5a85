mod builtins;
mod compile;
mod evaluate;
pub mod parse;
mod types;

pub use compile::{compile_condition, compile_condition_with_depth};
pub use evaluate::{evaluate, evaluate_condition};
pub use types::{
    call, lit, var, Action, ActionError, ActionResult, CompareOp, CompileError, Context,
    EngineConfig, EvalError, EvaluationReport, Expr, Function, Resolver, Rule, RuleDefinition,
    RuleEngine, RuleOutcome, RuleSet, RuleTrace, SkipReason, Tier, Value, VarExpr, VarPath,
    DEFAULT_AMOUNT_FIELD, DEFAULT_MAX_DEPTH,
};
