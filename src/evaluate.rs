use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    ActionResult, EngineConfig, EvalError, Expr, Resolver, Rule, RuleOutcome, SkipReason, Value,
};

/// Evaluate an expression against a resolver.
///
/// `and`/`or` short-circuit left to right and require boolean operands.
/// Comparisons evaluate both sides. Function arity is checked before any
/// argument is evaluated.
///
/// # Errors
///
/// Any [`EvalError`]: unknown variables or functions, wrong argument
/// counts, operands of the wrong kind, or a failing function.
pub fn evaluate<R: Resolver + ?Sized>(expr: &Expr, ctx: &R) -> Result<Value, EvalError> {
    match expr {
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::String(s) => Ok(Value::String(s.clone())),
        Expr::Variable(path) => ctx.variable(path.as_str()).cloned().ok_or_else(|| {
            EvalError::UnknownVariable {
                path: path.as_str().to_owned(),
            }
        }),
        Expr::Compare { op, left, right } => {
            let left = evaluate(left, ctx)?;
            let right = evaluate(right, ctx)?;
            left.compare(*op, &right).map(Value::Bool)
        }
        Expr::And(a, b) => {
            if !truth(a, ctx, "and")? {
                return Ok(Value::Bool(false));
            }
            truth(b, ctx, "and").map(Value::Bool)
        }
        Expr::Or(a, b) => {
            if truth(a, ctx, "or")? {
                return Ok(Value::Bool(true));
            }
            truth(b, ctx, "or").map(Value::Bool)
        }
        Expr::Not(inner) => truth(inner, ctx, "not").map(|b| Value::Bool(!b)),
        Expr::Call { name, args } => {
            let function = ctx
                .function(name)
                .ok_or_else(|| EvalError::UnknownFunction { name: name.clone() })?;
            if args.len() != function.arity() {
                return Err(EvalError::WrongArgCount {
                    function: name.clone(),
                    expected: function.arity(),
                    found: args.len(),
                });
            }
            let values = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            function.call(&values)
        }
    }
}

/// Evaluate an expression that must produce a boolean.
///
/// # Errors
///
/// As [`evaluate`], plus [`EvalError::TypeMismatch`] when the result is
/// not a boolean.
pub fn evaluate_condition<R: Resolver + ?Sized>(expr: &Expr, ctx: &R) -> Result<bool, EvalError> {
    truth(expr, ctx, "condition")
}

fn truth<R: Resolver + ?Sized>(expr: &Expr, ctx: &R, operation: &str) -> Result<bool, EvalError> {
    match evaluate(expr, ctx)? {
        Value::Bool(b) => Ok(b),
        other => Err(EvalError::TypeMismatch {
            operation: operation.to_owned(),
            expected: "bool".to_owned(),
            found: other.kind().to_owned(),
        }),
    }
}

/// One pass over a priority-ordered rule list.
///
/// Every rule gets exactly one outcome, reported through `record` in order.
/// Once an exclusive rule matches, later exclusive rules are skipped without
/// evaluating their condition; non-exclusive rules are unaffected. A rule
/// whose condition or action fails is recorded and the pass moves on.
pub(crate) fn evaluate_rules<R: Resolver + ?Sized>(
    rules: &[Arc<Rule>],
    ctx: &R,
    now: DateTime<Utc>,
    config: &EngineConfig,
    mut record: impl FnMut(&Rule, RuleOutcome),
) {
    let mut exclusive_matched = false;
    for rule in rules {
        let outcome = check_rule(rule, ctx, now, config, exclusive_matched);
        if rule.is_exclusive() && outcome.is_match() {
            exclusive_matched = true;
        }
        record(rule, outcome);
    }
}

fn check_rule<R: Resolver + ?Sized>(
    rule: &Rule,
    ctx: &R,
    now: DateTime<Utc>,
    config: &EngineConfig,
    exclusive_matched: bool,
) -> RuleOutcome {
    if let Some(reason) = rule.pre_check(now) {
        debug!(rule = rule.id(), %reason, "rule skipped");
        return RuleOutcome::Skipped(reason);
    }
    if exclusive_matched && rule.is_exclusive() {
        debug!(rule = rule.id(), "rule skipped, an exclusive rule already matched");
        return RuleOutcome::Skipped(SkipReason::Excluded);
    }

    match evaluate_condition(rule.condition(), ctx) {
        Ok(false) => RuleOutcome::NotMatched,
        Ok(true) => match rule.action().apply(ctx, config) {
            Ok(result) => {
                debug!(
                    rule = rule.id(),
                    discount = %result.discount_value(),
                    "rule matched"
                );
                RuleOutcome::Matched(result)
            }
            Err(error) => {
                warn!(rule = rule.id(), %error, "action failed, rule ignored");
                RuleOutcome::ActionFailed(error)
            }
        },
        Err(error) => {
            warn!(rule = rule.id(), %error, "condition failed, treating rule as not matched");
            RuleOutcome::ConditionFailed(error)
        }
    }
}

/// Results of the matched rules, in order.
pub(crate) fn matched_results<R: Resolver + ?Sized>(
    rules: &[Arc<Rule>],
    ctx: &R,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Vec<ActionResult> {
    let mut results = Vec::new();
    evaluate_rules(rules, ctx, now, config, |_, outcome| {
        if let RuleOutcome::Matched(result) = outcome {
            results.push(result);
        }
    });
    results
}
