use std::collections::HashSet;

use crate::parse::{parse, tokenize};
use crate::{CompileError, EngineConfig, Expr, Rule, RuleDefinition, DEFAULT_MAX_DEPTH};

/// Compile condition text into an expression tree.
///
/// Text and tree round-trip: `compile_condition(&expr.to_string())` yields
/// an expression equal to `expr`.
///
/// # Errors
///
/// [`CompileError::Lex`] or [`CompileError::Parse`] on malformed text,
/// including conditions nested deeper than the default depth limit.
///
/// ```
/// use rulecraft::{compile_condition, var};
///
/// let expr = compile_condition("user.is_vip = true AND order.total > 200").unwrap();
/// assert_eq!(expr, var("user.is_vip").eq(true).and(var("order.total").gt(200_i64)));
/// ```
pub fn compile_condition(text: &str) -> Result<Expr, CompileError> {
    compile_condition_with_depth(text, DEFAULT_MAX_DEPTH)
}

/// [`compile_condition`] with an explicit nesting limit.
///
/// # Errors
///
/// See [`compile_condition`].
pub fn compile_condition_with_depth(text: &str, max_depth: usize) -> Result<Expr, CompileError> {
    let tokens = tokenize(text)?;
    Ok(parse(&tokens, max_depth)?)
}

pub(crate) fn compile_rule(def: RuleDefinition, config: &EngineConfig) -> Result<Rule, CompileError> {
    if def.id.trim().is_empty() {
        return Err(CompileError::EmptyId);
    }
    if let (Some(from), Some(to)) = (def.valid_from, def.valid_to) {
        if from > to {
            return Err(CompileError::InvalidWindow { rule: def.id });
        }
    }
    if let Err(reason) = def.action.validate() {
        return Err(CompileError::InvalidAction {
            rule: def.id,
            reason,
        });
    }
    let condition = compile_condition_with_depth(&def.condition, config.max_depth)?;

    Ok(Rule {
        id: def.id,
        name: def.name,
        description: def.description,
        priority: def.priority,
        enabled: def.enabled,
        condition,
        source: def.condition,
        action: def.action,
        exclusive: def.exclusive,
        valid_from: def.valid_from,
        valid_to: def.valid_to,
    })
}

/// Compile a batch, rejecting ids repeated within it. All-or-nothing.
pub(crate) fn compile_batch(
    defs: impl IntoIterator<Item = RuleDefinition>,
    config: &EngineConfig,
) -> Result<Vec<Rule>, CompileError> {
    let mut seen = HashSet::new();
    let mut rules = Vec::new();
    for def in defs {
        if !seen.insert(def.id.clone()) {
            return Err(CompileError::DuplicateRule { id: def.id });
        }
        rules.push(compile_rule(def, config)?);
    }
    Ok(rules)
}
