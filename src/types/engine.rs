use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::info;

use super::action_result::ActionResult;
use super::config::EngineConfig;
use super::context::Resolver;
use super::error::CompileError;
use super::rule::{Rule, RuleDefinition};
use super::ruleset::RuleSet;
use super::trace::EvaluationReport;
use crate::compile::{compile_batch, compile_rule};

/// A thread-safe rule engine: many concurrent evaluators, occasional writers.
///
/// Rules live in an immutable [`RuleSet`] snapshot. Evaluation loads the
/// current snapshot with one atomic read and never takes a lock. Every
/// change compiles first, then builds a new snapshot from the current one
/// and swaps it in, so an evaluation sees either the old rules or the new
/// ones, never a mix. Writers are serialized among themselves.
///
/// ```
/// use rulecraft::{Action, Context, RuleDefinition, RuleEngine};
/// use rust_decimal::Decimal;
///
/// let engine = RuleEngine::new();
/// engine
///     .add_rule(RuleDefinition::new(
///         "vip-20",
///         "user.is_vip = true AND order.total > 200",
///         Action::Percentage { rate: Decimal::new(8, 1) },
///     ))
///     .unwrap();
///
/// let ctx = Context::new()
///     .set("user.is_vip", true)
///     .set("order.total", 300_i64);
/// assert_eq!(engine.find_best_discount(&ctx), Decimal::from(60));
/// ```
pub struct RuleEngine {
    current: ArcSwap<RuleSet>,
    writer: Mutex<()>,
    config: Arc<EngineConfig>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    /// An empty engine with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let config = Arc::new(config);
        Self {
            current: ArcSwap::from_pointee(RuleSet::empty(Arc::clone(&config))),
            writer: Mutex::new(()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current snapshot. Hold on to it to evaluate several contexts
    /// against exactly one version of the rules.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    /// Rule ids in evaluation order.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<String> {
        self.current
            .load()
            .rules()
            .map(|r| r.id().to_owned())
            .collect()
    }

    /// The compiled rule with this id, shared with the current snapshot.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Rule>> {
        self.current
            .load()
            .rules
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    /// Compile and insert a rule.
    ///
    /// The rule lands after every rule of higher or equal priority, so rules
    /// sharing a priority keep their insertion order.
    ///
    /// # Errors
    ///
    /// Any [`CompileError`]: a malformed condition, an invalid action or
    /// window, an empty id, or an id already in use. On error the engine is
    /// left untouched.
    pub fn add_rule(&self, def: RuleDefinition) -> Result<(), CompileError> {
        let rule = compile_rule(def, &self.config)?;
        let id = rule.id().to_owned();
        self.update(|rules| {
            ensure_absent(rules, &id)?;
            rules.push(Arc::new(rule));
            Ok(true)
        })?;
        info!(rule = %id, "rule added");
        Ok(())
    }

    /// Compile and insert several rules in one swap.
    ///
    /// # Errors
    ///
    /// The first [`CompileError`] hit, including ids repeated within the
    /// batch. Nothing is inserted unless every definition compiles.
    pub fn add_rules(
        &self,
        defs: impl IntoIterator<Item = RuleDefinition>,
    ) -> Result<(), CompileError> {
        let batch = compile_batch(defs, &self.config)?;
        let count = batch.len();
        self.update(|rules| {
            for rule in &batch {
                ensure_absent(rules, rule.id())?;
            }
            rules.extend(batch.into_iter().map(Arc::new));
            Ok(count > 0)
        })?;
        info!(count, "rules added");
        Ok(())
    }

    /// Recompile a rule under an existing id and swap it in.
    ///
    /// The replacement is ordered as if newly inserted.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnknownRule`] if no rule has this id, or any error
    /// from compiling the new definition.
    pub fn replace_rule(&self, def: RuleDefinition) -> Result<(), CompileError> {
        let rule = compile_rule(def, &self.config)?;
        let id = rule.id().to_owned();
        self.update(|rules| {
            let pos = position(rules, &id).ok_or_else(|| CompileError::UnknownRule {
                id: id.clone(),
            })?;
            rules.remove(pos);
            rules.push(Arc::new(rule));
            Ok(true)
        })?;
        info!(rule = %id, "rule replaced");
        Ok(())
    }

    /// Remove a rule. Returns `false` if no rule had this id.
    pub fn remove_rule(&self, id: &str) -> bool {
        let removed = self.mutate(|rules| {
            position(rules, id).map(|pos| {
                rules.remove(pos);
            })
        });
        if removed {
            info!(rule = %id, "rule removed");
        }
        removed
    }

    /// Enable or disable a rule without changing its place in the order.
    /// Returns `false` if no rule had this id.
    pub fn set_enabled(&self, id: &str, enabled: bool) -> bool {
        let found = self.mutate(|rules| {
            position(rules, id).map(|pos| {
                let mut copy = Rule::clone(&rules[pos]);
                copy.enabled = enabled;
                rules[pos] = Arc::new(copy);
            })
        });
        if found {
            info!(rule = %id, enabled, "rule toggled");
        }
        found
    }

    /// Evaluate the current snapshot at the current time.
    ///
    /// Returns one result per matched rule, in evaluation order.
    #[must_use]
    pub fn evaluate<R: Resolver + ?Sized>(&self, ctx: &R) -> Vec<ActionResult> {
        self.current.load().evaluate(ctx)
    }

    #[must_use]
    pub fn evaluate_at<R: Resolver + ?Sized>(
        &self,
        ctx: &R,
        now: DateTime<Utc>,
    ) -> Vec<ActionResult> {
        self.current.load().evaluate_at(ctx, now)
    }

    pub fn evaluate_detailed<R: Resolver + ?Sized>(&self, ctx: &R) -> EvaluationReport {
        self.current.load().evaluate_detailed(ctx)
    }

    pub fn evaluate_detailed_at<R: Resolver + ?Sized>(
        &self,
        ctx: &R,
        now: DateTime<Utc>,
    ) -> EvaluationReport {
        self.current.load().evaluate_detailed_at(ctx, now)
    }

    /// Largest discount value among matched results, zero if none matched.
    #[must_use]
    pub fn find_best_discount<R: Resolver + ?Sized>(&self, ctx: &R) -> Decimal {
        self.current.load().find_best_discount(ctx)
    }

    #[must_use]
    pub fn find_best_discount_at<R: Resolver + ?Sized>(
        &self,
        ctx: &R,
        now: DateTime<Utc>,
    ) -> Decimal {
        self.current.load().find_best_discount_at(ctx, now)
    }

    /// Apply `change` to a copy of the current rules and publish the result
    /// as the next version. `change` returns whether anything changed; an
    /// error or `false` leaves the current snapshot in place.
    fn update(
        &self,
        change: impl FnOnce(&mut Vec<Arc<Rule>>) -> Result<bool, CompileError>,
    ) -> Result<bool, CompileError> {
        let _guard = self.writer.lock();
        let current = self.current.load_full();
        let mut rules = current.rules.clone();
        if !change(&mut rules)? {
            return Ok(false);
        }
        // Stable: equal priorities keep insertion order.
        rules.sort_by_key(|r| std::cmp::Reverse(r.priority()));
        let next = RuleSet {
            version: current.version + 1,
            rules,
            config: Arc::clone(&self.config),
        };
        info!(version = next.version, rules = next.len(), "rule set published");
        self.current.store(Arc::new(next));
        Ok(true)
    }

    /// [`update`](Self::update) for changes that cannot fail.
    fn mutate(&self, change: impl FnOnce(&mut Vec<Arc<Rule>>) -> Option<()>) -> bool {
        self.update(|rules| Ok(change(rules).is_some()))
            .unwrap_or(false)
    }
}

impl fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleEngine")
            .field("snapshot", &*self.current.load())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RuleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self.current.load(), f)
    }
}

fn position(rules: &[Arc<Rule>], id: &str) -> Option<usize> {
    rules.iter().position(|r| r.id() == id)
}

fn ensure_absent(rules: &[Arc<Rule>], id: &str) -> Result<(), CompileError> {
    if position(rules, id).is_some() {
        Err(CompileError::DuplicateRule { id: id.to_owned() })
    } else {
        Ok(())
    }
}
