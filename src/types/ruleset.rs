use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use super::action_result::ActionResult;
use super::config::EngineConfig;
use super::context::Resolver;
use super::rule::Rule;
use super::trace::{EvaluationReport, RuleOutcome, RuleTrace};

/// An immutable, versioned view of the engine's rules in evaluation order.
///
/// Obtained from [`RuleEngine::snapshot()`](crate::RuleEngine::snapshot).
/// A snapshot never changes after it is published, so repeated evaluations
/// against the same snapshot see exactly the same rules even while the
/// engine is being modified.
#[derive(Debug)]
pub struct RuleSet {
    pub(crate) version: u64,
    pub(crate) rules: Vec<Arc<Rule>>,
    pub(crate) config: Arc<EngineConfig>,
}

impl RuleSet {
    pub(crate) fn empty(config: Arc<EngineConfig>) -> Self {
        Self {
            version: 0,
            rules: Vec::new(),
            config,
        }
    }

    /// Monotonic counter bumped by every change to the engine.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in evaluation order: descending priority, insertion order
    /// among equal priorities.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    /// Rule ids in evaluation order.
    #[must_use]
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules().find(|r| r.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Evaluate every rule at the current time. See
    /// [`evaluate_at`](Self::evaluate_at).
    #[must_use]
    pub fn evaluate<R: Resolver + ?Sized>(&self, ctx: &R) -> Vec<ActionResult> {
        self.evaluate_at(ctx, Utc::now())
    }

    /// Evaluate every rule as of `now` and return the results of the rules
    /// that matched, in evaluation order.
    ///
    /// Never fails: a rule whose condition or action errors is logged and
    /// treated as not matched.
    #[must_use]
    #[instrument(level = "debug", skip_all, fields(version = self.version, rules = self.rules.len()))]
    pub fn evaluate_at<R: Resolver + ?Sized>(
        &self,
        ctx: &R,
        now: DateTime<Utc>,
    ) -> Vec<ActionResult> {
        crate::evaluate::matched_results(&self.rules, ctx, now, &self.config)
    }

    /// Evaluate at the current time with a per-rule trace.
    pub fn evaluate_detailed<R: Resolver + ?Sized>(&self, ctx: &R) -> EvaluationReport {
        self.evaluate_detailed_at(ctx, Utc::now())
    }

    /// Evaluate as of `now`, recording an outcome for every rule.
    #[instrument(level = "debug", skip_all, fields(version = self.version, rules = self.rules.len()))]
    pub fn evaluate_detailed_at<R: Resolver + ?Sized>(
        &self,
        ctx: &R,
        now: DateTime<Utc>,
    ) -> EvaluationReport {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut trace = Vec::with_capacity(self.rules.len());
        crate::evaluate::evaluate_rules(&self.rules, ctx, now, &self.config, |rule, outcome| {
            if let RuleOutcome::Matched(result) = &outcome {
                results.push(result.clone());
            }
            trace.push(RuleTrace {
                rule_id: rule.id().to_owned(),
                priority: rule.priority(),
                outcome,
            });
        });
        EvaluationReport::new(results, trace, self.version, start.elapsed())
    }

    /// The largest discount value among matched results at the current
    /// time, zero if nothing matched.
    #[must_use]
    pub fn find_best_discount<R: Resolver + ?Sized>(&self, ctx: &R) -> Decimal {
        self.find_best_discount_at(ctx, Utc::now())
    }

    /// The largest discount value among results matched as of `now`.
    #[must_use]
    pub fn find_best_discount_at<R: Resolver + ?Sized>(
        &self,
        ctx: &R,
        now: DateTime<Utc>,
    ) -> Decimal {
        self.evaluate_at(ctx, now)
            .iter()
            .map(ActionResult::discount_value)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// The matched result with the largest discount value as of `now`.
    ///
    /// `None` when nothing matched. On a tie the result evaluated first
    /// wins, so a gift is still returned when it is all that matched.
    #[must_use]
    pub fn best_result_at<R: Resolver + ?Sized>(
        &self,
        ctx: &R,
        now: DateTime<Utc>,
    ) -> Option<ActionResult> {
        best_of(self.evaluate_at(ctx, now))
    }
}

/// First result with the maximal discount value.
pub(crate) fn best_of(results: Vec<ActionResult>) -> Option<ActionResult> {
    let mut best: Option<(Decimal, ActionResult)> = None;
    for result in results {
        let value = result.discount_value();
        match &best {
            Some((top, _)) if value <= *top => {}
            _ => best = Some((value, result)),
        }
    }
    best.map(|(_, result)| result)
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled = self.rules.iter().filter(|r| r.is_enabled()).count();
        write!(
            f,
            "RuleSet(v{}, {} rules, {} enabled)",
            self.version,
            self.rules.len(),
            enabled,
        )
    }
}
