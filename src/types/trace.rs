use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;

use super::action_result::{self, ActionResult};
use super::error::{ActionError, EvalError};

/// Why a rule was passed over without looking at its condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    NotYetValid,
    Expired,
    /// An earlier exclusive rule already matched.
    Excluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::Disabled => "disabled",
            SkipReason::NotYetValid => "not yet valid",
            SkipReason::Expired => "expired",
            SkipReason::Excluded => "excluded",
        })
    }
}

/// What happened to a single rule during one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Matched(ActionResult),
    NotMatched,
    Skipped(SkipReason),
    /// The condition raised an error; the rule counts as not matched.
    ConditionFailed(EvalError),
    /// The condition held but the action could not be applied.
    ActionFailed(ActionError),
}

impl RuleOutcome {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, RuleOutcome::Matched(_))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RuleOutcome::ConditionFailed(_) | RuleOutcome::ActionFailed(_)
        )
    }
}

/// One entry of an evaluation trace.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTrace {
    pub rule_id: String,
    pub priority: i32,
    pub outcome: RuleOutcome,
}

/// Detailed evaluation report returned by
/// [`RuleEngine::evaluate_detailed()`](crate::RuleEngine::evaluate_detailed).
///
/// Holds the same results `evaluate` would return, plus a trace entry for
/// every rule in the snapshot (in evaluation order), the snapshot version
/// that was evaluated, and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct EvaluationReport {
    results: Vec<ActionResult>,
    trace: Vec<RuleTrace>,
    version: u64,
    duration: Duration,
}

impl EvaluationReport {
    pub(crate) fn new(
        results: Vec<ActionResult>,
        trace: Vec<RuleTrace>,
        version: u64,
        duration: Duration,
    ) -> Self {
        Self {
            results,
            trace,
            version,
            duration,
        }
    }

    /// Results of the matched rules, in evaluation order.
    #[must_use]
    pub fn results(&self) -> &[ActionResult] {
        &self.results
    }

    #[must_use]
    pub fn into_results(self) -> Vec<ActionResult> {
        self.results
    }

    /// One entry per rule in the snapshot, in evaluation order.
    #[must_use]
    pub fn trace(&self) -> &[RuleTrace] {
        &self.trace
    }

    /// Ids of the rules that matched, in evaluation order.
    #[must_use]
    pub fn matched(&self) -> Vec<&str> {
        self.trace
            .iter()
            .filter(|t| t.outcome.is_match())
            .map(|t| t.rule_id.as_str())
            .collect()
    }

    /// Trace entries for rules whose condition or action failed.
    pub fn errors(&self) -> impl Iterator<Item = &RuleTrace> {
        self.trace.iter().filter(|t| t.outcome.is_error())
    }

    /// The outcome recorded for `rule_id`, if the rule was in the snapshot.
    #[must_use]
    pub fn outcome_of(&self, rule_id: &str) -> Option<&RuleOutcome> {
        self.trace
            .iter()
            .find(|t| t.rule_id == rule_id)
            .map(|t| &t.outcome)
    }

    /// Combined discount value of every matched result.
    #[must_use]
    pub fn total_discount(&self) -> Decimal {
        action_result::total_discount(&self.results)
    }

    /// Version of the snapshot that was evaluated.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Wall-clock duration of the evaluation.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "version: {}", self.version)?;
        write!(f, ", matched: [{}]", self.matched().join(", "))?;
        let errors = self.errors().count();
        if errors > 0 {
            write!(f, ", errors: {errors}")?;
        }
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
