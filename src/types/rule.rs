use chrono::{DateTime, Utc};

use super::action::Action;
use super::expr::Expr;
use super::trace::SkipReason;

/// The authored form of a rule: its condition is still source text.
///
/// Handed to [`RuleEngine::add_rule`](crate::RuleEngine::add_rule), which
/// compiles the condition and validates the action before the rule can
/// ever be evaluated.
///
/// ```
/// use rulecraft::{Action, RuleDefinition};
/// use rust_decimal::Decimal;
///
/// let rule = RuleDefinition::new(
///     "vip-20",
///     "user.is_vip = true AND order.total > 200",
///     Action::Percentage { rate: Decimal::new(8, 1) },
/// )
/// .name("VIP 20% off")
/// .priority(10)
/// .exclusive(true);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleDefinition {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    /// Higher priorities are evaluated first.
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: i32,
    #[cfg_attr(feature = "serde", serde(default = "enabled_by_default"))]
    pub enabled: bool,
    pub condition: String,
    pub action: Action,
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclusive: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub valid_from: Option<DateTime<Utc>>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub valid_to: Option<DateTime<Utc>>,
}

#[cfg(feature = "serde")]
fn enabled_by_default() -> bool {
    true
}

impl RuleDefinition {
    /// An enabled, non-exclusive rule at priority 0 with no validity window.
    #[must_use]
    pub fn new(id: &str, condition: &str, action: Action) -> Self {
        Self {
            id: id.to_owned(),
            name: id.to_owned(),
            description: String::new(),
            priority: 0,
            enabled: true,
            condition: condition.to_owned(),
            action,
            exclusive: false,
            valid_from: None,
            valid_to: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        name.clone_into(&mut self.name);
        self
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        description.clone_into(&mut self.description);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Restrict the rule to `from..=to`. Either end may be left open.
    #[must_use]
    pub fn valid_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.valid_from = from;
        self.valid_to = to;
        self
    }
}

/// A compiled rule, as stored in a [`RuleSet`](crate::RuleSet) snapshot.
///
/// Immutable once built. Changing a rule means replacing it through the
/// engine, which publishes a new snapshot.
#[derive(Debug, Clone)]
pub struct Rule {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) priority: i32,
    pub(crate) enabled: bool,
    pub(crate) condition: Expr,
    pub(crate) source: String,
    pub(crate) action: Action,
    pub(crate) exclusive: bool,
    pub(crate) valid_from: Option<DateTime<Utc>>,
    pub(crate) valid_to: Option<DateTime<Utc>>,
}

impl Rule {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The parsed condition.
    #[must_use]
    pub fn condition(&self) -> &Expr {
        &self.condition
    }

    /// The condition text the rule was defined with.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn action(&self) -> &Action {
        &self.action
    }

    #[must_use]
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    #[must_use]
    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.valid_from
    }

    #[must_use]
    pub fn valid_to(&self) -> Option<DateTime<Utc>> {
        self.valid_to
    }

    /// Whether `now` falls inside the validity window. Both ends inclusive.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.window_skip(now).is_none()
    }

    /// Why the rule would be skipped before its condition is looked at, if
    /// it would be. Exclusivity is decided by the evaluation pass, not here.
    pub(crate) fn pre_check(&self, now: DateTime<Utc>) -> Option<SkipReason> {
        if !self.enabled {
            return Some(SkipReason::Disabled);
        }
        self.window_skip(now)
    }

    fn window_skip(&self, now: DateTime<Utc>) -> Option<SkipReason> {
        match (self.valid_from, self.valid_to) {
            (Some(from), _) if now < from => Some(SkipReason::NotYetValid),
            (_, Some(to)) if now > to => Some(SkipReason::Expired),
            _ => None,
        }
    }

    /// Convert back into the authored form.
    #[must_use]
    pub fn to_definition(&self) -> RuleDefinition {
        RuleDefinition {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            priority: self.priority,
            enabled: self.enabled,
            condition: self.source.clone(),
            action: self.action.clone(),
            exclusive: self.exclusive,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{compile::compile_rule, EngineConfig};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn windowed(from: Option<u32>, to: Option<u32>) -> Rule {
        let def = RuleDefinition::new("spring", "true", Action::Points { points: 1 })
            .valid_between(from.map(at), to.map(at));
        compile_rule(def, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn definition_defaults() {
        let def = RuleDefinition::new("r1", "true", Action::Points { points: 1 });
        assert_eq!(def.name, "r1");
        assert!(def.enabled);
        assert!(!def.exclusive);
        assert_eq!(def.priority, 0);
        assert!(def.valid_from.is_none() && def.valid_to.is_none());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let rule = windowed(Some(10), Some(20));
        assert!(rule.is_valid_at(at(10)));
        assert!(rule.is_valid_at(at(15)));
        assert!(rule.is_valid_at(at(20)));
        assert_eq!(rule.pre_check(at(9)), Some(SkipReason::NotYetValid));
        assert_eq!(rule.pre_check(at(21)), Some(SkipReason::Expired));
    }

    #[test]
    fn open_ended_windows() {
        assert!(windowed(None, Some(20)).is_valid_at(at(1)));
        assert!(windowed(Some(10), None).is_valid_at(at(31)));
        assert!(windowed(None, None).is_valid_at(at(1)));
    }

    #[test]
    fn disabled_wins_over_window() {
        let def = RuleDefinition::new("off", "true", Action::Points { points: 1 })
            .enabled(false)
            .valid_between(Some(at(10)), None);
        let rule = compile_rule(def, &EngineConfig::default()).unwrap();
        assert_eq!(rule.pre_check(at(1)), Some(SkipReason::Disabled));
    }

    #[test]
    fn round_trips_to_definition() {
        let def = RuleDefinition::new("r1", "order.total >= 100", Action::Points { points: 5 })
            .name("Points on big orders")
            .description("5 points for orders over 100")
            .priority(3)
            .exclusive(true);
        let rule = compile_rule(def.clone(), &EngineConfig::default()).unwrap();
        assert_eq!(rule.to_definition(), def);
    }
}
