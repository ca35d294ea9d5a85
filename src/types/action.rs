use rust_decimal::Decimal;

use super::action_result::ActionResult;
use super::config::EngineConfig;
use super::context::Resolver;
use super::error::{ActionError, EvalError};

/// One step of a tiered discount: orders of at least `threshold` get
/// `discount` off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tier {
    pub threshold: Decimal,
    pub discount: Decimal,
}

impl Tier {
    #[must_use]
    pub fn new(threshold: Decimal, discount: Decimal) -> Self {
        Self {
            threshold,
            discount,
        }
    }
}

/// What a rule does when its condition holds.
///
/// Discount-style actions read their base amount from the context path
/// configured in [`EngineConfig::amount_field`] and never produce a
/// discount larger than the base or below zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum Action {
    /// The customer pays `rate` of the base amount; `rate` of 0.8 is 20% off.
    Percentage { rate: Decimal },
    FixedDiscount { amount: Decimal },
    /// Sell at `price`; the discount is whatever brings the base down to it.
    FixedPrice { price: Decimal },
    /// `discount` off when the base reaches `threshold`, nothing otherwise.
    Threshold { threshold: Decimal, discount: Decimal },
    /// The highest tier whose threshold the base reaches applies.
    Tiered { tiers: Vec<Tier> },
    Gift { item: String, quantity: u32 },
    Points { points: u64 },
    /// Apply every child and collect their results.
    All { actions: Vec<Action> },
    /// Apply every child and keep the result worth the most.
    Best { actions: Vec<Action> },
}

impl Action {
    /// Apply this action against `ctx`.
    ///
    /// Gift and points actions never touch the context. Every other leaf
    /// reads the base amount, so a missing or non-numeric amount fails the
    /// whole action, composites included.
    ///
    /// # Errors
    ///
    /// [`ActionError::Amount`] if the base amount cannot be read.
    pub fn apply<R: Resolver + ?Sized>(
        &self,
        ctx: &R,
        config: &EngineConfig,
    ) -> Result<ActionResult, ActionError> {
        let discount = |amount: Decimal| ActionResult::Discount {
            amount: amount.round_dp(config.currency_scale),
        };

        match self {
            Action::Percentage { rate } => {
                let base = base_amount(ctx, config)?;
                let off = base
                    .checked_mul(Decimal::ONE - *rate)
                    .unwrap_or(Decimal::ZERO);
                Ok(discount(clamp(off, base)))
            }
            Action::FixedDiscount { amount } => {
                let base = base_amount(ctx, config)?;
                Ok(discount(clamp(*amount, base)))
            }
            Action::FixedPrice { price } => {
                let base = base_amount(ctx, config)?;
                // Nothing off when the base is already at or below the price.
                let off = base.checked_sub(*price).unwrap_or(Decimal::ZERO);
                Ok(discount(clamp(off, base)))
            }
            Action::Threshold {
                threshold,
                discount: off,
            } => {
                let base = base_amount(ctx, config)?;
                if base >= *threshold {
                    Ok(discount(clamp(*off, base)))
                } else {
                    Ok(ActionResult::None)
                }
            }
            Action::Tiered { tiers } => {
                let base = base_amount(ctx, config)?;
                Ok(match select_tier(tiers, base) {
                    Some(tier) => discount(clamp(tier.discount, base)),
                    None => ActionResult::None,
                })
            }
            Action::Gift { item, quantity } => Ok(ActionResult::Gift {
                item: item.clone(),
                quantity: *quantity,
            }),
            Action::Points { points } => Ok(ActionResult::Points { points: *points }),
            Action::All { actions } => {
                let results = actions
                    .iter()
                    .map(|action| action.apply(ctx, config))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ActionResult::Multiple { results })
            }
            Action::Best { actions } => {
                let mut best: Option<ActionResult> = None;
                for action in actions {
                    let result = action.apply(ctx, config)?;
                    // Strictly greater: on a tie the earlier child stays.
                    match &best {
                        Some(current) if result.discount_value() <= current.discount_value() => {}
                        _ => best = Some(result),
                    }
                }
                Ok(best.unwrap_or(ActionResult::None))
            }
        }
    }

    /// Check parameters that would make the action meaningless. Returns a
    /// human-readable reason on failure.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Action::Percentage { rate } => {
                if rate.is_sign_negative() || *rate > Decimal::ONE {
                    return Err(format!("percentage rate {rate} is outside 0..=1"));
                }
            }
            Action::FixedDiscount { amount } => non_negative("discount amount", *amount)?,
            Action::FixedPrice { price } => non_negative("fixed price", *price)?,
            Action::Threshold {
                threshold,
                discount,
            } => {
                non_negative("threshold", *threshold)?;
                non_negative("threshold discount", *discount)?;
            }
            Action::Tiered { tiers } => {
                if tiers.is_empty() {
                    return Err("tiered discount has no tiers".to_owned());
                }
                for tier in tiers {
                    non_negative("tier threshold", tier.threshold)?;
                    non_negative("tier discount", tier.discount)?;
                }
                for (i, tier) in tiers.iter().enumerate() {
                    if tiers[..i].iter().any(|t| t.threshold == tier.threshold) {
                        return Err(format!("duplicate tier threshold {}", tier.threshold));
                    }
                }
            }
            Action::Gift { item, quantity } => {
                if item.is_empty() {
                    return Err("gift item is empty".to_owned());
                }
                if *quantity == 0 {
                    return Err(format!("gift '{item}' has zero quantity"));
                }
            }
            Action::Points { .. } => {}
            Action::All { actions } | Action::Best { actions } => {
                for action in actions {
                    action.validate()?;
                }
            }
        }
        Ok(())
    }
}

fn non_negative(what: &str, value: Decimal) -> Result<(), String> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(format!("{what} {value} is negative"))
    } else {
        Ok(())
    }
}

/// Keep a discount within `0..=base`.
fn clamp(amount: Decimal, base: Decimal) -> Decimal {
    amount.min(base).max(Decimal::ZERO)
}

fn select_tier(tiers: &[Tier], base: Decimal) -> Option<&Tier> {
    tiers
        .iter()
        .filter(|tier| tier.threshold <= base)
        .max_by_key(|tier| tier.threshold)
}

fn base_amount<R: Resolver + ?Sized>(
    ctx: &R,
    config: &EngineConfig,
) -> Result<Decimal, ActionError> {
    let field = config.amount_field.as_str();
    let value = ctx.variable(field).ok_or_else(|| {
        ActionError::Amount(EvalError::UnknownVariable {
            path: field.to_owned(),
        })
    })?;
    value.as_number().ok_or_else(|| {
        ActionError::Amount(EvalError::TypeMismatch {
            operation: field.to_owned(),
            expected: "number".to_owned(),
            found: value.kind().to_owned(),
        })
    })
}
