use rust_decimal::Decimal;

/// The outcome of applying an [`Action`](crate::Action).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "snake_case")
)]
pub enum ActionResult {
    /// The action applied but produced nothing, e.g. no tier qualified.
    None,
    /// An amount taken off the base price.
    Discount { amount: Decimal },
    Gift { item: String, quantity: u32 },
    Points { points: u64 },
    /// Results of every child of an `All` composite, in declaration order.
    Multiple { results: Vec<ActionResult> },
}

impl ActionResult {
    /// Monetary value of this result: the discount amount, zero for gifts,
    /// points and `None`, and the sum of the children for `Multiple`.
    /// Sums saturate at [`Decimal::MAX`].
    #[must_use]
    pub fn discount_value(&self) -> Decimal {
        match self {
            ActionResult::Discount { amount } => *amount,
            ActionResult::Multiple { results } => total_discount(results),
            ActionResult::None | ActionResult::Gift { .. } | ActionResult::Points { .. } => {
                Decimal::ZERO
            }
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, ActionResult::None)
    }
}

/// Saturating sum of the discount values of `results`.
pub(crate) fn total_discount<'a>(results: impl IntoIterator<Item = &'a ActionResult>) -> Decimal {
    results
        .into_iter()
        .fold(Decimal::ZERO, |total, result| {
            total.saturating_add(result.discount_value())
        })
}
