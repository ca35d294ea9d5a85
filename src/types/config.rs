/// Default cap on condition nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default context path that actions read their base amount from.
pub const DEFAULT_AMOUNT_FIELD: &str = "order.total";

/// Engine-wide settings, fixed when the engine is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct EngineConfig {
    /// Maximum nesting depth of a compiled condition. Deeper conditions are
    /// rejected by `add_rule` so evaluation recursion stays bounded.
    pub max_depth: usize,
    /// Context path holding the amount discounts are computed from.
    pub amount_field: String,
    /// Decimal places computed discounts are rounded to (banker's rounding).
    pub currency_scale: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            amount_field: DEFAULT_AMOUNT_FIELD.to_owned(),
            currency_scale: 2,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_amount_field(mut self, path: &str) -> Self {
        path.clone_into(&mut self.amount_field);
        self
    }

    #[must_use]
    pub fn with_currency_scale(mut self, scale: u32) -> Self {
        self.currency_scale = scale;
        self
    }
}
