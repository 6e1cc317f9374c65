use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::bonus::DAILY_BONUS_PERCENT;
use crate::errors::{DiscountError, Result};

/// Discount bonus granted for paying in TYT.
pub const TYT_BASE_DISCOUNT_PERCENT: u8 = 20;
/// Ceiling on the combined discount for any currency.
pub const MAX_TOTAL_DISCOUNT_PERCENT: u8 = 50;

/// Share of a TYT payment that is burned.
pub fn default_burn_fraction() -> Decimal {
    Decimal::new(5, 1)
}

/// Constants the engine combines. `Default` carries the production values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscountPolicy {
    pub tyt_base_percent: u8,
    pub daily_bonus_percent: u8,
    pub max_total_percent: u8,
    pub burn_fraction: Decimal,
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            tyt_base_percent: TYT_BASE_DISCOUNT_PERCENT,
            daily_bonus_percent: DAILY_BONUS_PERCENT,
            max_total_percent: MAX_TOTAL_DISCOUNT_PERCENT,
            burn_fraction: default_burn_fraction(),
        }
    }
}

impl DiscountPolicy {
    /// Parse a JSON policy document. Absent fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let policy: DiscountPolicy = serde_json::from_str(json)
            .map_err(|e| DiscountError::InvalidPolicy(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tyt_base_percent", self.tyt_base_percent),
            ("daily_bonus_percent", self.daily_bonus_percent),
            ("max_total_percent", self.max_total_percent),
        ] {
            if value > 100 {
                return Err(DiscountError::InvalidPolicy(format!(
                    "{} is {}%, must be at most 100%",
                    name, value
                )));
            }
        }
        if self.burn_fraction < Decimal::ZERO || self.burn_fraction > Decimal::ONE {
            return Err(DiscountError::InvalidPolicy(format!(
                "burn_fraction {} must be between 0 and 1",
                self.burn_fraction
            )));
        }
        Ok(())
    }
}
