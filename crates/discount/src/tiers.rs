use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{DiscountError, Result};

/// Upper bound for any VIP maintenance discount.
pub const MAX_VIP_DISCOUNT_PERCENT: u8 = 20;

// ---------------------------------------------------------------------------
// VIP tiers (cumulative platform spend)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VipTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl VipTier {
    pub const ALL: [VipTier; 5] = [
        VipTier::Bronze,
        VipTier::Silver,
        VipTier::Gold,
        VipTier::Platinum,
        VipTier::Diamond,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VipTier::Bronze => "Bronze",
            VipTier::Silver => "Silver",
            VipTier::Gold => "Gold",
            VipTier::Platinum => "Platinum",
            VipTier::Diamond => "Diamond",
        }
    }

    /// Cumulative spend (USD) needed to reach this tier.
    pub fn min_spent_usd(self) -> u64 {
        match self {
            VipTier::Bronze => 0,
            VipTier::Silver => 1_000,
            VipTier::Gold => 5_000,
            VipTier::Platinum => 15_000,
            VipTier::Diamond => 50_000,
        }
    }

    pub fn maintenance_discount_percent(self) -> u8 {
        match self {
            VipTier::Bronze => 2,
            VipTier::Silver => 5,
            VipTier::Gold => 9,
            VipTier::Platinum => 13,
            VipTier::Diamond => 18,
        }
    }

    /// Highest tier whose spend threshold is met.
    pub fn from_total_spent(total_spent_usd: Decimal) -> Result<VipTier> {
        if total_spent_usd < Decimal::ZERO {
            return Err(DiscountError::Negative {
                field: "total_spent_usd",
            });
        }
        Ok(Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| total_spent_usd >= Decimal::from(tier.min_spent_usd()))
            .unwrap_or(VipTier::Bronze))
    }
}

impl std::str::FromStr for VipTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name().to_lowercase() == needle)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|t| t.name()).collect();
                format!("Unknown VIP tier \"{}\". Available tiers: {}", s, names.join(", "))
            })
    }
}

// ---------------------------------------------------------------------------
// Holdings tiers (days of maintenance covered by TYT holdings)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldingsTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl HoldingsTier {
    pub const ALL: [HoldingsTier; 5] = [
        HoldingsTier::Bronze,
        HoldingsTier::Silver,
        HoldingsTier::Gold,
        HoldingsTier::Platinum,
        HoldingsTier::Diamond,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HoldingsTier::Bronze => "Bronze",
            HoldingsTier::Silver => "Silver",
            HoldingsTier::Gold => "Gold",
            HoldingsTier::Platinum => "Platinum",
            HoldingsTier::Diamond => "Diamond",
        }
    }

    pub fn coverage_days(self) -> u32 {
        match self {
            HoldingsTier::Bronze => 30,
            HoldingsTier::Silver => 90,
            HoldingsTier::Gold => 180,
            HoldingsTier::Platinum => 270,
            HoldingsTier::Diamond => 360,
        }
    }

    pub fn discount_percent(self) -> u8 {
        match self {
            HoldingsTier::Bronze => 2,
            HoldingsTier::Silver => 5,
            HoldingsTier::Gold => 9,
            HoldingsTier::Platinum => 13,
            HoldingsTier::Diamond => 18,
        }
    }

    /// Tier earned by holdings worth `holdings_usd` against a daily cost of
    /// `daily_cost_usd`. `None` below the first threshold.
    pub fn from_coverage(
        holdings_usd: Decimal,
        daily_cost_usd: Decimal,
    ) -> Result<Option<HoldingsTier>> {
        if holdings_usd < Decimal::ZERO {
            return Err(DiscountError::Negative {
                field: "holdings_usd",
            });
        }
        if daily_cost_usd < Decimal::ZERO {
            return Err(DiscountError::Negative {
                field: "daily_cost_usd",
            });
        }
        if holdings_usd.is_zero() || daily_cost_usd.is_zero() {
            return Ok(None);
        }

        let coverage = holdings_usd
            .checked_div(daily_cost_usd)
            .ok_or(DiscountError::Overflow("coverage days"))?;

        Ok(Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|tier| coverage >= Decimal::from(tier.coverage_days())))
    }
}

/// Discount contributed by an optional holdings tier.
pub fn holdings_discount_percent(tier: Option<HoldingsTier>) -> u8 {
    tier.map_or(0, HoldingsTier::discount_percent)
}
