use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{DiscountError, Result};

const HOURS_PER_DAY: u32 = 24;
const WATTS_PER_KILOWATT: u32 = 1_000;

/// Physical and pricing parameters of a single miner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinerProfile {
    pub hashrate_th: Decimal,
    pub efficiency_w_per_th: Decimal,
    pub kwh_price_usd: Decimal,
    /// Flat service fee charged per day.
    pub service_fee_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaintenanceCost {
    pub days: u32,
    pub energy_kwh: Decimal,
    pub electricity_usd: Decimal,
    pub service_fee_usd: Decimal,
    /// Undiscounted total; this is the engine's `base_cost_usd`.
    pub total_usd: Decimal,
}

/// Undiscounted maintenance for `days` of operation.
///
/// energy_kwh = efficiency * hashrate * 24 * days / 1000
/// total_usd  = energy_kwh * kwh_price + service_fee * days
pub fn maintenance_cost(profile: &MinerProfile, days: u32) -> Result<MaintenanceCost> {
    if days == 0 {
        return Err(DiscountError::ZeroDays);
    }
    for (field, value) in [
        ("hashrate_th", profile.hashrate_th),
        ("efficiency_w_per_th", profile.efficiency_w_per_th),
        ("kwh_price_usd", profile.kwh_price_usd),
        ("service_fee_usd", profile.service_fee_usd),
    ] {
        if value < Decimal::ZERO {
            return Err(DiscountError::Negative { field });
        }
    }

    let days_dec = Decimal::from(days);
    let hours = Decimal::from(HOURS_PER_DAY)
        .checked_mul(days_dec)
        .ok_or(DiscountError::Overflow("hours"))?;

    let energy_kwh = profile
        .efficiency_w_per_th
        .checked_mul(profile.hashrate_th)
        .and_then(|watts| watts.checked_mul(hours))
        .and_then(|wh| wh.checked_div(Decimal::from(WATTS_PER_KILOWATT)))
        .ok_or(DiscountError::Overflow("energy"))?;

    let electricity_usd = energy_kwh
        .checked_mul(profile.kwh_price_usd)
        .ok_or(DiscountError::Overflow("electricity cost"))?;

    let service_fee_usd = profile
        .service_fee_usd
        .checked_mul(days_dec)
        .ok_or(DiscountError::Overflow("service fee"))?;

    let total_usd = electricity_usd
        .checked_add(service_fee_usd)
        .ok_or(DiscountError::Overflow("maintenance total"))?;

    Ok(MaintenanceCost {
        days,
        energy_kwh,
        electricity_usd,
        service_fee_usd,
        total_usd,
    })
}
