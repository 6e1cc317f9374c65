use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{DiscountError, Result};

/// Settlement asset for a maintenance payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Tyt,
    Usdt,
    Btc,
}

impl Currency {
    /// Order in which payment options are always reported.
    pub const ALL: [Currency; 3] = [Currency::Tyt, Currency::Usdt, Currency::Btc];

    pub fn ticker(self) -> &'static str {
        match self {
            Currency::Tyt => "TYT",
            Currency::Usdt => "USDT",
            Currency::Btc => "BTC",
        }
    }

    /// Decimal places a payable amount is settled at (BTC in satoshi).
    pub fn settlement_dp(self) -> u32 {
        match self {
            Currency::Tyt | Currency::Usdt => 18,
            Currency::Btc => 8,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

impl FromStr for Currency {
    type Err = DiscountError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TYT" => Ok(Currency::Tyt),
            "USDT" => Ok(Currency::Usdt),
            "BTC" => Ok(Currency::Btc),
            _ => Err(DiscountError::UnknownCurrency(s.to_string())),
        }
    }
}

/// USD prices supplied by an external price feed. USDT is pegged 1:1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExchangeRates {
    pub usd_per_tyt: Option<Decimal>,
    pub usd_per_btc: Option<Decimal>,
}

impl ExchangeRates {
    pub fn new(usd_per_tyt: Decimal, usd_per_btc: Decimal) -> Self {
        Self {
            usd_per_tyt: Some(usd_per_tyt),
            usd_per_btc: Some(usd_per_btc),
        }
    }

    /// USD value of one unit of `currency`.
    pub fn rate_for(&self, currency: Currency) -> Result<Decimal> {
        let rate = match currency {
            Currency::Usdt => return Ok(Decimal::ONE),
            Currency::Tyt => self.usd_per_tyt,
            Currency::Btc => self.usd_per_btc,
        }
        .ok_or(DiscountError::MissingRate(currency))?;

        if rate <= Decimal::ZERO {
            return Err(DiscountError::InvalidRate(currency));
        }
        Ok(rate)
    }
}

/// Convert a float from an untyped source (JSON, command line) into a decimal.
pub fn decimal_from_f64(field: &'static str, value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(DiscountError::NonFinite { field });
    }
    Decimal::from_f64(value).ok_or(DiscountError::Overflow(field))
}
