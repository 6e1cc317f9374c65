//! Maintenance-fee discount engine.
//!
//! Pure, synchronous arithmetic: callers assemble [`DiscountInputs`] from
//! account state they own (VIP tier, TYT holdings, daily-bonus claim) and a
//! price feed, and get back one [`DiscountResult`] per settlement currency.
//! Balances, payments and burn records stay with the caller.

pub mod bonus;
pub mod cost;
pub mod currency;
pub mod engine;
pub mod errors;
pub mod feed;
pub mod policy;
pub mod tiers;

pub use currency::{decimal_from_f64, Currency, ExchangeRates};
pub use engine::{compute_options, quote, DiscountInputs, DiscountResult};
pub use errors::{DiscountError, Result};
pub use policy::DiscountPolicy;
pub use tiers::{HoldingsTier, VipTier};
