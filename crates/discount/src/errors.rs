use thiserror::Error;

use crate::currency::Currency;

pub type Result<T> = std::result::Result<T, DiscountError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscountError {
    // Input errors
    #[error("{field} must not be negative")]
    Negative { field: &'static str },
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error("{field} is {value}%, allowed range is 0..={max}%")]
    PercentOutOfRange {
        field: &'static str,
        value: u8,
        max: u8,
    },
    #[error("Unknown currency \"{0}\" (expected TYT, USDT or BTC)")]
    UnknownCurrency(String),
    #[error("Maintenance period must be at least one day")]
    ZeroDays,

    // Rate errors
    #[error("No exchange rate supplied for {0}")]
    MissingRate(Currency),
    #[error("Exchange rate for {0} must be greater than zero")]
    InvalidRate(Currency),

    // Configuration errors
    #[error("Invalid discount policy: {0}")]
    InvalidPolicy(String),

    // Arithmetic / feed errors
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),
    #[error("Price feed: {0}")]
    Feed(String),
}
