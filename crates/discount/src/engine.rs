use rust_decimal::Decimal;
use serde::Serialize;

use crate::currency::{Currency, ExchangeRates};
use crate::errors::{DiscountError, Result};
use crate::policy::DiscountPolicy;
use crate::tiers::{holdings_discount_percent, HoldingsTier, VipTier, MAX_VIP_DISCOUNT_PERCENT};

/// Everything needed to price one maintenance payment. Assembled fresh by the
/// caller for every payment attempt; the engine never reads account state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountInputs {
    /// Undiscounted maintenance cost in USD.
    pub base_cost_usd: Decimal,
    /// Asset the user selected for settlement.
    pub payment_currency: Currency,
    /// From the spend-based VIP table, 0..=20.
    pub vip_discount_percent: u8,
    /// From the TYT holdings table. Only applies to TYT payments.
    pub holdings_discount_percent: u8,
    /// Whether the daily service-button bonus was claimed today.
    pub daily_bonus_active: bool,
}

impl DiscountInputs {
    pub fn from_tiers(
        base_cost_usd: Decimal,
        payment_currency: Currency,
        vip: VipTier,
        holdings: Option<HoldingsTier>,
        daily_bonus_active: bool,
    ) -> Self {
        Self {
            base_cost_usd,
            payment_currency,
            vip_discount_percent: vip.maintenance_discount_percent(),
            holdings_discount_percent: holdings_discount_percent(holdings),
            daily_bonus_active,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_cost_usd < Decimal::ZERO {
            return Err(DiscountError::Negative {
                field: "base_cost_usd",
            });
        }
        if self.vip_discount_percent > MAX_VIP_DISCOUNT_PERCENT {
            return Err(DiscountError::PercentOutOfRange {
                field: "vip_discount_percent",
                value: self.vip_discount_percent,
                max: MAX_VIP_DISCOUNT_PERCENT,
            });
        }
        if self.holdings_discount_percent > 100 {
            return Err(DiscountError::PercentOutOfRange {
                field: "holdings_discount_percent",
                value: self.holdings_discount_percent,
                max: 100,
            });
        }
        Ok(())
    }
}

/// One priced payment option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscountResult {
    pub currency: Currency,
    pub total_discount_percent: u8,
    /// Discounted cost in USD.
    pub final_cost_usd: Decimal,
    /// Discounted cost in units of `currency`.
    pub payable_amount: Decimal,
    pub savings_usd: Decimal,
    /// TYT to burn on settlement. Only present for TYT payments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burn_amount: Option<Decimal>,
}

impl DiscountPolicy {
    /// Combined discount for paying in `currency`, clamped to `max_total_percent`.
    ///
    /// TYT:        tyt_base + holdings + vip + bonus
    /// USDT / BTC: vip + bonus
    pub fn total_discount_percent(&self, currency: Currency, inputs: &DiscountInputs) -> u8 {
        let bonus = if inputs.daily_bonus_active {
            self.daily_bonus_percent as u16
        } else {
            0
        };
        let vip = inputs.vip_discount_percent as u16;
        let raw = match currency {
            Currency::Tyt => {
                self.tyt_base_percent as u16 + inputs.holdings_discount_percent as u16 + vip + bonus
            }
            Currency::Usdt | Currency::Btc => vip + bonus,
        };
        raw.min(self.max_total_percent as u16) as u8
    }

    /// Price the payment in every supported currency, in `Currency::ALL` order.
    ///
    /// Every rate is resolved before any option is priced, so a single
    /// missing rate fails the whole call.
    pub fn compute_options(
        &self,
        inputs: &DiscountInputs,
        rates: &ExchangeRates,
    ) -> Result<[DiscountResult; 3]> {
        self.validate()?;
        inputs.validate()?;

        let [tyt, usdt, btc] = Currency::ALL;
        let tyt_rate = rates.rate_for(tyt)?;
        let usdt_rate = rates.rate_for(usdt)?;
        let btc_rate = rates.rate_for(btc)?;

        Ok([
            self.price_option(tyt, inputs, tyt_rate)?,
            self.price_option(usdt, inputs, usdt_rate)?,
            self.price_option(btc, inputs, btc_rate)?,
        ])
    }

    /// Price only the currency the user selected.
    pub fn quote(&self, inputs: &DiscountInputs, rates: &ExchangeRates) -> Result<DiscountResult> {
        self.validate()?;
        inputs.validate()?;

        let rate = rates.rate_for(inputs.payment_currency)?;
        self.price_option(inputs.payment_currency, inputs, rate)
    }

    /// final_cost_usd = base * (100 - pct) / 100
    /// payable_amount = final_cost_usd / usd_per_unit, at the currency's settlement scale
    /// burn_amount    = payable_amount * burn_fraction (TYT only)
    fn price_option(
        &self,
        currency: Currency,
        inputs: &DiscountInputs,
        usd_per_unit: Decimal,
    ) -> Result<DiscountResult> {
        let pct = self.total_discount_percent(currency, inputs);
        let remaining = Decimal::from(100u8.saturating_sub(pct));

        let final_cost_usd = inputs
            .base_cost_usd
            .checked_mul(remaining)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .ok_or(DiscountError::Overflow("final cost"))?;

        let payable_amount = final_cost_usd
            .checked_div(usd_per_unit)
            .ok_or(DiscountError::Overflow("payable amount"))?
            .round_dp(currency.settlement_dp());

        let savings_usd = inputs
            .base_cost_usd
            .checked_sub(final_cost_usd)
            .ok_or(DiscountError::Overflow("savings"))?;

        let burn_amount = match currency {
            Currency::Tyt => Some(
                payable_amount
                    .checked_mul(self.burn_fraction)
                    .ok_or(DiscountError::Overflow("burn amount"))?,
            ),
            Currency::Usdt | Currency::Btc => None,
        };

        Ok(DiscountResult {
            currency,
            total_discount_percent: pct,
            final_cost_usd,
            payable_amount,
            savings_usd,
            burn_amount,
        })
    }
}

/// `DiscountPolicy::compute_options` with the default policy.
pub fn compute_options(
    inputs: &DiscountInputs,
    rates: &ExchangeRates,
) -> Result<[DiscountResult; 3]> {
    DiscountPolicy::default().compute_options(inputs, rates)
}

/// `DiscountPolicy::quote` with the default policy.
pub fn quote(inputs: &DiscountInputs, rates: &ExchangeRates) -> Result<DiscountResult> {
    DiscountPolicy::default().quote(inputs, rates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn inputs(vip: u8, holdings: u8, bonus: bool) -> DiscountInputs {
        DiscountInputs {
            base_cost_usd: dec("100"),
            payment_currency: Currency::Tyt,
            vip_discount_percent: vip,
            holdings_discount_percent: holdings,
            daily_bonus_active: bonus,
        }
    }

    #[test]
    fn test_tyt_discount_formula() {
        let policy = DiscountPolicy::default();
        assert_eq!(policy.total_discount_percent(Currency::Tyt, &inputs(18, 0, true)), 41);
        assert_eq!(policy.total_discount_percent(Currency::Tyt, &inputs(0, 0, false)), 20);
        assert_eq!(policy.total_discount_percent(Currency::Tyt, &inputs(5, 9, false)), 34);
    }

    #[test]
    fn test_stable_paths_ignore_tyt_bonuses() {
        let policy = DiscountPolicy::default();
        let i = inputs(18, 18, true);
        assert_eq!(policy.total_discount_percent(Currency::Usdt, &i), 21);
        assert_eq!(policy.total_discount_percent(Currency::Btc, &i), 21);
    }

    #[test]
    fn test_clamped_to_cap() {
        let policy = DiscountPolicy::default();
        // 20 + 20 + 18 + 3 = 61
        assert_eq!(policy.total_discount_percent(Currency::Tyt, &inputs(18, 20, true)), 50);
    }

    #[test]
    fn test_custom_cap() {
        let policy = DiscountPolicy {
            max_total_percent: 20,
            ..DiscountPolicy::default()
        };
        assert_eq!(policy.total_discount_percent(Currency::Tyt, &inputs(18, 0, true)), 20);
        assert_eq!(policy.total_discount_percent(Currency::Usdt, &inputs(2, 0, false)), 2);
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut i = inputs(0, 0, false);
        i.base_cost_usd = dec("-0.01");
        let rates = ExchangeRates::new(dec("0.05"), dec("95000"));
        assert_eq!(
            compute_options(&i, &rates).unwrap_err(),
            DiscountError::Negative {
                field: "base_cost_usd"
            }
        );
    }

    #[test]
    fn test_vip_out_of_range_rejected() {
        let rates = ExchangeRates::new(dec("0.05"), dec("95000"));
        let err = compute_options(&inputs(21, 0, false), &rates).unwrap_err();
        assert!(matches!(
            err,
            DiscountError::PercentOutOfRange {
                field: "vip_discount_percent",
                value: 21,
                ..
            }
        ));
    }

    #[test]
    fn test_zero_cost() {
        let mut i = inputs(18, 0, true);
        i.base_cost_usd = Decimal::ZERO;
        let rates = ExchangeRates::new(dec("0.05"), dec("95000"));
        for option in compute_options(&i, &rates).unwrap() {
            assert!(option.payable_amount.is_zero());
            assert!(option.savings_usd.is_zero());
        }
    }

    #[test]
    fn test_quote_selected_currency_only_needs_its_rate() {
        let mut i = inputs(18, 0, true);
        i.payment_currency = Currency::Usdt;
        let result = quote(&i, &ExchangeRates::default()).unwrap();
        assert_eq!(result.currency, Currency::Usdt);
        assert_eq!(result.payable_amount, dec("79"));
        assert_eq!(result.burn_amount, None);
    }

    #[test]
    fn test_burn_is_exact_half_at_repeating_rates() {
        for rate in ["0.03", "0.0123", "0.33", "3"] {
            for cost in ["100", "1", "59.99"] {
                let mut i = inputs(18, 0, true);
                i.base_cost_usd = dec(cost);
                let rates = ExchangeRates::new(dec(rate), dec("95000"));
                let [tyt, _, btc] = compute_options(&i, &rates).unwrap();

                let burn = tyt.burn_amount.unwrap();
                assert_eq!(burn * Decimal::TWO, tyt.payable_amount, "rate={rate} cost={cost}");
                assert!(tyt.payable_amount.scale() <= 18);
                assert!(btc.payable_amount.scale() <= 8);
            }
        }
    }

    #[test]
    fn test_payable_settled_at_currency_scale() {
        // 59 / 3 = 19.666...
        let rates = ExchangeRates::new(dec("3"), dec("95000"));
        let [tyt, _, btc] = compute_options(&inputs(18, 0, true), &rates).unwrap();
        assert_eq!(tyt.payable_amount, dec("19.666666666666666667"));
        assert_eq!(tyt.burn_amount, Some(dec("9.8333333333333333335")));
        assert_eq!(btc.payable_amount, dec("0.00083158"));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let policy = DiscountPolicy {
            burn_fraction: dec("2"),
            ..DiscountPolicy::default()
        };
        let rates = ExchangeRates::new(dec("0.05"), dec("95000"));
        assert!(matches!(
            policy.compute_options(&inputs(0, 0, false), &rates),
            Err(DiscountError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let mut i = inputs(0, 0, false);
        i.base_cost_usd = Decimal::MAX;
        let rates = ExchangeRates::new(dec("0.0000001"), dec("95000"));
        assert!(matches!(
            compute_options(&i, &rates),
            Err(DiscountError::Overflow(_))
        ));
    }
}
