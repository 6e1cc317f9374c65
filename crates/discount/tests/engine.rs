use rust_decimal::Decimal;

use tyt_discount::bonus::daily_bonus_active;
use tyt_discount::cost::{maintenance_cost, MinerProfile};
use tyt_discount::{
    compute_options, quote, Currency, DiscountError, DiscountInputs, DiscountPolicy,
    ExchangeRates, HoldingsTier, VipTier,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn rates() -> ExchangeRates {
    ExchangeRates::new(dec("0.05"), dec("95000"))
}

fn diamond_with_bonus() -> DiscountInputs {
    DiscountInputs {
        base_cost_usd: dec("100"),
        payment_currency: Currency::Tyt,
        vip_discount_percent: 18,
        holdings_discount_percent: 0,
        daily_bonus_active: true,
    }
}

// ---------------------------------------------------------------------------
// Reference scenario
// ---------------------------------------------------------------------------

#[test]
fn test_reference_scenario_tyt() {
    let [tyt, _, _] = compute_options(&diamond_with_bonus(), &rates()).unwrap();
    assert_eq!(tyt.currency, Currency::Tyt);
    assert_eq!(tyt.total_discount_percent, 41);
    assert_eq!(tyt.final_cost_usd, dec("59"));
    assert_eq!(tyt.payable_amount, dec("1180"));
    assert_eq!(tyt.savings_usd, dec("41"));
    assert_eq!(tyt.burn_amount, Some(dec("590")));
}

#[test]
fn test_reference_scenario_usdt() {
    let [_, usdt, _] = compute_options(&diamond_with_bonus(), &rates()).unwrap();
    assert_eq!(usdt.currency, Currency::Usdt);
    assert_eq!(usdt.total_discount_percent, 21);
    assert_eq!(usdt.final_cost_usd, dec("79"));
    assert_eq!(usdt.payable_amount, dec("79"));
    assert_eq!(usdt.savings_usd, dec("21"));
    assert_eq!(usdt.burn_amount, None);
}

#[test]
fn test_reference_scenario_btc() {
    let [_, _, btc] = compute_options(&diamond_with_bonus(), &rates()).unwrap();
    assert_eq!(btc.currency, Currency::Btc);
    assert_eq!(btc.total_discount_percent, 21);
    assert_eq!(btc.final_cost_usd, dec("79"));
    assert_eq!(btc.payable_amount.round_dp(8), dec("0.00083158"));
    assert_eq!(btc.burn_amount, None);
}

#[test]
fn test_cap_boundary() {
    let inputs = DiscountInputs {
        holdings_discount_percent: 20,
        ..diamond_with_bonus()
    };
    let [tyt, usdt, _] = compute_options(&inputs, &rates()).unwrap();
    assert_eq!(tyt.total_discount_percent, 50);
    assert_eq!(tyt.final_cost_usd, dec("50"));
    assert_eq!(tyt.payable_amount, dec("1000"));
    assert_eq!(usdt.total_discount_percent, 21);
}

// ---------------------------------------------------------------------------
// Properties over the whole input range
// ---------------------------------------------------------------------------

#[test]
fn test_invariants_hold_for_all_tier_combinations() {
    let policy = DiscountPolicy::default();

    for usd_per_tyt in ["0.05", "0.03", "0.0123", "0.33", "3"] {
        let rates = ExchangeRates::new(dec(usd_per_tyt), dec("95000"));
        for vip in 0..=20u8 {
            for holdings in [0u8, 2, 5, 9, 13, 18, 20, 60] {
                for bonus in [false, true] {
                    let inputs = DiscountInputs {
                        base_cost_usd: dec("37.25"),
                        payment_currency: Currency::Tyt,
                        vip_discount_percent: vip,
                        holdings_discount_percent: holdings,
                        daily_bonus_active: bonus,
                    };
                    let options = policy.compute_options(&inputs, &rates).unwrap();

                    let order: Vec<Currency> = options.iter().map(|o| o.currency).collect();
                    assert_eq!(order, Currency::ALL.to_vec());

                    for option in &options {
                        assert!(option.total_discount_percent <= 50);
                        assert!(option.final_cost_usd >= Decimal::ZERO);
                        assert!(option.final_cost_usd <= inputs.base_cost_usd);
                        assert!(option.payable_amount >= Decimal::ZERO);
                        assert!(option.savings_usd >= Decimal::ZERO);
                        assert_eq!(option.savings_usd + option.final_cost_usd, inputs.base_cost_usd);
                        assert_eq!(option.burn_amount.is_some(), option.currency == Currency::Tyt);
                        if let Some(burn) = option.burn_amount {
                            assert_eq!(burn * Decimal::TWO, option.payable_amount);
                        }
                    }

                    let [tyt, usdt, btc] = &options;
                    assert!(tyt.total_discount_percent >= usdt.total_discount_percent);
                    assert_eq!(usdt.total_discount_percent, btc.total_discount_percent);
                }
            }
        }
    }
}

#[test]
fn test_idempotent() {
    let inputs = DiscountInputs {
        base_cost_usd: dec("12.345678"),
        holdings_discount_percent: 9,
        ..diamond_with_bonus()
    };
    let first = compute_options(&inputs, &rates()).unwrap();
    let second = compute_options(&inputs, &rates()).unwrap();
    assert_eq!(first, second);
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.payable_amount.serialize(), b.payable_amount.serialize());
    }
}

#[test]
fn test_quote_matches_compute_options() {
    let options = compute_options(&diamond_with_bonus(), &rates()).unwrap();
    for option in &options {
        let inputs = DiscountInputs {
            payment_currency: option.currency,
            ..diamond_with_bonus()
        };
        assert_eq!(&quote(&inputs, &rates()).unwrap(), option);
    }
}

// ---------------------------------------------------------------------------
// Failure modes
// ---------------------------------------------------------------------------

#[test]
fn test_missing_rate_fails_whole_call() {
    let partial = ExchangeRates {
        usd_per_tyt: Some(dec("0.05")),
        usd_per_btc: None,
    };
    assert_eq!(
        compute_options(&diamond_with_bonus(), &partial).unwrap_err(),
        DiscountError::MissingRate(Currency::Btc)
    );
}

#[test]
fn test_negative_rate_rejected() {
    let bad = ExchangeRates::new(dec("-0.05"), dec("95000"));
    assert_eq!(
        compute_options(&diamond_with_bonus(), &bad).unwrap_err(),
        DiscountError::InvalidRate(Currency::Tyt)
    );
}

#[test]
fn test_unknown_currency_rejected() {
    assert!(matches!(
        "DOGE".parse::<Currency>(),
        Err(DiscountError::UnknownCurrency(_))
    ));
}

// ---------------------------------------------------------------------------
// Assembling inputs from account state
// ---------------------------------------------------------------------------

#[test]
fn test_inputs_from_account_state() {
    use chrono::TimeZone;

    let miner = MinerProfile {
        hashrate_th: dec("50"),
        efficiency_w_per_th: dec("20"),
        kwh_price_usd: dec("0.06"),
        service_fee_usd: dec("0.56"),
    };
    // 1000 W -> 24 kWh -> $1.44 + $0.56
    let daily = maintenance_cost(&miner, 1).unwrap();
    assert_eq!(daily.total_usd, dec("2"));

    let vip = VipTier::from_total_spent(dec("16000")).unwrap();
    assert_eq!(vip, VipTier::Platinum);

    // 4000 TYT at $0.05 = $200 -> 100 days of coverage
    let holdings_usd = dec("4000") * dec("0.05");
    let holdings = HoldingsTier::from_coverage(holdings_usd, daily.total_usd).unwrap();
    assert_eq!(holdings, Some(HoldingsTier::Silver));

    let now = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap();
    let claimed = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 7, 30, 0).unwrap();
    let bonus = daily_bonus_active(Some(claimed), now);

    let inputs = DiscountInputs::from_tiers(daily.total_usd, Currency::Tyt, vip, holdings, bonus);
    let result = quote(&inputs, &rates()).unwrap();

    // 20 + 5 + 13 + 3 = 41
    assert_eq!(result.total_discount_percent, 41);
    assert_eq!(result.final_cost_usd, dec("1.18"));
    assert_eq!(result.payable_amount, dec("23.6"));
    assert_eq!(result.burn_amount, Some(dec("11.8")));
}
