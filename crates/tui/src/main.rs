mod app;
mod ui;

use std::io::{self, stdout};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use tyt_discount::bonus::daily_bonus_active;
use tyt_discount::cost::{maintenance_cost, MaintenanceCost, MinerProfile};
use tyt_discount::tiers::holdings_discount_percent;
use tyt_discount::{
    Currency, DiscountInputs, DiscountPolicy, DiscountResult, ExchangeRates, HoldingsTier,
    VipTier,
};

use app::PriceSource;

#[derive(Parser)]
#[command(name = "tyt-tui")]
#[command(about = "Maintenance-fee quotes for TakeYourToken miners")]
struct Cli {
    /// Print progress/debug info to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// JSON file overriding the discount policy (bonus sizes, cap, burn fraction)
    #[arg(long, global = true)]
    policy: Option<String>,

    /// USD price of one TYT (skips the feed for TYT)
    #[arg(long, global = true)]
    tyt_price: Option<Decimal>,

    /// USD price of one BTC (skips the feed for BTC)
    #[arg(long, global = true)]
    btc_price: Option<Decimal>,

    /// Simple-price endpoint returning {"<id>": {"usd": <price>}}
    #[arg(long, global = true)]
    price_url: Option<String>,

    /// Feed id for TYT
    #[arg(long, global = true)]
    tyt_id: Option<String>,

    /// Feed id for BTC
    #[arg(long, global = true, default_value = "bitcoin")]
    btc_id: String,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand)]
enum Action {
    /// Price a maintenance payment in every currency
    Quote {
        /// Undiscounted maintenance cost in USD
        #[arg(long)]
        base_cost: Decimal,
        /// VIP discount percent (0-20)
        #[arg(long, conflicts_with_all = ["vip_tier", "total_spent"])]
        vip: Option<u8>,
        /// VIP tier name (bronze, silver, gold, platinum, diamond)
        #[arg(long, conflicts_with = "total_spent")]
        vip_tier: Option<VipTier>,
        /// Lifetime platform spend in USD, mapped to a VIP tier
        #[arg(long)]
        total_spent: Option<Decimal>,
        /// Holdings discount percent (TYT payments only)
        #[arg(long, conflicts_with = "tyt_balance")]
        holdings: Option<u8>,
        /// TYT balance, mapped to a holdings tier by days of cost covered
        #[arg(long)]
        tyt_balance: Option<Decimal>,
        /// Treat the daily service-button bonus as claimed
        #[arg(long, conflicts_with = "last_claimed")]
        daily_bonus: bool,
        /// When the daily bonus was last claimed (RFC 3339)
        #[arg(long)]
        last_claimed: Option<DateTime<Utc>>,
        /// Payment currency (tyt, usdt, btc)
        #[arg(long, default_value = "tyt")]
        currency: Currency,
    },
    /// Undiscounted maintenance cost for a miner
    Cost {
        /// Hashrate in TH/s
        #[arg(long)]
        hashrate: Decimal,
        /// Power efficiency in W/TH
        #[arg(long)]
        efficiency: Decimal,
        /// Electricity price in USD per kWh
        #[arg(long)]
        kwh_price: Decimal,
        /// Flat service fee in USD per day
        #[arg(long, default_value = "0")]
        service_fee: Decimal,
        /// Number of days to price
        #[arg(long, default_value = "1")]
        days: u32,
    },
    /// Show the VIP and holdings tier tables with the active policy
    Tiers,
}

// ---------------------------------------------------------------------------
// JSON output types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(tag = "type")]
enum CliOutput {
    #[serde(rename = "quote")]
    Quote(QuoteOutput),
    #[serde(rename = "cost")]
    Cost(MaintenanceCost),
    #[serde(rename = "tiers")]
    Tiers(TiersOutput),
    #[serde(rename = "error")]
    Error { action: String, error: String },
}

#[derive(Serialize)]
struct QuoteOutput {
    inputs: DiscountInputs,
    rates: ExchangeRates,
    #[serde(skip_serializing_if = "Option::is_none")]
    vip_tier: Option<VipTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    holdings_tier: Option<HoldingsTier>,
    options: Vec<DiscountResult>,
    selected: DiscountResult,
}

#[derive(Serialize)]
struct TiersOutput {
    vip: Vec<VipRow>,
    holdings: Vec<HoldingsRow>,
    policy: DiscountPolicy,
}

#[derive(Serialize)]
struct VipRow {
    tier: VipTier,
    min_spent_usd: u64,
    discount_percent: u8,
}

#[derive(Serialize)]
struct HoldingsRow {
    tier: HoldingsTier,
    coverage_days: u32,
    discount_percent: u8,
}

/// Quote flags after clap has parsed them.
struct QuoteRequest {
    base_cost: Decimal,
    vip: Option<u8>,
    vip_tier: Option<VipTier>,
    total_spent: Option<Decimal>,
    holdings: Option<u8>,
    tyt_balance: Option<Decimal>,
    daily_bonus: bool,
    last_claimed: Option<DateTime<Utc>>,
    currency: Currency,
}

fn load_policy(path: Option<&str>) -> Result<DiscountPolicy, String> {
    let Some(path) = path else {
        return Ok(DiscountPolicy::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read policy from {}: {}", path, e))?;
    DiscountPolicy::from_json(&json).map_err(|e| format!("{}: {}", path, e))
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let prices = PriceSource {
        url: cli.price_url,
        tyt_id: cli.tyt_id,
        btc_id: cli.btc_id,
        usd_per_tyt: cli.tyt_price,
        usd_per_btc: cli.btc_price,
    };

    let policy = match load_policy(cli.policy.as_deref()) {
        Ok(p) => p,
        Err(error) => {
            let name = cli
                .action
                .as_ref()
                .map(action_to_name)
                .unwrap_or_else(|| "interactive".into());
            print_output(&CliOutput::Error { action: name, error });
            std::process::exit(1);
        }
    };

    match cli.action {
        Some(action) => {
            run_oneshot(policy, prices, cli.verbose, action);
            Ok(())
        }
        None => run_interactive(policy, prices),
    }
}

fn run_interactive(policy: DiscountPolicy, prices: PriceSource) -> io::Result<()> {
    // Panic hook: always restore terminal.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let inputs = DiscountInputs {
        base_cost_usd: Decimal::ZERO,
        payment_currency: Currency::Tyt,
        vip_discount_percent: 0,
        holdings_discount_percent: 0,
        daily_bonus_active: false,
    };
    let mut app = app::App::new(policy, prices, inputs, false);
    app.push_log("Press [e] to enter the maintenance cost and your discounts");
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

fn run_oneshot(policy: DiscountPolicy, prices: PriceSource, verbose: bool, action: Action) {
    let action_name = action_to_name(&action);
    let mut log = |msg: String| {
        if verbose {
            eprintln!("[INFO] {}", msg);
        }
    };

    let result = match action {
        Action::Quote {
            base_cost,
            vip,
            vip_tier,
            total_spent,
            holdings,
            tyt_balance,
            daily_bonus,
            last_claimed,
            currency,
        } => {
            let request = QuoteRequest {
                base_cost,
                vip,
                vip_tier,
                total_spent,
                holdings,
                tyt_balance,
                daily_bonus,
                last_claimed,
                currency,
            };
            let rates = prices.resolve(&mut log);
            build_quote(&policy, &request, rates, Utc::now(), &mut log).map(CliOutput::Quote)
        }
        Action::Cost {
            hashrate,
            efficiency,
            kwh_price,
            service_fee,
            days,
        } => {
            let profile = MinerProfile {
                hashrate_th: hashrate,
                efficiency_w_per_th: efficiency,
                kwh_price_usd: kwh_price,
                service_fee_usd: service_fee,
            };
            maintenance_cost(&profile, days)
                .map(CliOutput::Cost)
                .map_err(|e| e.to_string())
        }
        Action::Tiers => Ok(CliOutput::Tiers(build_tiers_output(&policy))),
    };

    match result {
        Ok(output) => print_output(&output),
        Err(error) => {
            print_output(&CliOutput::Error {
                action: action_name,
                error,
            });
            std::process::exit(1);
        }
    }
}

fn print_output(output: &CliOutput) {
    match serde_json::to_string(output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to encode output: {}", e);
            std::process::exit(1);
        }
    }
}

fn action_to_name(action: &Action) -> String {
    match action {
        Action::Quote { .. } => "quote".into(),
        Action::Cost { .. } => "cost".into(),
        Action::Tiers => "tiers".into(),
    }
}

fn build_quote(
    policy: &DiscountPolicy,
    request: &QuoteRequest,
    rates: ExchangeRates,
    now: DateTime<Utc>,
    log: &mut dyn FnMut(String),
) -> Result<QuoteOutput, String> {
    let vip_tier = match (request.vip_tier, request.total_spent) {
        (Some(tier), _) => Some(tier),
        (None, Some(spent)) => Some(VipTier::from_total_spent(spent).map_err(|e| e.to_string())?),
        (None, None) => None,
    };
    let vip_discount_percent = match vip_tier {
        Some(tier) => {
            log(format!("VIP tier: {}", tier.name()));
            tier.maintenance_discount_percent()
        }
        None => request.vip.unwrap_or(0),
    };

    let holdings_tier = match request.tyt_balance {
        Some(balance) => {
            let usd_per_tyt = rates
                .rate_for(Currency::Tyt)
                .map_err(|e| format!("--tyt-balance needs a TYT price: {}", e))?;
            let holdings_usd = balance
                .checked_mul(usd_per_tyt)
                .ok_or("TYT balance is too large to value")?;
            let tier = HoldingsTier::from_coverage(holdings_usd, request.base_cost)
                .map_err(|e| e.to_string())?;
            log(format!(
                "Holdings worth ${} -> {}",
                holdings_usd.round_dp(2),
                tier.map(|t| t.name()).unwrap_or("no tier")
            ));
            tier
        }
        None => None,
    };
    let holdings_discount_percent = match request.tyt_balance {
        Some(_) => holdings_discount_percent(holdings_tier),
        None => request.holdings.unwrap_or(0),
    };

    let daily_bonus_active = match request.last_claimed {
        Some(claimed) => daily_bonus_active(Some(claimed), now),
        None => request.daily_bonus,
    };

    let inputs = DiscountInputs {
        base_cost_usd: request.base_cost,
        payment_currency: request.currency,
        vip_discount_percent,
        holdings_discount_percent,
        daily_bonus_active,
    };

    let options = policy
        .compute_options(&inputs, &rates)
        .map_err(|e| e.to_string())?;
    let selected = options
        .iter()
        .find(|o| o.currency == request.currency)
        .cloned()
        .ok_or_else(|| format!("No option for {}", request.currency))?;

    log(format!(
        "{}: {}% off, pay {}",
        selected.currency,
        selected.total_discount_percent,
        app::format_amount(selected.payable_amount, selected.currency)
    ));

    Ok(QuoteOutput {
        inputs,
        rates,
        vip_tier,
        holdings_tier,
        options: options.to_vec(),
        selected,
    })
}

fn build_tiers_output(policy: &DiscountPolicy) -> TiersOutput {
    TiersOutput {
        vip: VipTier::ALL
            .iter()
            .map(|&tier| VipRow {
                tier,
                min_spent_usd: tier.min_spent_usd(),
                discount_percent: tier.maintenance_discount_percent(),
            })
            .collect(),
        holdings: HoldingsTier::ALL
            .iter()
            .map(|&tier| HoldingsRow {
                tier,
                coverage_days: tier.coverage_days(),
                discount_percent: tier.discount_percent(),
            })
            .collect(),
        policy: policy.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_exact(s).unwrap()
    }

    fn request() -> QuoteRequest {
        QuoteRequest {
            base_cost: dec("100"),
            vip: None,
            vip_tier: None,
            total_spent: None,
            holdings: None,
            tyt_balance: None,
            daily_bonus: false,
            last_claimed: None,
            currency: Currency::Tyt,
        }
    }

    fn rates() -> ExchangeRates {
        ExchangeRates::new(dec("0.05"), dec("95000"))
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_quote_with_explicit_percents() {
        let req = QuoteRequest {
            vip: Some(18),
            daily_bonus: true,
            ..request()
        };
        let out = build_quote(&DiscountPolicy::default(), &req, rates(), noon(), &mut |_| {}).unwrap();
        assert_eq!(out.options.len(), 3);
        assert_eq!(out.selected.total_discount_percent, 41);
        assert_eq!(out.selected.payable_amount, dec("1180"));
        assert!(out.vip_tier.is_none());
    }

    #[test]
    fn test_quote_from_spend_and_balance() {
        // $20/day cost, 30000 TYT * $0.05 = $1500 -> 75 days -> Bronze holdings (2%)
        let req = QuoteRequest {
            base_cost: dec("20"),
            total_spent: Some(dec("6000")),
            tyt_balance: Some(dec("30000")),
            currency: Currency::Usdt,
            ..request()
        };
        let out = build_quote(&DiscountPolicy::default(), &req, rates(), noon(), &mut |_| {}).unwrap();
        assert_eq!(out.vip_tier, Some(VipTier::Gold));
        assert_eq!(out.holdings_tier, Some(HoldingsTier::Bronze));
        assert_eq!(out.inputs.holdings_discount_percent, 2);
        // USDT ignores holdings: 9% VIP only
        assert_eq!(out.selected.currency, Currency::Usdt);
        assert_eq!(out.selected.total_discount_percent, 9);
        assert_eq!(out.options[0].total_discount_percent, 31);
    }

    #[test]
    fn test_quote_last_claimed_yesterday_is_inactive() {
        let req = QuoteRequest {
            last_claimed: Some(Utc.with_ymd_and_hms(2025, 6, 9, 23, 59, 0).unwrap()),
            ..request()
        };
        let out = build_quote(&DiscountPolicy::default(), &req, rates(), noon(), &mut |_| {}).unwrap();
        assert!(!out.inputs.daily_bonus_active);
        assert_eq!(out.selected.total_discount_percent, 20);
    }

    #[test]
    fn test_quote_balance_without_tyt_price() {
        let req = QuoteRequest {
            tyt_balance: Some(dec("1000")),
            ..request()
        };
        let rates = ExchangeRates {
            usd_per_tyt: None,
            usd_per_btc: Some(dec("95000")),
        };
        let err = build_quote(&DiscountPolicy::default(), &req, rates, noon(), &mut |_| {})
            .err()
            .unwrap();
        assert!(err.contains("TYT"));
    }

    #[test]
    fn test_quote_rejects_out_of_range_vip() {
        let req = QuoteRequest {
            vip: Some(25),
            ..request()
        };
        assert!(build_quote(&DiscountPolicy::default(), &req, rates(), noon(), &mut |_| {}).is_err());
    }

    #[test]
    fn test_tiers_output_lists_every_tier() {
        let out = build_tiers_output(&DiscountPolicy::default());
        assert_eq!(out.vip.len(), 5);
        assert_eq!(out.holdings.len(), 5);
        assert_eq!(out.vip[4].discount_percent, 18);
        assert_eq!(out.holdings[0].coverage_days, 30);
        assert_eq!(out.policy.max_total_percent, 50);
    }

    #[test]
    fn test_error_output_shape() {
        let out = CliOutput::Error {
            action: "quote".into(),
            error: "boom".into(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["action"], "quote");
    }
}
