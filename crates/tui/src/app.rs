use std::io;
use std::time::Instant;

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use rust_decimal::Decimal;

use tyt_discount::bonus::daily_bonus_active;
use tyt_discount::feed::parse_simple_price;
use tyt_discount::tiers::MAX_VIP_DISCOUNT_PERCENT;
use tyt_discount::{Currency, DiscountInputs, DiscountPolicy, DiscountResult, ExchangeRates};

use crate::ui;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Form,
    Tiers,
}

/// Where exchange rates come from. Explicit prices win over the feed.
#[derive(Clone, Default)]
pub struct PriceSource {
    pub url: Option<String>,
    pub tyt_id: Option<String>,
    pub btc_id: String,
    pub usd_per_tyt: Option<Decimal>,
    pub usd_per_btc: Option<Decimal>,
}

impl PriceSource {
    /// Resolve both rates. A rate the feed cannot supply is left empty so the
    /// engine reports it as missing rather than pricing against a stale value.
    pub fn resolve(&self, log: &mut dyn FnMut(String)) -> ExchangeRates {
        let mut rates = ExchangeRates {
            usd_per_tyt: self.usd_per_tyt,
            usd_per_btc: self.usd_per_btc,
        };
        let Some(url) = self.url.as_deref() else {
            return rates;
        };
        if rates.usd_per_tyt.is_some() && rates.usd_per_btc.is_some() {
            return rates;
        }

        let body = match fetch_body(url) {
            Ok(body) => body,
            Err(e) => {
                log(e);
                return rates;
            }
        };

        if rates.usd_per_btc.is_none() {
            match parse_simple_price(&body, &self.btc_id) {
                Ok(p) => rates.usd_per_btc = Some(p),
                Err(e) => log(format!("BTC price unavailable: {e}")),
            }
        }
        if rates.usd_per_tyt.is_none() {
            match self.tyt_id.as_deref() {
                Some(id) => match parse_simple_price(&body, id) {
                    Ok(p) => rates.usd_per_tyt = Some(p),
                    Err(e) => log(format!("TYT price unavailable: {e}")),
                },
                None => log("No TYT feed id configured; pass --tyt-price or --tyt-id".into()),
            }
        }
        rates
    }
}

fn fetch_body(url: &str) -> Result<String, String> {
    ureq::get(url)
        .call()
        .map_err(|e| format!("Failed to fetch prices: {e}"))?
        .into_body()
        .read_to_string()
        .map_err(|e| format!("Failed to read price response: {e}"))
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    pub should_quit: bool,
    pub screen: Screen,
    pub message_log: Vec<String>,
    pub verbose: bool,

    pub policy: DiscountPolicy,
    pub prices: PriceSource,
    pub rates: ExchangeRates,
    pub inputs: DiscountInputs,
    pub last_claimed_at: Option<DateTime<Utc>>,

    // Engine output for the current inputs (None if the last computation failed)
    pub options: Option<[DiscountResult; 3]>,
    pub last_error: Option<String>,

    // Refresh tracking
    pub last_refresh: Option<Instant>,

    // Form state
    pub form_fields: Vec<(String, String)>,
    pub input_field: usize,
    pub input_buf: String,
}

impl App {
    pub fn new(
        policy: DiscountPolicy,
        prices: PriceSource,
        inputs: DiscountInputs,
        verbose: bool,
    ) -> Self {
        let mut app = Self {
            should_quit: false,
            screen: Screen::Dashboard,
            message_log: Vec::new(),
            verbose,
            policy,
            prices,
            rates: ExchangeRates::default(),
            inputs,
            last_claimed_at: None,
            options: None,
            last_error: None,
            last_refresh: None,
            form_fields: Vec::new(),
            input_field: 0,
            input_buf: String::new(),
        };
        app.push_log("Welcome to the TYT maintenance quote tool");
        app.push_log(format!(
            "Policy: TYT +{}%, daily +{}%, cap {}%, burn {}",
            app.policy.tyt_base_percent,
            app.policy.daily_bonus_percent,
            app.policy.max_total_percent,
            app.policy.burn_fraction
        ));
        app.refresh();
        app
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.verbose {
            eprintln!("[INFO] {}", msg);
        }
        self.message_log.push(msg);
        if self.message_log.len() > 100 {
            self.message_log.remove(0);
        }
    }

    pub fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| ui::draw(frame, self))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    self.should_quit = true;
                    continue;
                }
                match self.screen {
                    Screen::Dashboard => self.handle_dashboard(key.code),
                    Screen::Form => self.handle_form(key.code),
                    Screen::Tiers => self.handle_tiers(key.code),
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Dashboard handler
    // -----------------------------------------------------------------------

    fn handle_dashboard(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('e') => self.enter_edit(),
            KeyCode::Char('t') => self.screen = Screen::Tiers,
            KeyCode::Char('b') => self.toggle_daily_bonus(Utc::now()),
            KeyCode::Char('1') => self.select_currency(Currency::Tyt),
            KeyCode::Char('2') => self.select_currency(Currency::Usdt),
            KeyCode::Char('3') => self.select_currency(Currency::Btc),
            KeyCode::Left | KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Right | KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            _ => {}
        }
    }

    fn handle_tiers(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            _ => self.screen = Screen::Dashboard,
        }
    }

    pub fn selected_index(&self) -> usize {
        Currency::ALL
            .iter()
            .position(|c| *c == self.inputs.payment_currency)
            .unwrap_or(0)
    }

    pub fn selected_option(&self) -> Option<&DiscountResult> {
        self.options.as_ref().map(|o| &o[self.selected_index()])
    }

    fn move_selection(&mut self, delta: isize) {
        let len = Currency::ALL.len() as isize;
        let idx = (self.selected_index() as isize + delta).rem_euclid(len) as usize;
        self.select_currency(Currency::ALL[idx]);
    }

    pub fn select_currency(&mut self, currency: Currency) {
        if self.inputs.payment_currency != currency {
            self.inputs.payment_currency = currency;
            self.push_log(format!("Paying in {}", currency));
        }
    }

    /// Pressing the service button claims today's bonus; pressing again
    /// clears the local claim.
    pub fn toggle_daily_bonus(&mut self, now: DateTime<Utc>) {
        if daily_bonus_active(self.last_claimed_at, now) {
            self.last_claimed_at = None;
            self.push_log("Daily bonus cleared");
        } else {
            self.last_claimed_at = Some(now);
            self.push_log(format!(
                "Daily bonus claimed (-{}% until {})",
                self.policy.daily_bonus_percent,
                tyt_discount::bonus::next_reset(now).format("%Y-%m-%d %H:%M UTC")
            ));
        }
        self.inputs.daily_bonus_active = daily_bonus_active(self.last_claimed_at, now);
        self.recompute();
    }

    // -----------------------------------------------------------------------
    // Form handler
    // -----------------------------------------------------------------------

    fn handle_form(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.screen = Screen::Dashboard;
                self.form_fields.clear();
            }
            KeyCode::Tab | KeyCode::Down => {
                if !self.form_fields.is_empty() {
                    self.form_fields[self.input_field].1 = self.input_buf.clone();
                    self.input_field = (self.input_field + 1) % self.form_fields.len();
                    self.input_buf = self.form_fields[self.input_field].1.clone();
                }
            }
            KeyCode::BackTab | KeyCode::Up => {
                if !self.form_fields.is_empty() {
                    self.form_fields[self.input_field].1 = self.input_buf.clone();
                    let len = self.form_fields.len();
                    self.input_field = (self.input_field + len - 1) % len;
                    self.input_buf = self.form_fields[self.input_field].1.clone();
                }
            }
            KeyCode::Enter => {
                if !self.form_fields.is_empty() {
                    self.form_fields[self.input_field].1 = self.input_buf.clone();
                }
                self.submit_form();
            }
            KeyCode::Backspace => {
                self.input_buf.pop();
            }
            KeyCode::Char(c) => {
                self.input_buf.push(c);
            }
            _ => {}
        }
    }

    pub fn enter_edit(&mut self) {
        self.screen = Screen::Form;
        let opt = |d: Option<Decimal>| d.map(|v| v.to_string()).unwrap_or_default();
        self.form_fields = vec![
            ("Base Cost (USD)".into(), self.inputs.base_cost_usd.to_string()),
            ("VIP Discount (%)".into(), self.inputs.vip_discount_percent.to_string()),
            (
                "Holdings Discount (%)".into(),
                self.inputs.holdings_discount_percent.to_string(),
            ),
            ("TYT Price (USD)".into(), opt(self.rates.usd_per_tyt)),
            ("BTC Price (USD)".into(), opt(self.rates.usd_per_btc)),
        ];
        self.input_field = 0;
        self.input_buf = self.form_fields[0].1.clone();
    }

    fn field(&self, idx: usize) -> &str {
        self.form_fields
            .get(idx)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn submit_form(&mut self) {
        let base = match parse_usd(self.field(0)) {
            Some(v) => v,
            None => {
                self.push_log(format!("Invalid base cost: \"{}\"", self.field(0)));
                return;
            }
        };
        let vip = match parse_percent(self.field(1), MAX_VIP_DISCOUNT_PERCENT) {
            Some(v) => v,
            None => {
                self.push_log(format!(
                    "VIP discount must be a whole number between 0 and {}",
                    MAX_VIP_DISCOUNT_PERCENT
                ));
                return;
            }
        };
        let holdings = match parse_percent(self.field(2), 100) {
            Some(v) => v,
            None => {
                self.push_log("Holdings discount must be a whole number between 0 and 100");
                return;
            }
        };
        let tyt_price = match parse_optional_price(self.field(3)) {
            Ok(v) => v,
            Err(()) => {
                self.push_log(format!("Invalid TYT price: \"{}\"", self.field(3)));
                return;
            }
        };
        let btc_price = match parse_optional_price(self.field(4)) {
            Ok(v) => v,
            Err(()) => {
                self.push_log(format!("Invalid BTC price: \"{}\"", self.field(4)));
                return;
            }
        };

        self.inputs.base_cost_usd = base;
        self.inputs.vip_discount_percent = vip;
        self.inputs.holdings_discount_percent = holdings;
        // Manually entered prices pin the rate for later refreshes.
        self.prices.usd_per_tyt = tyt_price;
        self.prices.usd_per_btc = btc_price;
        self.rates = ExchangeRates {
            usd_per_tyt: tyt_price,
            usd_per_btc: btc_price,
        };

        self.form_fields.clear();
        self.screen = Screen::Dashboard;
        self.push_log("Inputs updated");
        self.recompute();
    }

    // -----------------------------------------------------------------------
    // Engine
    // -----------------------------------------------------------------------

    pub fn refresh(&mut self) {
        self.refresh_at(Utc::now());
    }

    /// Re-resolve rates and re-check the daily bonus against `now`, so a
    /// claim from before UTC midnight stops applying.
    pub fn refresh_at(&mut self, now: DateTime<Utc>) {
        let mut lines = Vec::new();
        let rates = self.prices.resolve(&mut |msg| lines.push(msg));
        for line in lines {
            self.push_log(line);
        }
        self.rates = rates;
        self.last_refresh = Some(Instant::now());
        let bonus = daily_bonus_active(self.last_claimed_at, now);
        if self.inputs.daily_bonus_active && !bonus && self.last_claimed_at.is_some() {
            self.push_log("Daily bonus expired");
        }
        self.inputs.daily_bonus_active = bonus;
        self.push_log(format!(
            "Rates: TYT {} | BTC {}",
            format_rate(self.rates.usd_per_tyt),
            format_rate(self.rates.usd_per_btc)
        ));
        self.recompute();
    }

    pub fn recompute(&mut self) {
        match self.policy.compute_options(&self.inputs, &self.rates) {
            Ok(options) => {
                self.options = Some(options);
                self.last_error = None;
            }
            Err(e) => {
                self.options = None;
                let msg = e.to_string();
                if self.last_error.as_deref() != Some(msg.as_str()) {
                    self.push_log(format!("Quote unavailable: {}", msg));
                }
                self.last_error = Some(msg);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a non-negative USD amount (e.g. "12.50" or "$12.50").
pub fn parse_usd(s: &str) -> Option<Decimal> {
    let trimmed = s.trim().trim_start_matches('$').replace(',', "");
    let value: Decimal = trimmed.parse().ok()?;
    if value < Decimal::ZERO {
        return None;
    }
    Some(value)
}

pub fn parse_percent(s: &str, max: u8) -> Option<u8> {
    let value: u8 = s.trim().trim_end_matches('%').trim().parse().ok()?;
    (value <= max).then_some(value)
}

/// Empty means "no price"; anything else must be a positive amount.
fn parse_optional_price(s: &str) -> Result<Option<Decimal>, ()> {
    if s.trim().is_empty() {
        return Ok(None);
    }
    match parse_usd(s) {
        Some(v) if v > Decimal::ZERO => Ok(Some(v)),
        _ => Err(()),
    }
}

pub fn format_usd(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

pub fn format_rate(rate: Option<Decimal>) -> String {
    match rate {
        Some(r) => format!("${}", r.normalize()),
        None => "n/a".to_string(),
    }
}

/// Display precision per settlement asset.
pub fn format_amount(amount: Decimal, currency: Currency) -> String {
    let dp = match currency {
        Currency::Tyt | Currency::Usdt => 2,
        Currency::Btc => 8,
    };
    format!("{:.*} {}", dp as usize, amount.round_dp(dp), currency)
}
