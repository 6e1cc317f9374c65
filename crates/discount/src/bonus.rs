use chrono::{DateTime, Days, TimeZone, Utc};

/// Discount granted by the once-a-day service button.
pub const DAILY_BONUS_PERCENT: u8 = 3;

/// The bonus counts for the rest of the UTC day in which it was claimed.
pub fn daily_bonus_active(last_claimed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_claimed_at {
        Some(claimed) if claimed <= now => claimed.date_naive() == now.date_naive(),
        _ => false,
    }
}

/// Next UTC midnight after `now`, when a claimed bonus expires.
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .checked_add_days(Days::new(1))
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .unwrap_or(now)
}
