use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use tyt_discount::bonus::next_reset;
use tyt_discount::{Currency, HoldingsTier, VipTier};

use crate::app::{self, App, Screen};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // title bar
            Constraint::Min(10),   // main content
            Constraint::Length(3),  // action bar
            Constraint::Length(6), // message log
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);

    match app.screen {
        Screen::Dashboard => draw_dashboard(frame, app, chunks[1]),
        Screen::Form => draw_form(frame, app, chunks[1]),
        Screen::Tiers => draw_tiers(frame, app, chunks[1]),
    }

    draw_action_bar(frame, app, chunks[2]);
    draw_message_log(frame, app, chunks[3]);
}

fn draw_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let refresh_str = app
        .last_refresh
        .map(|t| format!("{}s ago", t.elapsed().as_secs()))
        .unwrap_or_else(|| "never".into());
    let source = if app.prices.url.is_some() { "feed" } else { "manual" };

    let title = format!(
        " TYT Maintenance | TYT {} | BTC {} ({}) | Last refresh: {} ",
        app::format_rate(app.rates.usd_per_tyt),
        app::format_rate(app.rates.usd_per_btc),
        source,
        refresh_str,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, area);
}

fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // inputs panel
            Constraint::Min(7),    // options panel
        ])
        .split(area);

    draw_inputs_panel(frame, app, chunks[0]);
    draw_options_panel(frame, app, chunks[1]);
}

fn draw_inputs_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Inputs ")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let inputs = &app.inputs;
    let bonus_span = if inputs.daily_bonus_active {
        Span::styled(
            bonus_label(app.policy.daily_bonus_percent, app.last_claimed_at),
            Style::default().fg(Color::Green),
        )
    } else {
        Span::styled("not claimed", Style::default().fg(Color::DarkGray))
    };

    let payable = app
        .selected_option()
        .map(|o| format!("  {}", app::format_amount(o.payable_amount, o.currency)))
        .unwrap_or_default();

    let lines = vec![
        Line::from(vec![
            Span::styled("  Base Cost: ", Style::default().fg(Color::Gray)),
            Span::styled(
                app::format_usd(inputs.base_cost_usd),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("  VIP: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{}%", inputs.vip_discount_percent)),
            Span::raw("    "),
            Span::styled("Holdings: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{}% (TYT only)", inputs.holdings_discount_percent)),
        ]),
        Line::from(vec![
            Span::styled("  Daily Bonus: ", Style::default().fg(Color::Gray)),
            bonus_span,
        ]),
        Line::from(vec![
            Span::styled("  Paying in: ", Style::default().fg(Color::Gray)),
            Span::styled(
                inputs.payment_currency.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(payable, Style::default().fg(Color::Yellow)),
        ]),
    ];

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

/// The reset time comes from the claim itself, the same instant the gate uses.
fn bonus_label(percent: u8, last_claimed_at: Option<DateTime<Utc>>) -> String {
    match last_claimed_at {
        Some(claimed) => format!(
            "active (-{}%, resets {})",
            percent,
            next_reset(claimed).format("%Y-%m-%d %H:%M UTC")
        ),
        None => format!("active (-{}%)", percent),
    }
}

fn draw_options_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Payment Options ")
        .border_style(Style::default().fg(Color::Magenta));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let options = match &app.options {
        Some(o) => o,
        None => {
            let reason = app.last_error.as_deref().unwrap_or("No quote yet");
            let text = Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("  {}", reason),
                    Style::default().fg(Color::Red),
                )),
                Line::from(""),
                Line::from("  Press [e] to edit inputs or [r] to refresh rates."),
            ])
            .wrap(Wrap { trim: false });
            frame.render_widget(text, inner);
            return;
        }
    };

    let header = Row::new(vec!["", "Currency", "Discount", "Pay", "Cost (USD)", "Saved", "Burn"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(0);

    let selected = app.selected_index();
    let rows: Vec<Row> = options
        .iter()
        .enumerate()
        .map(|(i, o)| {
            let marker = if i == selected { ">" } else { " " };
            let style = if i == selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let burn = o
                .burn_amount
                .map(|b| app::format_amount(b, Currency::Tyt))
                .unwrap_or_else(|| "-".into());
            Row::new(vec![
                Cell::from(marker.to_string()),
                Cell::from(o.currency.to_string()),
                Cell::from(format!("{}%", o.total_discount_percent)),
                Cell::from(app::format_amount(o.payable_amount, o.currency)),
                Cell::from(app::format_usd(o.final_cost_usd)),
                Cell::from(app::format_usd(o.savings_usd)).style(Style::default().fg(Color::Green)),
                Cell::from(burn).style(Style::default().fg(Color::Red)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(2),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Min(18),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Min(14),
    ];

    let table = Table::new(rows, widths).header(header);
    frame.render_widget(table, inner);
}

fn draw_tiers(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let highlight = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    // VIP (spend)
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" VIP Tiers (cumulative spend) ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);

    let rows: Vec<Row> = VipTier::ALL
        .iter()
        .map(|t| {
            let active = t.maintenance_discount_percent() == app.inputs.vip_discount_percent;
            Row::new(vec![
                t.name().to_string(),
                format!("${}", t.min_spent_usd()),
                format!("{}%", t.maintenance_discount_percent()),
            ])
            .style(if active { highlight } else { Style::default() })
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Length(10), Constraint::Length(10), Constraint::Length(9)],
    )
    .header(Row::new(vec!["Tier", "Spend", "Discount"]).style(header_style));
    frame.render_widget(table, inner);

    // Holdings (coverage)
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Holdings Tiers (days covered) ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    let rows: Vec<Row> = HoldingsTier::ALL
        .iter()
        .map(|t| {
            let active = t.discount_percent() == app.inputs.holdings_discount_percent;
            Row::new(vec![
                t.name().to_string(),
                format!("{}d", t.coverage_days()),
                format!("{}%", t.discount_percent()),
            ])
            .style(if active { highlight } else { Style::default() })
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Length(10), Constraint::Length(8), Constraint::Length(9)],
    )
    .header(Row::new(vec!["Tier", "Covers", "Discount"]).style(header_style));
    frame.render_widget(table, inner);
}

fn draw_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Edit Inputs ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            "  Leave a price empty to mark it unavailable.",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
    ];

    for (i, (label, value)) in app.form_fields.iter().enumerate() {
        let is_active = i == app.input_field;
        let label_style = if is_active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let shown = if is_active {
            format!("{}_", app.input_buf)
        } else {
            value.clone()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<24}", label), label_style),
            Span::styled(shown, Style::default().fg(Color::White)),
        ]));
    }

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn draw_action_bar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Actions ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = match app.screen {
        Screen::Dashboard => Line::from(vec![
            action_key("[1-3]"), action_label("Currency  "),
            action_key("[e]"), action_label("dit  "),
            action_key("[b]"), action_label("onus  "),
            action_key("[t]"), action_label("iers  "),
            action_key("[r]"), action_label("efresh  "),
            action_key("[q]"), action_label("uit"),
        ]),
        Screen::Form => Line::from(vec![
            action_key("[Enter]"), action_label("Apply  "),
            action_key("[Tab]"), action_label("Next  "),
            action_key("[Esc]"), action_label("Cancel"),
        ]),
        Screen::Tiers => Line::from(vec![
            action_label("Press any key to go back  "),
            action_key("[q]"), action_label("uit"),
        ]),
    };

    frame.render_widget(Paragraph::new(line), inner);
}

fn action_key(key: &str) -> Span<'_> {
    Span::styled(key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn action_label(label: &str) -> Span<'_> {
    Span::styled(label, Style::default().fg(Color::White))
}

fn draw_message_log(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Log ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = app
        .message_log
        .iter()
        .map(|m| Line::from(format!(" > {}", m)))
        .collect();

    // Count how many visual rows the wrapped text will occupy.
    let width = inner.width as usize;
    let total_rows: usize = lines
        .iter()
        .map(|line| {
            let len = line.width();
            if width == 0 { 1 } else { 1_usize.max(len.div_ceil(width)) }
        })
        .sum();

    let visible = inner.height;
    let scroll = (total_rows as u16).saturating_sub(visible);

    let para = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(para, inner);
}
