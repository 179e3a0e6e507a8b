//! Plain-text table formatting for `result.txt`.
//!
//! Provides:
//! - a grid table renderer
//! - per-day sections (trade table plus running totals)
//! - the closing run summary

use crate::domain::report::{DayReport, RunSummary, TradeLine};

pub fn format_pct(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}

fn format_price(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

fn format_opt_pct(value: Option<f64>) -> String {
    value.map(format_pct).unwrap_or_else(|| "-".to_string())
}

/// Renders a grid table with a `=` rule under the header.
pub fn render_grid(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = grid_rule(&widths, '-');
    out.push_str(&grid_line(headers.iter().copied(), &widths));
    out.push_str(&grid_rule(&widths, '='));
    for row in rows {
        out.push_str(&grid_line(row.iter().map(String::as_str), &widths));
        out.push_str(&grid_rule(&widths, '-'));
    }
    out
}

fn grid_rule(widths: &[usize], fill: char) -> String {
    let mut line = String::from("+");
    for w in widths {
        line.extend(std::iter::repeat_n(fill, w + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn grid_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let mut out = String::from("|");
    for (cell, w) in cells.zip(widths) {
        out.push_str(&format!(" {:<width$} |", cell, width = w));
    }
    out.push('\n');
    out
}

fn trade_row(line: &TradeLine, preview: bool) -> Vec<String> {
    let mut row = vec![
        line.symbol.clone(),
        format!("{:.4}", line.proportion),
        format!("{:.4}", line.weight),
        line.side.to_string(),
        format_opt_pct(line.today_change),
        format_price(line.buy_price),
    ];
    if !preview {
        row.push(format_price(line.sell_price));
        row.push(format_opt_pct(line.gain));
    }
    row
}

pub fn render_day(report: &DayReport) -> String {
    let mut out = String::new();
    if report.preview {
        out.push_str(&format!(
            "==================== {} (would buy, no sell price yet) ====================\n",
            report.sell_date
        ));
    } else {
        out.push_str(&format!("==================== {} ====================\n", report.sell_date));
    }

    if report.lines.is_empty() {
        out.push_str("No trades.\n");
    } else {
        let mut headers = vec!["Symbol", "Proportion", "Weight", "Side", "Today Change", "Buy Price"];
        if !report.preview {
            headers.extend(["Sell Price", "Gain"]);
        }
        let rows: Vec<Vec<String>> = report
            .lines
            .iter()
            .map(|l| trade_row(l, report.preview))
            .collect();
        out.push_str(&render_grid(&headers, &rows));
    }

    if let Some(t) = &report.totals {
        out.push_str(&format!(
            "Daily Gain: {}  Quarterly Gain: {}  Yearly Gain: {}  Total Gain: {}\n",
            format_pct(t.daily_gain),
            format_pct(t.quarter_gain),
            format_pct(t.year_gain),
            format_pct(t.total_gain)
        ));
        out.push_str(&format!(
            "Win Trades: {}  Lose Trades: {}\n",
            t.win_trades, t.lose_trades
        ));
    }
    out.push('\n');
    out
}

pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::from("==================== Summary ====================\n");
    if summary.interrupted {
        out.push_str("Run interrupted, results are partial.\n");
    }
    out.push_str(&format!(
        "Time Range: {} -> {} ({} days)\n",
        summary.start_date, summary.end_date, summary.days
    ));
    let rows: Vec<Vec<String>> = summary
        .bucket_gains
        .iter()
        .map(|(bucket, gain)| vec![bucket.clone(), format_pct(*gain)])
        .collect();
    out.push_str(&render_grid(&["Period", "Gain"], &rows));
    out.push_str(&format!(
        "Win Trades: {}  Lose Trades: {}\n",
        summary.win_trades, summary.lose_trades
    ));
    out
}
