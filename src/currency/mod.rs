//! Presentation helpers for amounts, timestamps, and budget progress.

use chrono::FixedOffset;

use crate::domain::{BudgetWindow, Expense};

const GROUPING_SEPARATOR: char = ',';
const PRECISION: usize = 2;

/// Renders `amount` with two decimals, thousands grouping, and a leading symbol.
pub fn format_amount(symbol: &str, amount: f64) -> String {
    let body = format_number(amount.abs());
    if amount < 0.0 {
        format!("-{}{}", symbol, body)
    } else {
        format!("{}{}", symbol, body)
    }
}

pub fn format_number(value: f64) -> String {
    let body = format!("{:.*}", PRECISION, value);
    match body.split_once('.') {
        Some((int_part, frac)) => format!("{}.{}", group_digits(int_part), frac),
        None => group_digits(&body),
    }
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (len - idx) % 3 == 0 {
            grouped.push(GROUPING_SEPARATOR);
        }
        grouped.push(ch);
    }
    grouped
}

/// `Added on` stamp for an expense, e.g. `05 Mar 2025, 09:30 AM`.
pub fn format_added_on(expense: &Expense, offset: FixedOffset) -> String {
    expense
        .created_at(offset)
        .format("%d %b %Y, %I:%M %p")
        .to_string()
}

pub fn format_window(window: &BudgetWindow, offset: FixedOffset) -> String {
    let start = window.start.with_timezone(&offset);
    let end = window.end.with_timezone(&offset);
    format!(
        "{} to {}",
        start.format("%d %b %Y %H:%M"),
        end.format("%d %b %Y %H:%M")
    )
}

/// Text progress bar; the filled part is clamped to the bar width while the
/// percentage shows the real value.
pub fn progress_bar(progress: f64, width: usize) -> String {
    let width = width.max(1);
    let ratio = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    let percent = if progress.is_finite() {
        progress * 100.0
    } else {
        0.0
    };
    format!(
        "[{}{}] {:.0}%",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent
    )
}
