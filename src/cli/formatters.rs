use chrono::FixedOffset;

use crate::config::Config;
use crate::currency::{format_added_on, format_amount, format_window};
use crate::domain::{BudgetWindow, Expense, MonthGroup};

/// Formatting backed by the active CLI configuration.
#[derive(Debug, Clone)]
pub struct CliFormatters {
    symbol: String,
    offset: FixedOffset,
}

impl CliFormatters {
    pub fn new(config: &Config) -> Self {
        Self {
            symbol: config.currency_symbol.clone(),
            offset: config.offset(),
        }
    }

    pub fn amount(&self, amount: f64) -> String {
        format_amount(&self.symbol, amount)
    }

    /// Two display lines: id, description and amount, then the `Added on` stamp.
    pub fn expense_lines(&self, expense: &Expense) -> [String; 2] {
        [
            format!(
                "  #{:<14} {:<28} {:>14}",
                expense.id,
                expense.description,
                self.amount(expense.amount)
            ),
            format!("      Added on {}", format_added_on(expense, self.offset)),
        ]
    }

    pub fn month_heading(&self, group: &MonthGroup) -> String {
        format!(
            "{} ({} {}, {})",
            group.label,
            group.expenses.len(),
            if group.expenses.len() == 1 {
                "expense"
            } else {
                "expenses"
            },
            self.amount(group.total)
        )
    }

    pub fn window(&self, window: &BudgetWindow) -> String {
        format_window(window, self.offset)
    }
}
