use std::{cmp::Reverse, fmt};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TrackerError};

/// A single spend entry. `id` is the creation instant in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub amount: f64,
}

impl Expense {
    pub fn new(id: i64, description: impl Into<String>, amount: f64) -> Self {
        Self {
            id,
            description: description.into(),
            amount,
        }
    }

    pub fn created_at_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.id)
            .single()
            .unwrap_or_default()
    }

    pub fn created_at(&self, offset: FixedOffset) -> DateTime<FixedOffset> {
        self.created_at_utc().with_timezone(&offset)
    }

    pub fn month_key(&self, offset: FixedOffset) -> MonthKey {
        MonthKey::from_date(self.created_at(offset).date_naive())
    }

    pub fn matches(&self, needle: &str) -> bool {
        self.description
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }
}

/// Calendar month used to bucket expenses; orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Long label such as `March 2025`.
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|date| date.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{:04}-{:02}", self.year, self.month))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup {
    pub key: MonthKey,
    pub label: String,
    pub expenses: Vec<Expense>,
    pub total: f64,
}

/// Buckets expenses per calendar month, newest month first and newest
/// expense first inside each month.
pub fn group_by_month<'a, I>(expenses: I, offset: FixedOffset) -> Vec<MonthGroup>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut sorted: Vec<&Expense> = expenses.into_iter().collect();
    sorted.sort_by_key(|expense| Reverse(expense.id));

    let mut groups: Vec<MonthGroup> = Vec::new();
    for expense in sorted {
        let key = expense.month_key(offset);
        match groups.last_mut() {
            Some(group) if group.key == key => {
                group.total += expense.amount;
                group.expenses.push(expense.clone());
            }
            _ => groups.push(MonthGroup {
                key,
                label: key.label(),
                expenses: vec![expense.clone()],
                total: expense.amount,
            }),
        }
    }
    groups
}

pub fn validate_description(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::InvalidInput(
            "description must not be blank".into(),
        ));
    }
    Ok(trimmed.to_string())
}

pub fn validate_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TrackerError::InvalidInput(format!(
            "amount must be a positive number, got {amount}"
        )));
    }
    Ok(amount)
}
