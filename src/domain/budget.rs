use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::TrackerError;

/// Recurring window a budget is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    #[default]
    None,
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub const SELECTABLE: [BudgetPeriod; 3] = [
        BudgetPeriod::Weekly,
        BudgetPeriod::Monthly,
        BudgetPeriod::Yearly,
    ];

    pub fn is_set(self) -> bool {
        self != BudgetPeriod::None
    }

    pub fn token(self) -> &'static str {
        match self {
            BudgetPeriod::None => "none",
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BudgetPeriod::None => "None",
            BudgetPeriod::Weekly => "Weekly",
            BudgetPeriod::Monthly => "Monthly",
            BudgetPeriod::Yearly => "Yearly",
        }
    }

    /// Heading shown above the budget summary.
    pub fn title(self) -> &'static str {
        match self {
            BudgetPeriod::None => "My Budget",
            BudgetPeriod::Weekly => "This Week's Budget",
            BudgetPeriod::Monthly => "This Month's Budget",
            BudgetPeriod::Yearly => "This Year's Budget",
        }
    }

    /// Shifts a local timestamp by `steps` whole periods. Month and year steps
    /// clamp the day to the end of shorter months.
    pub fn advance(self, start: NaiveDateTime, steps: i64) -> Option<NaiveDateTime> {
        match self {
            BudgetPeriod::None => Some(start),
            BudgetPeriod::Weekly => start.checked_add_signed(Duration::try_weeks(steps)?),
            BudgetPeriod::Monthly => {
                let months = i32::try_from(steps).ok()?;
                let date = shift_months(start.date(), months)?;
                Some(date.and_time(start.time()))
            }
            BudgetPeriod::Yearly => {
                let years = i32::try_from(steps).ok()?;
                let months = years.checked_mul(12)?;
                let date = shift_months(start.date(), months)?;
                Some(date.and_time(start.time()))
            }
        }
    }

    /// The window that contains `now`, stepping from `anchor` in whole periods.
    /// Calendar arithmetic happens in `offset` local time. Returns `None` when
    /// no period is selected. A `now` before the anchor yields the anchor window.
    pub fn window_containing(
        self,
        anchor: DateTime<Utc>,
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Option<BudgetWindow> {
        if !self.is_set() {
            return None;
        }
        let anchor_local = anchor.with_timezone(&offset).naive_local();
        let now_local = now.with_timezone(&offset).naive_local();

        let mut steps = if now_local <= anchor_local {
            0
        } else {
            self.estimate_steps(anchor_local, now_local)
        };

        // The estimate can overshoot by one when the anchor day or time is later
        // in its month/week than `now`.
        let mut start = self.advance(anchor_local, steps)?;
        while steps > 0 && start > now_local {
            steps -= 1;
            start = self.advance(anchor_local, steps)?;
        }
        let mut end = self.advance(anchor_local, steps + 1)?;
        while end <= now_local {
            steps += 1;
            start = end;
            end = self.advance(anchor_local, steps + 1)?;
        }

        Some(BudgetWindow {
            start: to_utc(start, offset),
            end: to_utc(end, offset),
        })
    }

    fn estimate_steps(self, anchor: NaiveDateTime, now: NaiveDateTime) -> i64 {
        match self {
            BudgetPeriod::None => 0,
            BudgetPeriod::Weekly => (now - anchor).num_days().div_euclid(7),
            BudgetPeriod::Monthly => month_index(now.date()) - month_index(anchor.date()),
            BudgetPeriod::Yearly => i64::from(now.year() - anchor.year()),
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BudgetPeriod {
    type Err = TrackerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(BudgetPeriod::None),
            "weekly" | "week" | "w" => Ok(BudgetPeriod::Weekly),
            "monthly" | "month" | "m" => Ok(BudgetPeriod::Monthly),
            "yearly" | "year" | "annual" | "y" => Ok(BudgetPeriod::Yearly),
            other => Err(TrackerError::InvalidInput(format!(
                "unknown budget period `{}` (expected weekly, monthly, or yearly)",
                other
            ))),
        }
    }
}

/// Half-open `[start, end)` interval of the active budget period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BudgetWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn contains_millis(&self, millis: i64) -> bool {
        self.start.timestamp_millis() <= millis && millis < self.end.timestamp_millis()
    }
}

/// Scalar budget state persisted next to the expense list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetState {
    pub amount: f64,
    pub period: BudgetPeriod,
    /// Instant the budget was set, epoch milliseconds. Every window is
    /// stepped from here so clamped month ends never become the new anchor.
    pub period_origin: Option<i64>,
    /// Start of the current period instance, epoch milliseconds.
    pub period_start: Option<i64>,
    pub warning_acknowledged: bool,
}

impl BudgetState {
    /// Stepping origin; stores written before the origin key existed fall
    /// back to the instance start.
    pub fn anchor(&self) -> Option<DateTime<Utc>> {
        self.period_origin
            .or(self.period_start)
            .and_then(DateTime::<Utc>::from_timestamp_millis)
    }

    /// A clock that moved back before the current instance keeps that instance.
    pub fn window(&self, now: DateTime<Utc>, offset: FixedOffset) -> Option<BudgetWindow> {
        let anchor = self.anchor()?;
        let floor = self
            .period_start
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or(anchor);
        self.period.window_containing(anchor, now.max(floor), offset)
    }
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let total = date.year().checked_mul(12)? + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    first_next.pred_opt().map(|last| last.day())
}

fn to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    let naive_utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::<Utc>::from_naive_utc_and_offset(naive_utc, Utc)
}
