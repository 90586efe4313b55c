//! Reactive state holder behind every screen of the app.
//!
//! [`ExpenseTracker`] owns the expense list and the budget state, writes both
//! through to a [`PreferenceStore`] after each mutation, and derives the views
//! the shell renders (recent items, monthly groups, search results, and the
//! budget summary).

use std::cmp::Reverse;

use chrono::{FixedOffset, Offset, Utc};

use crate::config::{Config, DEFAULT_RECENT_LIMIT, DEFAULT_WARNING_THRESHOLD};
use crate::core::errors::{Result, TrackerError};
use crate::core::time::Clock;
use crate::domain::expense::{validate_amount, validate_description};
use crate::domain::{group_by_month, BudgetPeriod, BudgetState, BudgetWindow, Expense, MonthGroup};
use crate::storage::{keys, PreferenceStore};

/// Knobs the tracker reads from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub recent_limit: usize,
    pub warning_threshold: f64,
    pub offset: FixedOffset,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            recent_limit: DEFAULT_RECENT_LIMIT,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
            offset: Utc.fix(),
        }
    }
}

impl From<&Config> for TrackerSettings {
    fn from(config: &Config) -> Self {
        Self {
            recent_limit: config.recent_limit.max(1),
            warning_threshold: config.warning_threshold,
            offset: config.offset(),
        }
    }
}

/// Snapshot of budget-versus-spend for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub period: BudgetPeriod,
    pub title: &'static str,
    pub budget: f64,
    pub spent: f64,
    pub balance: f64,
    /// `spent / budget`, 0 when there is no budget. Not clamped.
    pub progress: f64,
    pub over_threshold: bool,
    pub warning_pending: bool,
    pub window: Option<BudgetWindow>,
    pub total_expenses: f64,
    pub expense_count: usize,
}

pub struct ExpenseTracker<S, C> {
    store: S,
    clock: C,
    settings: TrackerSettings,
    expenses: Vec<Expense>,
    budget: BudgetState,
    search_text: String,
    warning_pending: bool,
    load_warnings: Vec<String>,
}

impl<S: PreferenceStore, C: Clock> ExpenseTracker<S, C> {
    /// Reads every persisted key, tolerating absent ones, then brings the budget
    /// period up to date with the clock.
    pub fn load(store: S, clock: C, settings: TrackerSettings) -> Result<Self> {
        let mut load_warnings = Vec::new();

        let expenses = match store.get_string(keys::EXPENSES)? {
            Some(blob) if !blob.trim().is_empty() => serde_json::from_str::<Vec<Expense>>(&blob)
                .map_err(|err| {
                    TrackerError::StorageError(format!("stored expenses are unreadable: {}", err))
                })?,
            _ => Vec::new(),
        };

        let mut amount = store.get_f64(keys::BUDGET)?.unwrap_or(0.0);
        if amount < 0.0 {
            load_warnings.push(format!("stored budget {} was negative; reset to 0", amount));
            amount = 0.0;
        }

        let period = match store.get_string(keys::BUDGET_PERIOD)? {
            Some(raw) => raw.parse::<BudgetPeriod>().unwrap_or_else(|_| {
                load_warnings.push(format!("unknown stored budget period `{}` ignored", raw));
                BudgetPeriod::None
            }),
            None => BudgetPeriod::None,
        };

        let budget = BudgetState {
            amount,
            period,
            period_origin: store.get_i64(keys::BUDGET_PERIOD_ORIGIN)?,
            period_start: store.get_i64(keys::BUDGET_PERIOD_START)?,
            warning_acknowledged: store
                .get_bool(keys::BUDGET_WARNING_ACKNOWLEDGED)?
                .unwrap_or(false),
        };

        for warning in &load_warnings {
            tracing::warn!("{}", warning);
        }

        let mut tracker = Self {
            store,
            clock,
            settings,
            expenses,
            budget,
            search_text: String::new(),
            warning_pending: false,
            load_warnings,
        };
        tracker.refresh_period()?;
        tracing::info!(
            expenses = tracker.expenses.len(),
            period = tracker.budget.period.token(),
            "tracker loaded"
        );
        Ok(tracker)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn settings(&self) -> TrackerSettings {
        self.settings
    }

    pub fn load_warnings(&self) -> &[String] {
        &self.load_warnings
    }

    /// Applies new settings; the threshold may change, so the warning is re-evaluated.
    pub fn set_settings(&mut self, settings: TrackerSettings) -> Result<()> {
        self.settings = settings;
        self.refresh_period()?;
        Ok(())
    }

    /// Re-reads everything from the store, dropping in-memory state.
    pub fn reload(self) -> Result<Self> {
        let settings = self.settings;
        Self::load(self.store, self.clock, settings)
    }

    // ----- derived views -----

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn expense(&self, id: i64) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id == id)
    }

    /// Newest expenses first, capped at the configured limit.
    pub fn recent_expenses(&self) -> Vec<Expense> {
        let mut sorted = self.expenses.clone();
        sorted.sort_by_key(|expense| Reverse(expense.id));
        sorted.truncate(self.settings.recent_limit);
        sorted
    }

    pub fn expenses_by_month(&self) -> Vec<MonthGroup> {
        group_by_month(&self.expenses, self.settings.offset)
    }

    pub fn months(&self) -> Vec<String> {
        self.expenses_by_month()
            .into_iter()
            .map(|group| group.label)
            .collect()
    }

    /// Looks a month group up by its label, ignoring case.
    pub fn month(&self, label: &str) -> Option<MonthGroup> {
        let wanted = label.trim();
        self.expenses_by_month()
            .into_iter()
            .find(|group| group.label.eq_ignore_ascii_case(wanted))
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// Empty while the search text is blank; otherwise case-insensitive
    /// description matches grouped per month.
    pub fn searched_expenses_by_month(&self) -> Vec<MonthGroup> {
        let needle = self.search_text.trim();
        if needle.is_empty() {
            return Vec::new();
        }
        let matches = self.expenses.iter().filter(|expense| expense.matches(needle));
        group_by_month(matches, self.settings.offset)
    }

    pub fn total_expenses(&self) -> f64 {
        self.expenses.iter().map(|expense| expense.amount).sum()
    }

    pub fn budget(&self) -> f64 {
        self.budget.amount
    }

    pub fn budget_period(&self) -> BudgetPeriod {
        self.budget.period
    }

    pub fn budget_state(&self) -> &BudgetState {
        &self.budget
    }

    pub fn current_window(&self) -> Option<BudgetWindow> {
        self.budget.window(self.clock.now(), self.settings.offset)
    }

    /// Spend inside the active window; 0 when no period is set.
    pub fn total_expenses_for_period(&self) -> f64 {
        match self.current_window() {
            Some(window) => self
                .expenses
                .iter()
                .filter(|expense| window.contains_millis(expense.id))
                .map(|expense| expense.amount)
                .sum(),
            None => 0.0,
        }
    }

    pub fn balance(&self) -> f64 {
        self.budget.amount - self.total_expenses_for_period()
    }

    pub fn progress(&self) -> f64 {
        if self.budget.amount > 0.0 {
            self.total_expenses_for_period() / self.budget.amount
        } else {
            0.0
        }
    }

    pub fn is_over_warning_threshold(&self) -> bool {
        self.budget.period.is_set()
            && self.budget.amount > 0.0
            && self.progress() > self.settings.warning_threshold
    }

    pub fn budget_warning_pending(&self) -> bool {
        self.warning_pending
    }

    pub fn summary(&self) -> BudgetSummary {
        let spent = self.total_expenses_for_period();
        let budget = self.budget.amount;
        BudgetSummary {
            period: self.budget.period,
            title: self.budget.period.title(),
            budget,
            spent,
            balance: budget - spent,
            progress: if budget > 0.0 { spent / budget } else { 0.0 },
            over_threshold: self.is_over_warning_threshold(),
            warning_pending: self.warning_pending,
            window: self.current_window(),
            total_expenses: self.total_expenses(),
            expense_count: self.expenses.len(),
        }
    }

    // ----- mutations -----
    //
    // Every mutation stages the next state into the store and adopts it only
    // once the flush succeeded, so a failed write leaves memory untouched.

    pub fn add_expense(&mut self, description: &str, amount: f64) -> Result<Expense> {
        let description = validate_description(description)?;
        let amount = validate_amount(amount)?;
        self.refresh_period()?;

        let mut id = self.clock.now_millis();
        if self.expense(id).is_some() {
            let max_id = self.expenses.iter().map(|e| e.id).max().unwrap_or(id);
            id = max_id.saturating_add(1);
        }
        let expense = Expense::new(id, description, amount);
        let mut next = self.expenses.clone();
        next.push(expense.clone());
        self.commit_expenses(next)?;
        tracing::info!(id = expense.id, amount = expense.amount, "expense added");
        self.evaluate_warning();
        Ok(expense)
    }

    pub fn delete_expense(&mut self, id: i64) -> Result<Expense> {
        let position = self
            .expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or(TrackerError::ExpenseNotFound(id))?;
        let mut next = self.expenses.clone();
        let removed = next.remove(position);
        self.commit_expenses(next)?;
        tracing::info!(id, "expense deleted");
        self.refresh_period()?;
        Ok(removed)
    }

    /// Sets the budget and starts a fresh period instance at the current instant.
    pub fn set_budget(&mut self, amount: f64, period: BudgetPeriod) -> Result<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(TrackerError::InvalidInput(format!(
                "budget must be zero or a positive number, got {}",
                amount
            )));
        }
        if !period.is_set() {
            return Err(TrackerError::InvalidInput(
                "choose a weekly, monthly, or yearly period; use delete to clear the budget"
                    .into(),
            ));
        }
        let now = self.clock.now_millis();
        self.commit_budget(BudgetState {
            amount,
            period,
            period_origin: Some(now),
            period_start: Some(now),
            warning_acknowledged: false,
        })?;
        self.warning_pending = false;
        tracing::info!(amount, period = period.token(), "budget set");
        self.evaluate_warning();
        Ok(())
    }

    pub fn delete_budget(&mut self) -> Result<()> {
        self.commit_budget(BudgetState::default())?;
        self.warning_pending = false;
        tracing::info!("budget deleted");
        Ok(())
    }

    /// Hides the warning and suppresses it for the rest of this period
    /// instance. Returns whether a warning was showing.
    pub fn dismiss_budget_warning(&mut self) -> Result<bool> {
        if !self.warning_pending {
            return Ok(false);
        }
        let mut next = self.budget.clone();
        next.warning_acknowledged = true;
        self.commit_budget(next)?;
        self.warning_pending = false;
        tracing::debug!("budget warning acknowledged");
        Ok(true)
    }

    /// Moves the stored period start forward when the period has elapsed,
    /// clearing the acknowledgment so the next instance can warn again.
    /// Returns whether the stored budget state changed.
    pub fn refresh_period(&mut self) -> Result<bool> {
        let changed = match self.rolled_budget() {
            Some(next) => {
                self.commit_budget(next)?;
                true
            }
            None => false,
        };
        self.evaluate_warning();
        Ok(changed)
    }

    /// Budget state for the current instant, or `None` when the stored one is
    /// already current. The origin never moves, so clamped month ends do not
    /// shift later windows.
    fn rolled_budget(&self) -> Option<BudgetState> {
        if !self.budget.period.is_set() {
            return None;
        }
        let mut next = self.budget.clone();
        match self.current_window() {
            Some(window) => {
                let start = window.start.timestamp_millis();
                next.period_origin = next.period_origin.or(next.period_start);
                if next.period_start != Some(start) {
                    tracing::debug!(
                        from = ?next.period_start,
                        to = %window.start,
                        "budget period rolled over"
                    );
                    next.period_start = Some(start);
                    next.warning_acknowledged = false;
                }
            }
            None => {
                tracing::debug!("budget period had no usable start; anchoring now");
                let now = self.clock.now_millis();
                next.period_origin = Some(now);
                next.period_start = Some(now);
                next.warning_acknowledged = false;
            }
        }
        (next != self.budget).then_some(next)
    }

    fn evaluate_warning(&mut self) {
        let should_show = self.is_over_warning_threshold() && !self.budget.warning_acknowledged;
        if should_show && !self.warning_pending {
            tracing::info!(
                spent = self.total_expenses_for_period(),
                budget = self.budget.amount,
                "budget warning raised"
            );
        }
        self.warning_pending = should_show;
    }

    fn commit_expenses(&mut self, next: Vec<Expense>) -> Result<()> {
        stage_expenses(&mut self.store, &next)?;
        if let Err(err) = self.store.flush() {
            if let Err(restage) = stage_expenses(&mut self.store, &self.expenses) {
                tracing::warn!(error = %restage, "could not restage previous expenses");
            }
            return Err(err);
        }
        self.expenses = next;
        Ok(())
    }

    fn commit_budget(&mut self, next: BudgetState) -> Result<()> {
        stage_budget(&mut self.store, &next);
        if let Err(err) = self.store.flush() {
            stage_budget(&mut self.store, &self.budget);
            return Err(err);
        }
        if next.warning_acknowledged != self.budget.warning_acknowledged
            || next.period_start != self.budget.period_start
        {
            self.warning_pending = false;
        }
        self.budget = next;
        Ok(())
    }
}

fn stage_expenses<S: PreferenceStore>(store: &mut S, expenses: &[Expense]) -> Result<()> {
    let blob = serde_json::to_string(expenses)?;
    store.put_string(keys::EXPENSES, blob);
    Ok(())
}

fn stage_budget<S: PreferenceStore>(store: &mut S, budget: &BudgetState) {
    store.put_f64(keys::BUDGET, budget.amount);
    store.put_string(keys::BUDGET_PERIOD, budget.period.token());
    put_or_remove(store, keys::BUDGET_PERIOD_ORIGIN, budget.period_origin);
    put_or_remove(store, keys::BUDGET_PERIOD_START, budget.period_start);
    store.put_bool(keys::BUDGET_WARNING_ACKNOWLEDGED, budget.warning_acknowledged);
}

fn put_or_remove<S: PreferenceStore>(store: &mut S, key: &str, value: Option<i64>) {
    match value {
        Some(value) => store.put_i64(key, value),
        None => {
            store.remove(key);
        }
    }
}
