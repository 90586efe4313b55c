use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::core::errors::{Result, TrackerError};
use crate::core::time::{Clock, FixedClock};
use crate::core::tracker::{ExpenseTracker, TrackerSettings};
use crate::domain::BudgetPeriod;
use crate::storage::{keys, MemoryPreferences, PreferenceStore};

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn tracker_at(
    instant: DateTime<Utc>,
) -> (ExpenseTracker<MemoryPreferences, FixedClock>, FixedClock) {
    let clock = FixedClock::new(instant);
    let tracker = ExpenseTracker::load(
        MemoryPreferences::new(),
        clock.clone(),
        TrackerSettings::default(),
    )
    .expect("load empty tracker");
    (tracker, clock)
}

#[test]
fn empty_store_loads_defaults() {
    let (tracker, _clock) = tracker_at(at(2025, 3, 10, 9));
    assert!(tracker.expenses().is_empty());
    assert_eq!(tracker.budget(), 0.0);
    assert_eq!(tracker.budget_period(), BudgetPeriod::None);
    assert_eq!(tracker.total_expenses_for_period(), 0.0);
    assert!(!tracker.budget_warning_pending());
    assert!(tracker.load_warnings().is_empty());
}

#[test]
fn add_expense_persists_and_uses_clock_for_id() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 10, 9));
    let expense = tracker.add_expense("  Coffee ", 4.5).expect("add");

    assert_eq!(expense.id, clock.now_millis());
    assert_eq!(expense.description, "Coffee");
    let blob = tracker
        .store()
        .get_string(keys::EXPENSES)
        .unwrap()
        .expect("blob written");
    assert!(blob.contains("\"Coffee\""), "{blob}");
    assert!(tracker.store().flush_count() >= 1);
}

#[test]
fn colliding_ids_are_bumped_past_the_newest() {
    let (mut tracker, _clock) = tracker_at(at(2025, 3, 10, 9));
    let first = tracker.add_expense("Bus", 2.0).unwrap();
    let second = tracker.add_expense("Train", 3.0).unwrap();
    assert_eq!(second.id, first.id + 1);
}

#[test]
fn invalid_input_is_rejected_without_side_effects() {
    let (mut tracker, _clock) = tracker_at(at(2025, 3, 10, 9));
    assert!(matches!(
        tracker.add_expense("   ", 10.0),
        Err(TrackerError::InvalidInput(_))
    ));
    assert!(matches!(
        tracker.add_expense("Snack", -1.0),
        Err(TrackerError::InvalidInput(_))
    ));
    assert!(tracker.expenses().is_empty());
    assert_eq!(tracker.store().get(keys::EXPENSES), None);
}

#[test]
fn recent_expenses_are_newest_first_and_capped() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 1, 8));
    for (idx, name) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
        tracker.add_expense(name, (idx + 1) as f64).unwrap();
        clock.advance(Duration::minutes(5));
    }
    let recent: Vec<_> = tracker
        .recent_expenses()
        .into_iter()
        .map(|e| e.description)
        .collect();
    assert_eq!(recent, vec!["f", "e", "d", "c"]);
    assert_eq!(tracker.total_expenses(), 21.0);
}

#[test]
fn delete_unknown_expense_is_an_error() {
    let (mut tracker, _clock) = tracker_at(at(2025, 3, 10, 9));
    let err = tracker.delete_expense(42).unwrap_err();
    assert!(matches!(err, TrackerError::ExpenseNotFound(42)));
}

#[test]
fn delete_removes_by_id() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 10, 9));
    let keep = tracker.add_expense("Keep", 1.0).unwrap();
    clock.advance(Duration::seconds(1));
    let drop = tracker.add_expense("Drop", 2.0).unwrap();
    let removed = tracker.delete_expense(drop.id).unwrap();
    assert_eq!(removed, drop);
    assert_eq!(tracker.expenses(), &[keep]);
}

#[test]
fn search_is_blank_until_text_is_entered() {
    let (mut tracker, clock) = tracker_at(at(2025, 1, 15, 12));
    tracker.add_expense("Coffee beans", 12.0).unwrap();
    clock.set(at(2025, 2, 3, 12));
    tracker.add_expense("Iced coffee", 5.0).unwrap();
    tracker.add_expense("Groceries", 60.0).unwrap();

    tracker.set_search_text("   ");
    assert!(tracker.searched_expenses_by_month().is_empty());

    tracker.set_search_text("COFFEE");
    let groups = tracker.searched_expenses_by_month();
    let labels: Vec<_> = groups.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, vec!["February 2025", "January 2025"]);
    assert_eq!(groups[0].expenses[0].description, "Iced coffee");
    assert_eq!(groups[1].total, 12.0);
}

#[test]
fn months_and_month_lookup() {
    let (mut tracker, clock) = tracker_at(at(2024, 12, 30, 12));
    tracker.add_expense("Gift", 40.0).unwrap();
    clock.set(at(2025, 1, 2, 12));
    tracker.add_expense("Brunch", 25.0).unwrap();

    assert_eq!(tracker.months(), vec!["January 2025", "December 2024"]);
    let december = tracker.month("december 2024").expect("month exists");
    assert_eq!(december.total, 40.0);
    assert!(tracker.month("March 2025").is_none());
}

#[test]
fn spend_only_counts_inside_the_active_window() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 1, 9));
    tracker.add_expense("Before budget", 500.0).unwrap();
    clock.advance(Duration::hours(1));
    tracker.set_budget(1000.0, BudgetPeriod::Weekly).unwrap();
    clock.advance(Duration::hours(1));
    tracker.add_expense("Dinner", 300.0).unwrap();

    assert_eq!(tracker.total_expenses(), 800.0);
    assert_eq!(tracker.total_expenses_for_period(), 300.0);
    assert_eq!(tracker.balance(), 700.0);
    assert!((tracker.progress() - 0.3).abs() < f64::EPSILON);
    let summary = tracker.summary();
    assert_eq!(summary.title, "This Week's Budget");
    assert_eq!(summary.window.unwrap().start, at(2025, 3, 1, 10));
}

#[test]
fn warning_fires_only_above_threshold() {
    let (mut tracker, _clock) = tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(100.0, BudgetPeriod::Monthly).unwrap();

    tracker.add_expense("Exactly eighty", 80.0).unwrap();
    assert!(!tracker.is_over_warning_threshold());
    assert!(!tracker.budget_warning_pending());

    tracker.add_expense("Tipping point", 0.5).unwrap();
    assert!(tracker.is_over_warning_threshold());
    assert!(tracker.budget_warning_pending());
}

#[test]
fn dismissed_warning_stays_quiet_for_the_same_period() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(100.0, BudgetPeriod::Weekly).unwrap();
    tracker.add_expense("Big shop", 90.0).unwrap();
    assert!(tracker.dismiss_budget_warning().unwrap());
    assert!(!tracker.budget_warning_pending());

    clock.advance(Duration::days(2));
    tracker.add_expense("More", 5.0).unwrap();
    assert!(!tracker.budget_warning_pending());
    assert_eq!(
        tracker
            .store()
            .get_bool(keys::BUDGET_WARNING_ACKNOWLEDGED)
            .unwrap(),
        Some(true)
    );
    assert!(!tracker.dismiss_budget_warning().unwrap());
}

#[test]
fn rollover_resets_window_and_acknowledgment() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(100.0, BudgetPeriod::Weekly).unwrap();
    tracker.add_expense("Big shop", 90.0).unwrap();
    tracker.dismiss_budget_warning().unwrap();

    clock.advance(Duration::days(9));
    assert!(tracker.refresh_period().unwrap());
    assert_eq!(
        tracker.budget_state().period_start,
        Some(at(2025, 3, 17, 9).timestamp_millis())
    );
    assert!(!tracker.budget_state().warning_acknowledged);
    assert_eq!(tracker.total_expenses_for_period(), 0.0);
    assert!(!tracker.refresh_period().unwrap());

    tracker.add_expense("New week splurge", 85.0).unwrap();
    assert!(tracker.budget_warning_pending());
}

#[test]
fn editing_the_budget_restarts_the_period() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(100.0, BudgetPeriod::Monthly).unwrap();
    tracker.add_expense("Rent share", 95.0).unwrap();
    tracker.dismiss_budget_warning().unwrap();

    clock.advance(Duration::hours(3));
    tracker.set_budget(50.0, BudgetPeriod::Monthly).unwrap();
    assert!(!tracker.budget_state().warning_acknowledged);
    assert_eq!(tracker.total_expenses_for_period(), 0.0);
    assert!(!tracker.budget_warning_pending());

    clock.advance(Duration::minutes(1));
    tracker.add_expense("Lunch", 45.0).unwrap();
    assert!(tracker.budget_warning_pending());
}

#[test]
fn dropping_below_threshold_hides_warning_until_crossed_again() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(100.0, BudgetPeriod::Monthly).unwrap();
    let big = tracker.add_expense("Big", 85.0).unwrap();
    assert!(tracker.budget_warning_pending());

    tracker.delete_expense(big.id).unwrap();
    assert!(!tracker.budget_warning_pending());

    clock.advance(Duration::minutes(1));
    tracker.add_expense("Again", 81.0).unwrap();
    assert!(tracker.budget_warning_pending());
}

#[test]
fn delete_budget_clears_everything() {
    let (mut tracker, _clock) = tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(100.0, BudgetPeriod::Yearly).unwrap();
    tracker.add_expense("Laptop", 99.0).unwrap();
    assert!(tracker.budget_warning_pending());

    tracker.delete_budget().unwrap();
    assert_eq!(tracker.budget_period(), BudgetPeriod::None);
    assert_eq!(tracker.budget(), 0.0);
    assert!(tracker.current_window().is_none());
    assert!(!tracker.budget_warning_pending());
    assert_eq!(tracker.store().get(keys::BUDGET_PERIOD_START), None);
    assert_eq!(tracker.store().get(keys::BUDGET_PERIOD_ORIGIN), None);
    assert_eq!(tracker.expenses().len(), 1);
}

#[test]
fn set_budget_validates_input() {
    let (mut tracker, _clock) = tracker_at(at(2025, 3, 10, 9));
    assert!(tracker.set_budget(-5.0, BudgetPeriod::Monthly).is_err());
    assert!(tracker.set_budget(f64::NAN, BudgetPeriod::Monthly).is_err());
    assert!(tracker.set_budget(100.0, BudgetPeriod::None).is_err());
    tracker.set_budget(0.0, BudgetPeriod::Monthly).unwrap();
    tracker.add_expense("Anything", 10.0).unwrap();
    assert_eq!(tracker.progress(), 0.0);
    assert!(!tracker.budget_warning_pending());
}

#[test]
fn reload_restores_state_and_pending_warning() {
    let (mut tracker, clock) = tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(200.0, BudgetPeriod::Monthly).unwrap();
    tracker.add_expense("Flights", 190.0).unwrap();
    assert!(tracker.budget_warning_pending());

    let store = tracker.store().clone();
    let reloaded =
        ExpenseTracker::load(store, clock.clone(), TrackerSettings::default()).expect("reload");
    assert_eq!(reloaded.expenses().len(), 1);
    assert_eq!(reloaded.budget(), 200.0);
    assert_eq!(reloaded.budget_period(), BudgetPeriod::Monthly);
    assert!(reloaded.budget_warning_pending());

    let mut reloaded = reloaded;
    reloaded.dismiss_budget_warning().unwrap();
    let again = reloaded.reload().expect("reload again");
    assert!(!again.budget_warning_pending());
}

#[test]
fn stale_period_is_rolled_forward_on_load() {
    let mut store = MemoryPreferences::new();
    store.put_f64(keys::BUDGET, 100.0);
    store.put_string(keys::BUDGET_PERIOD, "monthly");
    store.put_i64(keys::BUDGET_PERIOD_START, at(2025, 1, 5, 0).timestamp_millis());
    store.put_bool(keys::BUDGET_WARNING_ACKNOWLEDGED, true);

    let clock = FixedClock::new(at(2025, 3, 20, 0));
    let tracker = ExpenseTracker::load(store, clock, TrackerSettings::default()).unwrap();
    assert_eq!(
        tracker.budget_state().period_start,
        Some(at(2025, 3, 5, 0).timestamp_millis())
    );
    assert!(!tracker.budget_state().warning_acknowledged);
    assert_eq!(
        tracker.store().get_i64(keys::BUDGET_PERIOD_START).unwrap(),
        Some(at(2025, 3, 5, 0).timestamp_millis())
    );
    assert_eq!(
        tracker.store().get_i64(keys::BUDGET_PERIOD_ORIGIN).unwrap(),
        Some(at(2025, 1, 5, 0).timestamp_millis())
    );
}

#[test]
fn missing_period_start_is_anchored_at_load_time() {
    let mut store = MemoryPreferences::new();
    store.put_f64(keys::BUDGET, 100.0);
    store.put_string(keys::BUDGET_PERIOD, "weekly");
    let clock = FixedClock::new(at(2025, 3, 20, 0));
    let tracker = ExpenseTracker::load(store, clock, TrackerSettings::default()).unwrap();
    assert_eq!(
        tracker.budget_state().period_start,
        Some(at(2025, 3, 20, 0).timestamp_millis())
    );
}

#[test]
fn unreadable_expense_blob_fails_loudly() {
    let mut store = MemoryPreferences::new();
    store.put_string(keys::EXPENSES, "{not json");
    let result = ExpenseTracker::load(
        store,
        FixedClock::new(at(2025, 3, 20, 0)),
        TrackerSettings::default(),
    );
    assert!(matches!(result, Err(TrackerError::StorageError(_))));
}

#[test]
fn unknown_period_is_reported_as_a_load_warning() {
    let mut store = MemoryPreferences::new();
    store.put_string(keys::BUDGET_PERIOD, "fortnightly");
    let tracker = ExpenseTracker::load(
        store,
        FixedClock::new(at(2025, 3, 20, 0)),
        TrackerSettings::default(),
    )
    .unwrap();
    assert_eq!(tracker.budget_period(), BudgetPeriod::None);
    assert_eq!(tracker.load_warnings().len(), 1);
    assert!(tracker.load_warnings()[0].contains("fortnightly"));
}

#[test]
fn lowering_the_threshold_can_raise_the_warning() {
    let (mut tracker, _clock) = tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(100.0, BudgetPeriod::Monthly).unwrap();
    tracker.add_expense("Half", 50.0).unwrap();
    assert!(!tracker.budget_warning_pending());

    let settings = TrackerSettings {
        warning_threshold: 0.4,
        ..tracker.settings()
    };
    tracker.set_settings(settings).unwrap();
    assert!(tracker.budget_warning_pending());
}

#[test]
fn month_end_budget_does_not_drift_after_short_month() {
    let (mut tracker, clock) = tracker_at(at(2025, 1, 31, 9));
    tracker.set_budget(100.0, BudgetPeriod::Monthly).unwrap();

    clock.set(at(2025, 3, 1, 0));
    assert!(tracker.refresh_period().unwrap());
    let window = tracker.current_window().unwrap();
    assert_eq!(window.start, at(2025, 2, 28, 9));
    assert_eq!(window.end, at(2025, 3, 31, 9));

    clock.set(at(2025, 3, 29, 0));
    assert!(!tracker.refresh_period().unwrap());
    let window = tracker.current_window().unwrap();
    assert_eq!(window.start, at(2025, 2, 28, 9));
    assert_eq!(window.end, at(2025, 3, 31, 9));

    clock.set(at(2025, 4, 15, 0));
    assert!(tracker.refresh_period().unwrap());
    let window = tracker.current_window().unwrap();
    assert_eq!(window.start, at(2025, 3, 31, 9));
    assert_eq!(window.end, at(2025, 4, 30, 9));
    assert_eq!(
        tracker.budget_state().period_origin,
        Some(at(2025, 1, 31, 9).timestamp_millis())
    );
}

/// Memory store whose flush can be switched to fail.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryPreferences,
    fail: Arc<AtomicBool>,
}

impl PreferenceStore for FlakyStore {
    fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: Value) {
        self.inner.put(key, value);
    }

    fn remove(&mut self, key: &str) -> bool {
        self.inner.remove(key)
    }

    fn flush(&mut self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TrackerError::StorageError("disk full".into()));
        }
        self.inner.flush()
    }
}

fn flaky_tracker_at(
    instant: DateTime<Utc>,
) -> (ExpenseTracker<FlakyStore, FixedClock>, FixedClock, Arc<AtomicBool>) {
    let store = FlakyStore::default();
    let fail = Arc::clone(&store.fail);
    let clock = FixedClock::new(instant);
    let tracker =
        ExpenseTracker::load(store, clock.clone(), TrackerSettings::default()).expect("load");
    (tracker, clock, fail)
}

#[test]
fn failed_flush_leaves_expenses_and_store_untouched() {
    let (mut tracker, clock, fail) = flaky_tracker_at(at(2025, 3, 10, 9));
    let kept = tracker.add_expense("Coffee", 4.0).unwrap();
    let stored = tracker.store().get_string(keys::EXPENSES).unwrap();

    fail.store(true, Ordering::SeqCst);
    clock.advance(Duration::minutes(1));
    assert!(matches!(
        tracker.add_expense("Pens", 3.0),
        Err(TrackerError::StorageError(_))
    ));
    assert_eq!(tracker.expenses().len(), 1);
    assert_eq!(tracker.store().get_string(keys::EXPENSES).unwrap(), stored);

    assert!(tracker.delete_expense(kept.id).is_err());
    assert!(tracker.expense(kept.id).is_some());
    assert_eq!(tracker.store().get_string(keys::EXPENSES).unwrap(), stored);

    fail.store(false, Ordering::SeqCst);
    let reloaded = tracker.reload().unwrap();
    assert_eq!(reloaded.expenses().len(), 1);
    assert_eq!(reloaded.expenses()[0].description, "Coffee");
}

#[test]
fn failed_flush_keeps_previous_budget_and_warning() {
    let (mut tracker, _clock, fail) = flaky_tracker_at(at(2025, 3, 10, 9));
    tracker.set_budget(100.0, BudgetPeriod::Monthly).unwrap();
    tracker.add_expense("Groceries", 90.0).unwrap();
    assert!(tracker.budget_warning_pending());

    fail.store(true, Ordering::SeqCst);
    assert!(tracker.set_budget(500.0, BudgetPeriod::Yearly).is_err());
    assert_eq!(tracker.budget(), 100.0);
    assert_eq!(tracker.budget_period(), BudgetPeriod::Monthly);
    assert_eq!(tracker.store().get_f64(keys::BUDGET).unwrap(), Some(100.0));
    assert_eq!(
        tracker.store().get_string(keys::BUDGET_PERIOD).unwrap().as_deref(),
        Some("monthly")
    );

    assert!(tracker.dismiss_budget_warning().is_err());
    assert!(tracker.budget_warning_pending());
    assert!(!tracker.budget_state().warning_acknowledged);
    assert_eq!(
        tracker.store().get_bool(keys::BUDGET_WARNING_ACKNOWLEDGED).unwrap(),
        Some(false)
    );

    assert!(tracker.delete_budget().is_err());
    assert_eq!(tracker.budget_period(), BudgetPeriod::Monthly);
    assert!(tracker.budget_warning_pending());
}
