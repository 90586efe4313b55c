#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use tempfile::TempDir;
use trackit_core::{
    core::{
        time::FixedClock,
        tracker::{ExpenseTracker, TrackerSettings},
    },
    storage::JsonPreferences,
};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub type DiskTracker = ExpenseTracker<JsonPreferences, FixedClock>;

/// Creates an isolated home directory for one test.
pub fn temp_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn utc_settings() -> TrackerSettings {
    TrackerSettings::default()
}

/// Opens the preference file under `home` and loads a tracker over it.
pub fn open_tracker(home: &Path, clock: FixedClock) -> DiskTracker {
    let store = JsonPreferences::open(Some(home.to_path_buf()), Some(3)).expect("open preferences");
    ExpenseTracker::load(store, clock, utc_settings()).expect("load tracker")
}
