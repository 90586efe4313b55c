#![doc(test(attr(deny(warnings))))]

//! TrackIt Core keeps a personal expense list and a recurring budget in a flat
//! preference store, and derives the views a client renders from them.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod storage;
pub mod utils;

pub use crate::core::errors::{CliError, Result, TrackerError};
pub use crate::core::time::{Clock, FixedClock, SystemClock};
pub use crate::core::tracker::{BudgetSummary, ExpenseTracker, TrackerSettings};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("TrackIt tracing initialized.");
    });
}
