//! Plain data types shared by the tracker, storage, and CLI layers.

pub mod budget;
pub mod expense;

pub use budget::{BudgetPeriod, BudgetState, BudgetWindow};
pub use expense::{group_by_month, Expense, MonthGroup, MonthKey};
