pub mod json_backend;

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::errors::{Result, TrackerError};

pub use json_backend::{BackupInfo, JsonPreferences};

/// Keys the tracker persists. Everything lives in one flat namespace.
pub mod keys {
    pub const EXPENSES: &str = "expenses";
    pub const BUDGET: &str = "budget";
    pub const BUDGET_PERIOD: &str = "budget_period";
    pub const BUDGET_PERIOD_ORIGIN: &str = "budget_period_origin";
    pub const BUDGET_PERIOD_START: &str = "budget_period_start";
    pub const BUDGET_WARNING_ACKNOWLEDGED: &str = "budget_warning_acknowledged";
}

/// Flat key/value preference store holding scalars and string blobs.
///
/// Writes may be buffered; `flush` makes them durable. Typed getters return
/// `Ok(None)` for absent keys and an error when a key holds a different type.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<&Value>;
    fn put(&mut self, key: &str, value: Value);
    fn remove(&mut self, key: &str) -> bool;
    fn flush(&mut self) -> Result<()>;

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(type_mismatch(key, "string", other)),
        }
    }

    fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(value)) => Ok(value.as_f64()),
            Some(other) => Err(type_mismatch(key, "number", other)),
        }
    }

    fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(value)) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| type_mismatch(key, "integer", &Value::Number(value.clone()))),
            Some(other) => Err(type_mismatch(key, "integer", other)),
        }
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(value)) => Ok(Some(*value)),
            Some(other) => Err(type_mismatch(key, "bool", other)),
        }
    }

    fn put_string(&mut self, key: &str, value: impl Into<String>)
    where
        Self: Sized,
    {
        self.put(key, Value::String(value.into()));
    }

    fn put_f64(&mut self, key: &str, value: f64) {
        // Non-finite floats have no JSON form; store null so reads fall back to defaults.
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.put(key, value);
    }

    fn put_i64(&mut self, key: &str, value: i64) {
        self.put(key, Value::from(value));
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        self.put(key, Value::Bool(value));
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Value) -> TrackerError {
    TrackerError::StorageError(format!(
        "preference `{}` should be a {} but holds `{}`",
        key, expected, found
    ))
}

/// Volatile store for tests and dry runs. `flush` is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, Value>,
    flushes: usize,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `flush` was called.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values.clone()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn put(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
