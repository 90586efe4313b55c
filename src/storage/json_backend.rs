use std::{
    cmp::Reverse,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::core::{
    errors::{Result, TrackerError},
    utils::{ensure_dir, write_atomic, PathResolver},
};

use super::PreferenceStore;

const BACKUP_EXTENSION: &str = "json";
const BACKUP_PREFIX: &str = "prefs";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const DEFAULT_RETENTION: usize = 5;

/// Describes one timestamped snapshot of the preference file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// Preference store persisted as a single flat JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonPreferences {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    values: BTreeMap<String, Value>,
    dirty: bool,
}

impl JsonPreferences {
    /// Opens (or lazily creates) the store under `root`, defaulting to the app home.
    pub fn open(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let base = PathResolver::resolve_base(root);
        ensure_dir(&base)?;
        let backups_dir = PathResolver::backup_dir_in(&base);
        ensure_dir(&backups_dir)?;
        let path = PathResolver::prefs_file_in(&base);
        let values = read_values(&path)?;
        tracing::debug!(path = %path.display(), keys = values.len(), "preferences opened");
        Ok(Self {
            path,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
            values,
            dirty: false,
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(None, None)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Snapshots the on-disk file (after flushing pending writes) into the backups folder.
    pub fn backup(&mut self, note: Option<&str>) -> Result<BackupInfo> {
        self.flush()?;
        ensure_dir(&self.backups_dir)?;
        let now = Utc::now();
        let mut stem = format!("{}_{}", BACKUP_PREFIX, now.format(BACKUP_TIMESTAMP_FORMAT));
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let name = format!("{}.{}", stem, BACKUP_EXTENSION);
        let path = self.backups_dir.join(&name);
        write_atomic(&path, &serialize_values(&self.values)?)?;
        self.prune_backups()?;
        tracing::info!(backup = %name, "preferences backed up");
        Ok(BackupInfo {
            name,
            created_at: Some(now),
            path,
        })
    }

    /// Lists backups newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            entries.push(BackupInfo {
                name: name.to_string(),
                created_at: parse_backup_timestamp(name),
                path: path.clone(),
            });
        }
        entries.sort_by_key(|info| Reverse((info.created_at, info.name.clone())));
        Ok(entries)
    }

    /// Replaces the live preferences with the named backup and persists them.
    pub fn restore(&mut self, backup_name: &str) -> Result<()> {
        let backup_path = self.backups_dir.join(backup_name);
        if !backup_path.is_file() {
            return Err(TrackerError::StorageError(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let values = read_values(&backup_path)?;
        self.values = values;
        self.dirty = true;
        self.flush()?;
        tracing::info!(backup = %backup_name, "preferences restored");
        Ok(())
    }

    fn prune_backups(&self) -> Result<()> {
        let backups = self.list_backups()?;
        for entry in backups.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                tracing::warn!(backup = %entry.name, error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl PreferenceStore for JsonPreferences {
    fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn put(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }

    fn remove(&mut self, key: &str) -> bool {
        let removed = self.values.remove(key).is_some();
        self.dirty |= removed;
        removed
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty && self.path.exists() {
            return Ok(());
        }
        let json = serialize_values(&self.values)?;
        write_atomic(&self.path, &json)?;
        self.dirty = false;
        Ok(())
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, Value>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let data = fs::read_to_string(path)?;
    if data.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    match serde_json::from_str::<Value>(&data)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(TrackerError::StorageError(format!(
            "`{}` must hold a JSON object, found {}",
            path.display(),
            json_kind(&other)
        ))),
    }
}

fn serialize_values(values: &BTreeMap<String, Value>) -> Result<String> {
    Ok(serde_json::to_string_pretty(values)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

// Names look like `prefs_20250301_091500[_note].json`.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let mut parts = stem.split('_');
    if parts.next()? != BACKUP_PREFIX {
        return None;
    }
    let date_part = parts.next()?;
    let time_part = parts.next()?;
    if !is_digits(date_part, 8) || !is_digits(time_part, 6) {
        return None;
    }
    let raw = format!("{}{}", date_part, time_part);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::keys;
    use tempfile::TempDir;

    fn store_in_temp_dir() -> (JsonPreferences, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let store = JsonPreferences::open(Some(temp.path().to_path_buf()), Some(2))
            .expect("open preferences");
        (store, temp)
    }

    #[test]
    fn flush_and_reopen_roundtrip() {
        let (mut store, guard) = store_in_temp_dir();
        store.put_f64(keys::BUDGET, 250.0);
        store.put_string(keys::BUDGET_PERIOD, "weekly");
        store.flush().expect("flush");

        let reopened =
            JsonPreferences::open(Some(guard.path().to_path_buf()), None).expect("reopen");
        assert_eq!(reopened.get_f64(keys::BUDGET).unwrap(), Some(250.0));
        assert_eq!(
            reopened.get_string(keys::BUDGET_PERIOD).unwrap().as_deref(),
            Some("weekly")
        );
    }

    #[test]
    fn unflushed_writes_are_not_on_disk() {
        let (mut store, guard) = store_in_temp_dir();
        store.put_bool(keys::BUDGET_WARNING_ACKNOWLEDGED, true);
        let reopened =
            JsonPreferences::open(Some(guard.path().to_path_buf()), None).expect("reopen");
        assert_eq!(
            reopened.get_bool(keys::BUDGET_WARNING_ACKNOWLEDGED).unwrap(),
            None
        );
    }

    #[test]
    fn non_object_file_is_rejected() {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("prefs.json"), "[1, 2, 3]").expect("seed file");
        let err = JsonPreferences::open(Some(temp.path().to_path_buf()), None)
            .expect_err("array payload must fail");
        assert!(err.to_string().contains("an array"), "unexpected: {err}");
    }

    #[test]
    fn backup_and_restore_replace_live_values() {
        let (mut store, _guard) = store_in_temp_dir();
        store.put_f64(keys::BUDGET, 100.0);
        let backup = store.backup(Some("Before Trip")).expect("backup");
        assert!(backup.name.ends_with("_before-trip.json"), "{}", backup.name);

        store.put_f64(keys::BUDGET, 900.0);
        store.flush().expect("flush");
        store.restore(&backup.name).expect("restore");
        assert_eq!(store.get_f64(keys::BUDGET).unwrap(), Some(100.0));
    }

    #[test]
    fn restore_unknown_backup_fails() {
        let (mut store, _guard) = store_in_temp_dir();
        let err = store.restore("prefs_20000101_000000.json").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn retention_prunes_oldest_backups() {
        let (store, _guard) = store_in_temp_dir();
        for name in [
            "prefs_20250101_080000.json",
            "prefs_20250102_080000.json",
            "prefs_20250103_080000_manual.json",
        ] {
            fs::write(store.backups_dir().join(name), "{}").expect("seed backup");
        }
        store.prune_backups().expect("prune");
        let names: Vec<_> = store
            .list_backups()
            .expect("list")
            .into_iter()
            .map(|info| info.name)
            .collect();
        assert_eq!(
            names,
            vec!["prefs_20250103_080000_manual.json", "prefs_20250102_080000.json"]
        );
    }

    #[test]
    fn parses_backup_names() {
        assert!(parse_backup_timestamp("prefs_20250301_091500.json").is_some());
        assert!(parse_backup_timestamp("prefs_20250301_091500_note.json").is_some());
        assert!(parse_backup_timestamp("prefs_2025_0915.json").is_none());
        assert!(parse_backup_timestamp("other_20250301_091500.json").is_none());
    }

    #[test]
    fn sanitizes_notes() {
        assert_eq!(sanitize_backup_note(Some("  Month End! ")).as_deref(), Some("month-end"));
        assert_eq!(sanitize_backup_note(Some("***")), None);
        assert_eq!(sanitize_backup_note(None), None);
    }
}
