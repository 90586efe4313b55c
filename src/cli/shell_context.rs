//! Shared runtime state for CLI interactions and command execution.

use std::path::PathBuf;

use dialoguer::theme::ColorfulTheme;

use crate::{
    config::{Config, ConfigManager},
    core::{time::SystemClock, tracker::ExpenseTracker},
    storage::JsonPreferences,
};

use super::{formatters::CliFormatters, registry::CommandRegistry};

pub type Tracker = ExpenseTracker<JsonPreferences, SystemClock>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub tracker: Tracker,
    pub theme: ColorfulTheme,
    pub formatters: CliFormatters,
    pub home: PathBuf,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn status(&self) -> String {
        format!(
            "ShellContext {{ running: {}, last_command: {:?}, expenses: {} }}",
            self.running,
            self.last_command,
            self.tracker.expenses().len()
        )
    }
}
