//! Core CLI loop, dispatch, and shell context helpers.

use std::{
    io,
    path::{Path, PathBuf},
};

use dialoguer::theme::ColorfulTheme;
use strsim::levenshtein;

use crate::{
    config::{Config, ConfigManager},
    core::{
        errors::TrackerError,
        time::SystemClock,
        tracker::{ExpenseTracker, TrackerSettings},
        utils::PathResolver,
    },
    storage::JsonPreferences,
};
pub use crate::core::errors::CliError;

use super::commands;
use super::formatters::CliFormatters;
use super::io as cli_io;
use super::output;
use super::registry::{CommandEntry, CommandRegistry};
pub use crate::cli::shell_context::{CliMode, ShellContext, Tracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_home(mode, PathResolver::base_dir())
    }

    /// Builds a shell whose config and preferences live under `home`.
    pub fn with_home(mode: CliMode, home: PathBuf) -> Result<Self, CliError> {
        let mut registry = CommandRegistry::new();
        commands::register_all(&mut registry);

        let config_manager = ConfigManager::with_base_dir(home.clone())?;
        let config = config_manager.load()?;
        output::apply_config(&config, mode == CliMode::Interactive);
        let tracker = open_tracker(&home, &config)?;
        for warning in tracker.load_warnings() {
            cli_io::print_warning(warning);
        }

        Ok(ShellContext {
            mode,
            registry,
            tracker,
            theme: ColorfulTheme::default(),
            formatters: CliFormatters::new(&config),
            home,
            config_manager,
            config,
            last_command: None,
            running: true,
        })
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandEntry> {
        self.registry.resolve(name)
    }

    pub(crate) fn prompt(&self) -> String {
        if self.tracker.budget_period().is_set() {
            format!(
                "trackit [{} left]> ",
                self.formatters.amount(self.tracker.balance())
            )
        } else {
            "trackit> ".to_string()
        }
    }

    /// Writes the in-memory config to disk and pushes it into the tracker,
    /// the formatters, and the output preferences.
    pub(crate) fn persist_config(&mut self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        output::apply_config(&self.config, self.mode == CliMode::Interactive);
        self.formatters = CliFormatters::new(&self.config);
        self.reopen_tracker()
    }

    /// Re-reads the preference file, e.g. after a restore or a retention change.
    pub(crate) fn reopen_tracker(&mut self) -> CommandResult {
        self.tracker = open_tracker(&self.home, &self.config)?;
        for warning in self.tracker.load_warnings() {
            cli_io::print_warning(warning);
        }
        Ok(())
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    /// Rolls the budget period forward and repeats the spending warning while
    /// it is pending.
    pub(crate) fn after_command(&mut self) {
        if let Err(err) = self.tracker.refresh_period() {
            tracing::warn!(error = %err, "budget period refresh failed");
            self.print_warning(&err.to_string());
        }
        if self.tracker.budget_warning_pending() {
            cli_io::print_warning(budget_warning_message(
                self.tracker.settings().warning_threshold,
            ));
            self.print_hint("Run `dismiss-warning` to hide it until the next period.");
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                self.print_warning(&err.to_string());
                return Ok(LoopControl::Continue);
            }
        };

        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }

        let command = tokens[0].to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        let control = self.dispatch(&command, &tokens[0], &args)?;
        self.after_command();
        Ok(control)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let mut suggestions: Vec<_> = self
            .registry
            .words()
            .map(|key| (levenshtein(key, &needle), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        cli_io::confirm_action(&self.theme, "Leave TrackIt?", true, self.is_scripted())
            .map_err(CliError::from)
    }

    /// Asks before destructive actions; scripted runs always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        cli_io::confirm_action(&self.theme, prompt, false, self.is_scripted())
    }

    fn is_scripted(&self) -> bool {
        self.mode == CliMode::Script
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                self.print_error(&message);
                self.print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Core(TrackerError::ExpenseNotFound(id)) => {
                self.print_error(&format!("No expense with id {}.", id));
                self.print_hint("Use `recent` or `list` to see expense ids.");
                Ok(())
            }
            other => {
                tracing::debug!(error = %other, "command failed");
                self.print_error(&other.to_string());
                Ok(())
            }
        }
    }

    pub(crate) fn print_error(&self, message: &str) {
        cli_io::print_error(message);
    }

    pub(crate) fn print_warning(&self, message: &str) {
        cli_io::print_warning(message);
    }

    pub(crate) fn print_hint(&self, message: &str) {
        cli_io::print_hint(message);
    }
}

fn open_tracker(home: &Path, config: &Config) -> Result<Tracker, TrackerError> {
    let store = JsonPreferences::open(Some(home.to_path_buf()), Some(config.backup_retention))?;
    ExpenseTracker::load(store, SystemClock, TrackerSettings::from(config))
}

pub(crate) fn budget_warning_message(threshold: f64) -> String {
    format!(
        "You have spent over {:.0}% of your budget for this period.",
        threshold * 100.0
    )
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Core(#[from] TrackerError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Core(inner) => CliError::Core(inner),
            CommandError::Io(inner) => CliError::Io(inner),
            other => CliError::Prompt(other.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) fn process_script(home: PathBuf, lines: &[&str]) -> Result<ShellContext, CliError> {
    let mut app = ShellContext::with_home(CliMode::Script, home)?;
    for line in lines {
        match app.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => app.report_error(err)?,
        }
    }
    Ok(app)
}
