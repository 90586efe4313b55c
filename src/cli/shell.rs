use std::io::{self, BufRead};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    CompletionType, Config as EditorConfig, Context as ReadlineContext, Editor, Helper,
};

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::output::info as output_info;
use crate::config::Config;
use crate::domain::BudgetPeriod;

/// Setting this variable switches the shell to line-by-line stdin processing.
pub const SCRIPT_ENV: &str = "TRACKIT_CLI_SCRIPT";

const HELP_SECTIONS: [&str; 4] = ["expenses", "budget", "data", "shell"];

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    tracing::debug!(?mode, home = %context.home.display(), "shell started");
    // A warning left pending by the previous session shows before the first prompt.
    context.after_command();

    let result = match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    };
    tracing::debug!(status = %context.status(), "shell stopped");
    result
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let config = EditorConfig::builder()
        .completion_type(CompletionType::List)
        .auto_add_history(true)
        .build();
    let mut editor = Editor::<CompletionIndex, DefaultHistory>::with_config(config)?;

    while context.running {
        // Backups come and go between commands, so the index is rebuilt per prompt.
        editor.set_helper(Some(CompletionIndex::from_context(context)));
        match editor.readline(&context.prompt()) {
            Ok(line) => match handle_line(context, &line) {
                Ok(LoopControl::Continue) => {}
                Ok(LoopControl::Exit) => break,
                Err(err) => context.report_error(err)?,
            },
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                output_info("Goodbye.");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    for line in io::stdin().lock().lines() {
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err)?,
        }
        if !context.running {
            break;
        }
    }
    Ok(())
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(message) => {
            context.print_warning(&format!("Could not read that line: {}", message));
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };

    context.last_command = Some(line.trim().to_string());
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    let control = context.dispatch(&raw.to_lowercase(), raw, &args);
    if let Ok(LoopControl::Exit) = control {
        context.running = false;
    } else {
        context.after_command();
    }
    control
}

/// Splits a line the way a POSIX shell would, so descriptions can be quoted.
pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, String> {
    shell_words::split(input).map_err(|err| err.to_string())
}

/// Words Tab can offer at each argument position of a TrackIt command line.
struct CompletionIndex {
    commands: Vec<&'static str>,
    backups: Vec<String>,
}

impl CompletionIndex {
    fn from_context(context: &ShellContext) -> Self {
        let backups = context
            .tracker
            .store()
            .list_backups()
            .map(|list| list.into_iter().map(|info| info.name).collect())
            .unwrap_or_default();
        Self {
            commands: context.command_names(),
            backups,
        }
    }

    /// Candidates for the word after `done`, the words already typed in full.
    fn candidates(&self, done: &[&str]) -> Vec<String> {
        let Some(command) = done.first().map(|word| word.to_ascii_lowercase()) else {
            return owned(&self.commands);
        };
        let action = done.get(1).map(|word| word.to_ascii_lowercase());

        match (command.as_str(), done.len(), action.as_deref()) {
            ("help" | "?", 1, _) => {
                let sections = HELP_SECTIONS
                    .iter()
                    .filter(|section| !self.commands.contains(*section));
                self.commands
                    .iter()
                    .chain(sections)
                    .map(|word| word.to_string())
                    .collect()
            }
            ("budget", 1, _) => owned(&["show", "set", "delete"]),
            ("budget", 3, Some("set")) => BudgetPeriod::SELECTABLE
                .iter()
                .map(|period| period.token().to_string())
                .collect(),
            ("backup", 1, _) => owned(&["create", "list", "restore"]),
            ("backup", 2, Some("restore")) => self.backups.clone(),
            ("config", 1, _) => owned(&["show", "set"]),
            ("config", 2, Some("set")) => owned(&Config::KEYS),
            ("config", 3, Some("set")) if done[2].eq_ignore_ascii_case("ui_color_enabled") => {
                owned(&["on", "off"])
            }
            _ => Vec::new(),
        }
    }
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|word| word.to_string()).collect()
}

impl Completer for CompletionIndex {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        let start = typed
            .rfind(char::is_whitespace)
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let done: Vec<&str> = typed[..start].split_whitespace().collect();
        let needle = typed[start..].to_ascii_lowercase();

        let pairs = self
            .candidates(&done)
            .into_iter()
            .filter(|word| word.to_ascii_lowercase().starts_with(&needle))
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for CompletionIndex {
    type Hint = String;
}

impl Highlighter for CompletionIndex {}

impl Validator for CompletionIndex {}

impl Helper for CompletionIndex {}
