use dialoguer::{theme::ColorfulTheme, Confirm};

use crate::cli::core::CommandError;

pub use crate::cli::output::{
    error as print_error, hint as print_hint, info as print_info, success as print_success,
    warning as print_warning,
};

/// `label : value` rows with the labels padded to the widest one.
pub fn field_lines(fields: &[(&str, String)]) -> Vec<String> {
    let width = fields
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    fields
        .iter()
        .map(|(label, value)| format!("  {:<width$} : {}", label, value))
        .collect()
}

pub fn print_fields(fields: &[(&str, String)]) {
    for line in field_lines(fields) {
        print_info(line);
    }
}

/// Yes/no prompt. Scripted runs pass `assume_yes` and never block on stdin.
pub fn confirm_action(
    theme: &ColorfulTheme,
    prompt: &str,
    default: bool,
    assume_yes: bool,
) -> Result<bool, CommandError> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::with_theme(theme)
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(CommandError::from)
}
