use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, CommandGroup};
use crate::config::Config;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "config",
        CommandGroup::Data,
        "View and change preferences",
        "config [show|set <key> <value>]",
        cmd_config,
    )]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() || args[0].eq_ignore_ascii_case("show") {
        show(context);
        return Ok(());
    }

    match args[0].to_lowercase().as_str() {
        "set" => {
            if args.len() < 3 {
                return Err(CommandError::InvalidArguments(format!(
                    "usage: config set <{}> <value>",
                    Config::KEYS.join("|")
                )));
            }
            let key = args[1];
            let value = args[2..].join(" ");
            context.config.set_value(key, &value)?;
            context.persist_config()?;
            io::print_success(format!("Updated {}.", key.to_ascii_lowercase()));
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown config action `{}`; expected show or set",
            other
        ))),
    }
}

fn show(context: &ShellContext) {
    let config = &context.config;
    output_section("Configuration");
    io::print_fields(&[
        ("currency_symbol", config.currency_symbol.clone()),
        ("recent_limit", config.recent_limit.to_string()),
        ("warning_threshold", config.warning_threshold.to_string()),
        (
            "utc_offset_minutes",
            config
                .utc_offset_minutes
                .map(|minutes| minutes.to_string())
                .unwrap_or_else(|| format!("auto ({})", config.offset())),
        ),
        (
            "ui_color_enabled",
            if config.ui_color_enabled { "on" } else { "off" }.to_string(),
        ),
        ("backup_retention", config.backup_retention.to_string()),
        ("config file", context.config_manager.path().display().to_string()),
    ]);
}
