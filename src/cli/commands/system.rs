use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, CommandGroup};
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "version",
            CommandGroup::Shell,
            "Show build metadata and where data is kept",
            "version",
            cmd_version,
        ),
        CommandEntry::new(
            "help",
            CommandGroup::Shell,
            "List commands, or explain one command or section",
            "help [command|expenses|budget|data|shell]",
            cmd_help,
        )
        .with_aliases(&["?"]),
        CommandEntry::new("exit", CommandGroup::Shell, "Leave TrackIt", "exit", cmd_exit)
            .with_aliases(&["quit", "q"]),
    ]
}

fn cmd_version(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    let store = context.tracker.store();
    output_section(format!("TrackIt {}", meta.version));
    io::print_fields(&[
        ("Build hash", format!("{} ({})", meta.git_hash, meta.git_status)),
        ("Built at", meta.timestamp.to_string()),
        ("Target", format!("{} [{}]", meta.target, meta.profile)),
        ("Rustc", meta.rustc.to_string()),
        ("Data file", store.path().display().to_string()),
        ("Backups", store.backups_dir().display().to_string()),
        ("Config file", context.config_manager.path().display().to_string()),
        ("Expenses", context.tracker.expenses().len().to_string()),
    ]);
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(topic) = args.first() else {
        help::print_overview(&context.registry);
        return Ok(());
    };
    if let Some(entry) = context.command(topic) {
        help::print_command(entry);
    } else if let Some(group) = CommandGroup::from_word(topic) {
        help::print_group(&context.registry, group);
    } else {
        context.suggest_command(topic);
    }
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
