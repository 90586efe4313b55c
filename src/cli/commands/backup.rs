use chrono::Local;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, CommandGroup};
use crate::storage::BackupInfo;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![CommandEntry::new(
        "backup",
        CommandGroup::Data,
        "Snapshot, list, or restore saved data",
        "backup [create [note...]|list|restore <name>]",
        cmd_backup,
    )]
}

fn cmd_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let action = args.first().map(|value| value.to_lowercase());
    match action.as_deref() {
        None => create(context, None),
        Some("create") => {
            let note = args[1..].join(" ");
            create(context, Some(note.as_str()).filter(|note| !note.trim().is_empty()))
        }
        Some("list") => list(context),
        Some("restore") => match args.get(1) {
            Some(name) => restore(context, name),
            None => Err(CommandError::InvalidArguments(
                "usage: backup restore <name>".into(),
            )),
        },
        Some(other) => Err(CommandError::InvalidArguments(format!(
            "unknown backup action `{}`; expected create, list, or restore",
            other
        ))),
    }
}

fn create(context: &mut ShellContext, note: Option<&str>) -> CommandResult {
    let info = context.tracker.store_mut().backup(note)?;
    io::print_success(format!("Backup created: {}", info.name));
    Ok(())
}

fn list(context: &ShellContext) -> CommandResult {
    let backups = context.tracker.store().list_backups()?;
    output_section("Backups");
    if backups.is_empty() {
        io::print_info("No backups yet. Use `backup create [note]`.");
        return Ok(());
    }
    for (idx, info) in backups.iter().enumerate() {
        io::print_info(format!("  {:>2}. {}", idx + 1, backup_label(info)));
    }
    Ok(())
}

fn restore(context: &mut ShellContext, reference: &str) -> CommandResult {
    let name = resolve_reference(context, reference)?;
    if !context.confirm(&format!("Replace current data with `{}`?", name))? {
        io::print_info("Operation cancelled.");
        return Ok(());
    }
    context.tracker.store_mut().restore(&name)?;
    context.reopen_tracker()?;
    io::print_success(format!("Restored data from `{}`.", name));
    Ok(())
}

/// Accepts a 1-based index from `backup list` or a file name, with or without `.json`.
fn resolve_reference(context: &ShellContext, reference: &str) -> Result<String, CommandError> {
    let backups = context.tracker.store().list_backups()?;
    if let Ok(index) = reference.parse::<usize>() {
        return backups
            .get(index.wrapping_sub(1))
            .map(|info| info.name.clone())
            .ok_or_else(|| {
                CommandError::InvalidArguments(format!("no backup at position {}", index))
            });
    }
    backups
        .iter()
        .find(|info| {
            info.name == reference || info.name.trim_end_matches(".json") == reference
        })
        .map(|info| info.name.clone())
        .ok_or_else(|| CommandError::InvalidArguments(format!("backup `{}` not found", reference)))
}

fn backup_label(info: &BackupInfo) -> String {
    match info.created_at {
        Some(created) => format!(
            "{} (Created: {})",
            info.name,
            created.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ),
        None => info.name.clone(),
    }
}
