use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, CommandGroup, CommandRegistry};

const NAME_WIDTH: usize = 16;

pub fn print_overview(registry: &CommandRegistry) {
    output_section("TrackIt commands");
    for group in CommandGroup::ALL {
        for line in group_lines(registry, group) {
            io::print_info(line);
        }
    }
    io::print_info("Type `help <command>` or `help <section>` for details. Tab completes.");
}

pub fn print_group(registry: &CommandRegistry, group: CommandGroup) {
    output_section(group.title());
    for line in group_lines(registry, group).into_iter().skip(1) {
        io::print_info(line);
    }
}

pub fn print_command(entry: &CommandEntry) {
    output_section(format!("{} ({})", entry.name, entry.group.title()));
    for line in command_lines(entry) {
        io::print_info(line);
    }
}

/// Section heading followed by one row per command; empty for an empty group.
fn group_lines(registry: &CommandRegistry, group: CommandGroup) -> Vec<String> {
    let rows: Vec<String> = registry
        .in_group(group)
        .map(|entry| format!("  {:<NAME_WIDTH$} {}", entry.name, entry.summary))
        .collect();
    if rows.is_empty() {
        return rows;
    }
    let mut lines = vec![format!("{}:", group.title())];
    lines.extend(rows);
    lines
}

fn command_lines(entry: &CommandEntry) -> Vec<String> {
    let mut lines = vec![format!("  {}", entry.summary), format!("  Usage: {}", entry.usage)];
    if !entry.aliases.is_empty() {
        lines.push(format!("  Also typed as: {}", entry.aliases.join(", ")));
    }
    lines
}
