use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, CommandGroup};
use crate::domain::{Expense, MonthGroup};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "add",
            CommandGroup::Expenses,
            "Record a new expense",
            "add <amount> <description...>",
            cmd_add,
        ),
        CommandEntry::new(
            "delete",
            CommandGroup::Expenses,
            "Delete an expense by id",
            "delete <id>",
            cmd_delete,
        )
        .with_aliases(&["rm"]),
        CommandEntry::new(
            "recent",
            CommandGroup::Expenses,
            "Show the latest expenses",
            "recent",
            cmd_recent,
        ),
        CommandEntry::new(
            "list",
            CommandGroup::Expenses,
            "Show expenses grouped by month",
            "list [month label, e.g. March 2025]",
            cmd_list,
        )
        .with_aliases(&["ls"]),
        CommandEntry::new(
            "months",
            CommandGroup::Expenses,
            "List months that have expenses",
            "months",
            cmd_months,
        ),
        CommandEntry::new(
            "search",
            CommandGroup::Expenses,
            "Find expenses by description (no text clears the search)",
            "search [text...]",
            cmd_search,
        ),
    ]
}

fn cmd_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((raw_amount, rest)) = args.split_first() else {
        return Err(CommandError::InvalidArguments(
            "usage: add <amount> <description...>".into(),
        ));
    };
    let amount = parse_amount(raw_amount, &context.config.currency_symbol)?;
    let description = rest.join(" ");
    if description.trim().is_empty() {
        return Err(CommandError::InvalidArguments(
            "usage: add <amount> <description...>".into(),
        ));
    }

    let expense = context.tracker.add_expense(&description, amount)?;
    io::print_success(format!(
        "Added `{}` for {} (id {}).",
        expense.description,
        context.formatters.amount(expense.amount),
        expense.id
    ));
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let id = match args {
        [raw] => raw.trim_start_matches('#').parse::<i64>().map_err(|_| {
            CommandError::InvalidArguments(format!("`{}` is not a valid expense id", raw))
        })?,
        _ => return Err(CommandError::InvalidArguments("usage: delete <id>".into())),
    };

    if let Some(expense) = context.tracker.expense(id) {
        let prompt = format!(
            "Delete `{}` ({})?",
            expense.description,
            context.formatters.amount(expense.amount)
        );
        if !context.confirm(&prompt)? {
            io::print_info("Operation cancelled.");
            return Ok(());
        }
    }

    let removed = context.tracker.delete_expense(id)?;
    io::print_success(format!("Deleted `{}`.", removed.description));
    Ok(())
}

fn cmd_recent(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output_section("Recent Expenses");
    let recent = context.tracker.recent_expenses();
    if recent.is_empty() {
        io::print_info("No expenses yet. Use `add <amount> <description>` to record one.");
        return Ok(());
    }
    print_expenses(context, &recent);
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if !args.is_empty() {
        let label = args.join(" ");
        return match context.tracker.month(&label) {
            Some(group) => {
                print_group(context, &group);
                Ok(())
            }
            None => {
                io::print_warning(format!("No expenses recorded for `{}`.", label));
                Ok(())
            }
        };
    }

    output_section("All Expenses");
    let groups = context.tracker.expenses_by_month();
    if groups.is_empty() {
        io::print_info("No expenses yet.");
        return Ok(());
    }
    for group in &groups {
        print_group(context, group);
    }
    io::print_info(format!(
        "Total: {}",
        context.formatters.amount(context.tracker.total_expenses())
    ));
    Ok(())
}

fn cmd_months(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output_section("Months");
    let groups = context.tracker.expenses_by_month();
    if groups.is_empty() {
        io::print_info("No expenses yet.");
        return Ok(());
    }
    for group in &groups {
        io::print_info(format!("  {}", context.formatters.month_heading(group)));
    }
    Ok(())
}

fn cmd_search(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let needle = args.join(" ");
    context.tracker.set_search_text(needle.as_str());
    if needle.trim().is_empty() {
        io::print_info("Search cleared.");
        return Ok(());
    }

    output_section(format!("Search: {}", needle.trim()));
    let groups = context.tracker.searched_expenses_by_month();
    if groups.is_empty() {
        io::print_info(format!("No expenses match `{}`.", needle.trim()));
        return Ok(());
    }
    for group in &groups {
        print_group(context, group);
    }
    Ok(())
}

fn print_group(context: &ShellContext, group: &MonthGroup) {
    output_section(context.formatters.month_heading(group));
    print_expenses(context, &group.expenses);
}

fn print_expenses(context: &ShellContext, expenses: &[Expense]) {
    for expense in expenses {
        for line in context.formatters.expense_lines(expense) {
            io::print_info(line);
        }
    }
}

/// Accepts plain numbers as well as the configured symbol and grouping commas.
pub(crate) fn parse_amount(raw: &str, symbol: &str) -> Result<f64, CommandError> {
    let trimmed = raw.trim();
    let trimmed = if symbol.is_empty() {
        trimmed
    } else {
        trimmed.strip_prefix(symbol).unwrap_or(trimmed)
    };
    let cleaned: String = trimmed.chars().filter(|ch| *ch != ',').collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{}` is not a valid amount", raw)))
}
