use crossterm::terminal;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, CommandGroup};
use crate::currency::progress_bar;
use crate::domain::BudgetPeriod;

use super::expense::parse_amount;

const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;
const BAR_MARGIN: usize = 24;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "summary",
            CommandGroup::Budget,
            "Show budget, spend, and balance for the current period",
            "summary",
            cmd_summary,
        ),
        CommandEntry::new(
            "budget",
            CommandGroup::Budget,
            "Set or delete the recurring budget",
            "budget [show|set <amount> <weekly|monthly|yearly>|delete]",
            cmd_budget,
        ),
        CommandEntry::new(
            "dismiss-warning",
            CommandGroup::Budget,
            "Hide the spending warning until the next period",
            "dismiss-warning",
            cmd_dismiss_warning,
        )
        .with_aliases(&["dismiss"]),
    ]
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = context.tracker.summary();
    let fmt = &context.formatters;

    output_section(summary.title);
    if !summary.period.is_set() {
        io::print_info("  No budget set. Use `budget set <amount> <period>` to start one.");
        io::print_info(format!(
            "  Total spent  : {} across {} expenses",
            fmt.amount(summary.total_expenses),
            summary.expense_count
        ));
        return Ok(());
    }

    let mut fields = vec![
        ("Budget", fmt.amount(summary.budget)),
        ("Spent", fmt.amount(summary.spent)),
        ("Balance", fmt.amount(summary.balance)),
    ];
    if let Some(window) = summary.window.as_ref() {
        fields.push(("Period", fmt.window(window)));
    }
    fields.push(("Progress", progress_bar(summary.progress, bar_width())));
    io::print_fields(&fields);
    if summary.balance < 0.0 {
        io::print_warning("You are over budget for this period.");
    }
    Ok(())
}

fn cmd_budget(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some(sub) = args.first() else {
        return cmd_summary(context, args);
    };

    match sub.to_lowercase().as_str() {
        "show" => cmd_summary(context, &args[1..]),
        "set" => {
            let [raw_amount, raw_period] = &args[1..] else {
                return Err(CommandError::InvalidArguments(
                    "usage: budget set <amount> <weekly|monthly|yearly>".into(),
                ));
            };
            let amount = parse_amount(raw_amount, &context.config.currency_symbol)?;
            let period: BudgetPeriod = raw_period.parse()?;
            context.tracker.set_budget(amount, period)?;
            io::print_success(format!(
                "{} budget set to {}.",
                period.label(),
                context.formatters.amount(amount)
            ));
            Ok(())
        }
        "delete" | "clear" => {
            if !context.tracker.budget_period().is_set() && context.tracker.budget() == 0.0 {
                io::print_info("No budget to delete.");
                return Ok(());
            }
            if !context.confirm("Delete the current budget?")? {
                io::print_info("Operation cancelled.");
                return Ok(());
            }
            context.tracker.delete_budget()?;
            io::print_success("Budget deleted.");
            Ok(())
        }
        other => Err(CommandError::InvalidArguments(format!(
            "unknown budget action `{}`; expected show, set, or delete",
            other
        ))),
    }
}

fn cmd_dismiss_warning(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.tracker.dismiss_budget_warning()? {
        io::print_success("Budget warning dismissed until the next period.");
    } else {
        io::print_info("No budget warning to dismiss.");
    }
    Ok(())
}

fn bar_width() -> usize {
    terminal::size()
        .map(|(columns, _)| usize::from(columns).saturating_sub(BAR_MARGIN))
        .unwrap_or(MAX_BAR_WIDTH)
        .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH)
}
