use crate::cli::core::CommandResult;
use crate::cli::shell_context::ShellContext;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// Headings the help overview is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Expenses,
    Budget,
    Data,
    Shell,
}

impl CommandGroup {
    pub const ALL: [CommandGroup; 4] = [
        CommandGroup::Expenses,
        CommandGroup::Budget,
        CommandGroup::Data,
        CommandGroup::Shell,
    ];

    pub fn title(self) -> &'static str {
        match self {
            CommandGroup::Expenses => "Expenses",
            CommandGroup::Budget => "Budget",
            CommandGroup::Data => "Data and settings",
            CommandGroup::Shell => "Shell",
        }
    }

    /// Matches the word users type after `help`, e.g. `help budget`.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "expenses" | "expense" => Some(CommandGroup::Expenses),
            "budget" | "budgets" => Some(CommandGroup::Budget),
            "data" | "settings" => Some(CommandGroup::Data),
            "shell" => Some(CommandGroup::Shell),
            _ => None,
        }
    }
}

pub struct CommandEntry {
    pub name: &'static str,
    pub group: CommandGroup,
    pub aliases: &'static [&'static str],
    pub summary: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
}

impl CommandEntry {
    pub const fn new(
        name: &'static str,
        group: CommandGroup,
        summary: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            group,
            aliases: &[],
            summary,
            usage,
            handler,
        }
    }

    pub const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn answers_to(&self, word: &str) -> bool {
        self.name.eq_ignore_ascii_case(word)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(word))
    }
}

/// Commands in registration order. Lookups accept names and aliases in any case.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering a name replaces the earlier entry in place.
    pub fn register(&mut self, entry: CommandEntry) {
        match self.entries.iter_mut().find(|known| known.name == entry.name) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn resolve(&self, word: &str) -> Option<&CommandEntry> {
        let word = word.trim();
        self.entries.iter().find(|entry| entry.answers_to(word))
    }

    pub fn handler(&self, word: &str) -> Option<CommandHandler> {
        self.resolve(word).map(|entry| entry.handler)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    /// Names followed by aliases; what suggestions are measured against.
    pub fn words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names()
            .chain(self.entries.iter().flat_map(|entry| entry.aliases.iter().copied()))
    }

    pub fn in_group(&self, group: CommandGroup) -> impl Iterator<Item = &CommandEntry> + '_ {
        self.entries.iter().filter(move |entry| entry.group == group)
    }
}
