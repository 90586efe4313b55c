pub mod backup;
pub mod budget;
pub mod config;
pub mod expense;
pub mod system;

use crate::cli::registry::CommandRegistry;

pub fn register_all(registry: &mut CommandRegistry) {
    for entry in system::definitions()
        .into_iter()
        .chain(expense::definitions())
        .chain(budget::definitions())
        .chain(backup::definitions())
        .chain(config::definitions())
    {
        registry.register(entry);
    }
}
