pub mod errors;
pub mod time;
pub mod tracker;
pub mod utils;

#[cfg(test)]
mod tests;
