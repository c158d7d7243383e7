pub mod ask;
pub mod locate;
pub mod scrape;
pub mod sessions;
pub mod snapshot;
pub mod utils;

#[cfg(test)]
#[path = "../commands_test.rs"]
mod commands_test;
