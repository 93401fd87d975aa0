pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod permalink;
pub mod reactions;
pub mod settings;
pub mod slack;
pub mod timestamp;
pub mod transcript;

#[cfg(test)]
pub(crate) mod fake_slack;

pub use cli::{Cli, Commands};
pub use error::{AppError, Result};
