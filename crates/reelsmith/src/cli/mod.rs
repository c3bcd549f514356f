//! Command-line interface: argument definitions and command handlers.

mod commands;
mod handlers;

pub use commands::{Cli, Commands};
pub use handlers::dispatch;
