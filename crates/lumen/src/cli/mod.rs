//! Subcommand handlers.

pub mod config;
pub mod palette;
pub mod process;
