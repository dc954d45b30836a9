//! Baby tracker CLI library.
//!
//! This crate provides the command-line interface for the tracker. It owns
//! no domain logic: every subcommand loads the tracker from the database,
//! calls one engine operation, persists the result, and formats output.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, DiaperArg, EditArgs, LogArgs, SideArg, StartActivity};
pub use config::Config;
