//! CLI module - command-line interface
//!
//! Contains the REPL, command parsing and result formatting.

pub mod commands;
pub mod repl;

pub use repl::Repl;
