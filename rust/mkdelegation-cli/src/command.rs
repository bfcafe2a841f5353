//! Subcommand implementations.
//!
//! Each subcommand returns the text to print so that it can be exercised
//! without a terminal.

pub mod generate;
pub mod inspect;
pub mod key;
pub mod services;
