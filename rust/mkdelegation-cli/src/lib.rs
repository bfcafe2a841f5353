#![warn(missing_docs)]

//! # mkdelegation
//!
//! Command line tool for issuing and inspecting UCAN delegations between
//! storage network services.
//!
//! ## Usage
//!
//! Issue a delegation and print it as a single identity CID string:
//!
//! ```bash
//! mkdelegation gen -i <multibase key> -a <audience did:key> -c blob/allocate -c blob/accept
//! ```
//!
//! Inspect one, from a file or stdin:
//!
//! ```bash
//! mkdelegation parse delegation.b64
//! echo '<identity cid>' | mkdelegation parse --json
//! ```
//!
//! Issue the delegations between the upload service, the indexing service
//! and a storage node, generating any key that is not given:
//!
//! ```bash
//! mkdelegation services --save
//! ```
//!
//! Generate a key to issue with:
//!
//! ```bash
//! mkdelegation key
//! ```
//!
//! Logs go to stderr. `--verbose` enables debug output and `RUST_LOG`
//! overrides both.

mod cli;
pub mod command;

pub use cli::*;

use std::io;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Run a parsed command line, returning what should be printed.
pub fn run(cli: &MkDelegationCli) -> Result<String> {
    match &cli.command {
        Command::Gen(args) => command::generate::run(args),
        Command::Parse(args) => {
            let content = command::inspect::read_input(args.file.as_deref(), io::stdin().lock())?;
            command::inspect::run(&content, args)
        }
        Command::Services(args) => command::services::run(args),
        Command::Key => command::key::run(),
    }
}
