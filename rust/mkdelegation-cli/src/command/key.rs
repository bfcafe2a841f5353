//! `mkdelegation key`

use anyhow::{Context, Result};
use mkdelegation_credentials::{Ed25519Signer, Principal};

/// Generate a fresh Ed25519 key. Prints its DID and multibase private key,
/// the latter usable as `gen --issuer-private-key`.
pub fn run() -> Result<String> {
    let signer = Ed25519Signer::generate().context("generating key")?;
    Ok(format!(
        "DID          {}\nPrivate key  {}",
        signer.did(),
        signer.format()
    ))
}
