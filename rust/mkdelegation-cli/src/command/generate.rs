//! `mkdelegation gen`

use std::fs;

use anyhow::{Context, Result, bail};
use mkdelegation_credentials::{Did, Ed25519Signer, Signer, WrappedSigner};
use mkdelegation_ucan::{KnownAbilities, archive, delegate};

use crate::GenArgs;

const DID_WEB_PREFIX: &str = "did:web:";

/// Issue a delegation from the arguments and return its identity CID.
pub fn run(args: &GenArgs) -> Result<String> {
    let key = load_issuer_key(args)?;
    let issuer: Box<dyn Signer> = match &args.issuer_did_web {
        Some(did_web) => {
            if !did_web.starts_with(DID_WEB_PREFIX) {
                bail!("issuer did:web must start with '{DID_WEB_PREFIX}'");
            }
            let did: Did = did_web
                .parse()
                .with_context(|| format!("parsing issuer did:web ({did_web})"))?;
            Box::new(WrappedSigner::new(key, did))
        }
        None => Box::new(key),
    };

    let audience: Did = args
        .audience_did_key
        .parse()
        .context("parsing audience did key")?;

    if args.skip_capability_validation {
        tracing::debug!("capability validation skipped");
    } else {
        let known = KnownAbilities::default().extend(args.known_abilities.iter().cloned());
        known.check(&args.capabilities).with_context(|| {
            format!(
                "capabilities validation failed (pass --skip-capability-validation to skip it); known abilities: {}",
                known.iter().collect::<Vec<_>>().join(", ")
            )
        })?;
    }

    let expiration = (args.expiration > 0).then_some(args.expiration);
    let delegation = delegate(
        &*issuer,
        audience,
        args.capabilities.iter().map(String::as_str),
        expiration,
        None,
    )
    .context("making delegation")?;

    let archive = archive::encode(&delegation).context("encoding delegation archive")?;
    Ok(archive::format(&archive))
}

fn load_issuer_key(args: &GenArgs) -> Result<Ed25519Signer> {
    match (&args.issuer_private_key_file, &args.issuer_private_key) {
        (Some(path), _) => {
            let pem = fs::read_to_string(path)
                .with_context(|| format!("reading issuer key file {}", path.display()))?;
            Ed25519Signer::from_pem(&pem)
                .with_context(|| format!("parsing issuer private key from {}", path.display()))
        }
        (None, Some(key)) => Ed25519Signer::parse(key).context("parsing issuer private key"),
        (None, None) => bail!("one of --issuer-private-key or --issuer-private-key-file is required"),
    }
}
