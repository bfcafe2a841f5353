//! `mkdelegation services`

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Local;
use mkdelegation_credentials::{Ed25519Signer, Principal};
use mkdelegation_ucan::{Delegation, DelegationError, archive, preset};
use ptree::{PrintConfig, TreeBuilder, write_tree_with};
use serde::Serialize;

use crate::ServicesArgs;

/// A service key pair taking part in the delegations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    /// Display name.
    pub name: &'static str,
    /// `did:key` of the service.
    pub did: String,
    /// Multibase private key of the service.
    pub secret_key: String,
}

/// One issued delegation.
#[derive(Debug, Clone, Serialize)]
pub struct DelegationOutput {
    /// Issuer and audience, e.g. `Indexer → Upload`.
    pub path: &'static str,
    /// Identity CID string of the delegation archive.
    pub ucan: String,
    /// File name used by `--save`.
    #[serde(skip)]
    pub file_name: &'static str,
}

/// Everything `services` produces.
#[derive(Debug, Clone, Serialize)]
pub struct ServicesOutput {
    /// Upload service, indexing service and storage node, in that order.
    pub services: Vec<ServiceInfo>,
    /// Indexer → Upload, Indexer → Storage and Storage → Upload.
    pub delegations: Vec<DelegationOutput>,
}

/// Issue the service delegations and print, save or write them as JSON.
pub fn run(args: &ServicesArgs) -> Result<String> {
    let output = issue(args)?;
    if args.save {
        save(&output, &args.output_dir)
    } else if args.json {
        write_json(&output, &args.output_dir)
    } else {
        render(&output)
    }
}

/// Load or generate the three service keys and issue their delegations.
pub fn issue(args: &ServicesArgs) -> Result<ServicesOutput> {
    let upload = load_or_generate(args.upload_service_private_key.as_deref(), "upload service")?;
    let indexer =
        load_or_generate(args.indexing_service_private_key.as_deref(), "indexing service")?;
    let storage = load_or_generate(args.storage_node_private_key.as_deref(), "storage node")?;

    let delegations = vec![
        delegation_output(
            "Indexer → Upload",
            "indexer-to-upload.b64",
            preset::indexing_to_upload(&indexer, &upload),
        )?,
        delegation_output(
            "Indexer → Storage",
            "indexer-to-storage.b64",
            preset::indexing_to_storage(&indexer, &storage),
        )?,
        delegation_output(
            "Storage → Upload",
            "storage-to-upload.b64",
            preset::storage_to_upload(&storage, &upload),
        )?,
    ];

    let services = [
        ("Upload Service", &upload),
        ("Indexer Service", &indexer),
        ("Storage Node", &storage),
    ]
    .into_iter()
    .map(|(name, signer)| ServiceInfo {
        name,
        did: signer.did().to_string(),
        secret_key: signer.format(),
    })
    .collect();

    Ok(ServicesOutput {
        services,
        delegations,
    })
}

fn load_or_generate(key: Option<&str>, name: &str) -> Result<Ed25519Signer> {
    match key {
        Some(key) => {
            Ed25519Signer::parse(key).with_context(|| format!("parsing {name} private key"))
        }
        None => Ed25519Signer::generate().with_context(|| format!("generating {name} key")),
    }
}

fn delegation_output(
    path: &'static str,
    file_name: &'static str,
    delegation: Result<Delegation, DelegationError>,
) -> Result<DelegationOutput> {
    let delegation = delegation.with_context(|| format!("creating {path} delegation"))?;
    let archive =
        archive::encode(&delegation).with_context(|| format!("encoding {path} delegation"))?;
    Ok(DelegationOutput {
        path,
        ucan: archive::format(&archive),
        file_name,
    })
}

/// Create `delegations_<local time>` under `parent`.
fn timestamped_dir(parent: &Path) -> Result<PathBuf> {
    let dir = parent.join(format!(
        "delegations_{}",
        Local::now().format("%Y%m%d_%H%M%S")
    ));
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating delegations directory {}", dir.display()))?;
    Ok(dir)
}

fn save(output: &ServicesOutput, parent: &Path) -> Result<String> {
    let dir = timestamped_dir(parent)?;
    let mut message = String::from("Delegations saved to:");
    for delegation in &output.delegations {
        let path = dir.join(delegation.file_name);
        fs::write(&path, &delegation.ucan)
            .with_context(|| format!("writing {} delegation", delegation.path))?;
        message.push_str(&format!("\n  - {}", path.display()));
    }
    Ok(message)
}

fn write_json(output: &ServicesOutput, parent: &Path) -> Result<String> {
    let json = serde_json::to_string_pretty(output).context("serializing services output")?;
    let path = timestamped_dir(parent)?.join("output.json");
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(format!("JSON output has been saved to: {}", path.display()))
}

fn render(output: &ServicesOutput) -> Result<String> {
    let mut builder = TreeBuilder::new("Services".to_string());
    for service in &output.services {
        builder
            .begin_child(service.name.to_string())
            .add_empty_child(format!("DID: {}", service.did))
            .add_empty_child(format!("Secret Key: {}", service.secret_key))
            .end_child();
    }
    let tree = builder.build();

    let mut out = Vec::new();
    write_tree_with(&tree, &mut out, &PrintConfig::default()).context("rendering tree")?;
    let mut text = String::from_utf8(out).context("rendering tree")?;

    text.push_str("\nDelegation Path\tBase64 Encoded UCAN\n");
    text.push_str("---------------\t-------------------");
    for delegation in &output.delegations {
        text.push_str(&format!("\n{}\t{}", delegation.path, delegation.ucan));
    }
    Ok(text)
}
