//! `mkdelegation parse`

use std::{fs, io::Read, path::Path};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat};
use mkdelegation_ucan::{DelegationInfo, archive};
use ptree::{PrintConfig, TreeBuilder, write_tree_with};

use crate::ParseArgs;

/// Read the delegation text from `file`, or from `stdin` when no file is
/// given.
pub fn read_input(file: Option<&Path>, mut stdin: impl Read) -> Result<String> {
    match file {
        Some(path) => {
            if !path.exists() {
                bail!("file does not exist: {}", path.display());
            }
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut content = String::new();
            stdin
                .read_to_string(&mut content)
                .context("reading delegation from stdin")?;
            if content.trim().is_empty() {
                bail!("no input provided via stdin and no file specified");
            }
            Ok(content)
        }
    }
}

/// Parse and resolve `content`, rendering it as a tree or as JSON.
pub fn run(content: &str, args: &ParseArgs) -> Result<String> {
    let extracted = archive::parse(content).context("parsing delegation")?;
    let info = extracted
        .resolve_bounded(args.max_depth, args.max_nodes)
        .context("resolving proof chain")?;

    if info.proofs.len() != info.proof_delegations.len() {
        tracing::warn!(
            referenced = info.proofs.len(),
            resolved = info.proof_delegations.len(),
            "some proofs are not included in the archive"
        );
    }

    if args.json {
        serde_json::to_string_pretty(&info).context("serializing delegation info")
    } else {
        render_tree(&info)
    }
}

/// Render a delegation and its resolved proofs as an indented tree.
pub fn render_tree(info: &DelegationInfo) -> Result<String> {
    let mut builder = TreeBuilder::new("Delegation".to_string());
    add_fields(&mut builder, info, true);
    let tree = builder.build();

    let mut out = Vec::new();
    write_tree_with(&tree, &mut out, &PrintConfig::default()).context("rendering tree")?;
    String::from_utf8(out).context("rendering tree")
}

fn add_fields(builder: &mut TreeBuilder, info: &DelegationInfo, top_level: bool) {
    builder
        .add_empty_child(format!("Issuer: {}", info.issuer))
        .add_empty_child(format!("Audience: {}", info.audience))
        .add_empty_child(format!("Version: {}", info.version));

    if let Some(nonce) = &info.nonce {
        builder.add_empty_child(format!("Nonce: {nonce}"));
    }
    builder.add_empty_child(format!("Signature (b64): {}", info.signature_base64()));
    builder.add_empty_child(match info.expiration.filter(|&exp| exp > 0) {
        Some(expiration) => format!("Expiration: {}", timestamp(expiration)),
        None => "Expiration: No expiration".to_string(),
    });
    builder.add_empty_child(match info.not_before {
        0 => "Not Before: No not-before time".to_string(),
        not_before => format!("Not Before: {}", timestamp(not_before)),
    });

    // Nested delegations show their resolved proofs instead.
    if top_level && !info.proofs.is_empty() {
        builder.begin_child("Proofs".to_string());
        for cid in &info.proofs {
            builder.add_empty_child(cid.clone());
        }
        builder.end_child();
    }

    builder.begin_child("Capabilities".to_string());
    for (index, capability) in info.capabilities.iter().enumerate() {
        builder.add_empty_child(format!(
            "{}. {} with {}",
            index + 1,
            capability.can,
            capability.with
        ));
    }
    builder.end_child();

    if !info.facts.is_empty() {
        builder.begin_child("Facts".to_string());
        for (index, fact) in info.facts.iter().enumerate() {
            let rendered = serde_json::to_string(fact).unwrap_or_else(|_| format!("{fact:?}"));
            builder.add_empty_child(format!("{}. {rendered}", index + 1));
        }
        builder.end_child();
    }

    if !info.proof_delegations.is_empty() {
        builder.begin_child("Proof Delegations".to_string());
        for (index, proof) in info.proof_delegations.iter().enumerate() {
            builder.begin_child(format!("Proof Delegation {}", index + 1));
            add_fields(builder, proof, false);
            builder.end_child();
        }
        builder.end_child();
    }
}

/// RFC 3339 in UTC, or the raw number when it is out of range.
fn timestamp(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .map_or_else(
            || seconds.to_string(),
            |time| time.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mkdelegation_credentials::{Ed25519Signer, Principal};
    use mkdelegation_ucan::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, Delegation, delegate};
    use std::io::{self, Write};
    use testresult::TestResult;

    fn signer(seed: u8) -> Ed25519Signer {
        Ed25519Signer::import(&[seed; 32]).unwrap()
    }

    fn chained() -> TestResult<String> {
        let proof = delegate(&signer(3), signer(1).did(), ["claim/cache"], None, None)?;
        let delegation = Delegation::builder(&signer(1), signer(2).did())
            .capability("claim/cache")
            .nonce("n")
            .proof(proof)
            .try_build()?;
        Ok(archive::format(&archive::encode(&delegation)?))
    }

    fn parse_args(json: bool) -> ParseArgs {
        ParseArgs {
            file: None,
            json,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }

    #[test]
    fn it_renders_a_tree_with_nested_proofs() -> TestResult {
        let output = run(&chained()?, &parse_args(false))?;

        assert!(output.starts_with("Delegation"));
        assert!(output.contains(&format!("Issuer: {}", signer(1).did())));
        assert!(output.contains("Nonce: n"));
        assert!(output.contains("1. claim/cache with"));
        assert!(output.contains("Proof Delegation 1"));
        assert!(output.contains("Expiration: No expiration"));
        assert!(output.contains("Not Before: No not-before time"));
        assert!(output.contains(&format!("Issuer: {}", signer(3).did())));
        Ok(())
    }

    #[test]
    fn it_renders_json() -> TestResult {
        let output = run(&chained()?, &parse_args(true))?;
        let json: serde_json::Value = serde_json::from_str(&output)?;

        assert_eq!(json["issuer"], signer(1).did().to_string());
        assert_eq!(json["proofDelegations"][0]["issuer"], signer(3).did().to_string());
        assert_eq!(json["proofs"].as_array().map(Vec::len), Some(1));
        Ok(())
    }

    #[test]
    fn it_enforces_the_depth_flag() -> TestResult {
        let mut args = parse_args(false);
        args.max_depth = 0;
        assert!(run(&chained()?, &args).is_err());
        Ok(())
    }

    #[test]
    fn it_enforces_the_node_budget() -> TestResult {
        let mut args = parse_args(false);
        args.max_nodes = 1;
        let err = run(&chained()?, &args).unwrap_err();
        assert!(format!("{err:#}").contains("maximum of 1 delegations"));
        Ok(())
    }

    #[test]
    fn times_render_as_rfc3339() -> TestResult {
        assert_eq!(timestamp(4_102_444_800), "2100-01-01T00:00:00Z");
        assert_eq!(timestamp(u64::MAX), u64::MAX.to_string());

        let delegation = Delegation::builder(&signer(1), signer(2).did())
            .capability("claim/cache")
            .expiration(4_102_444_800)
            .not_before(1_700_000_000)
            .try_build()?;
        let text = archive::format(&archive::encode(&delegation)?);
        let output = run(&text, &parse_args(false))?;

        assert!(output.contains("Expiration: 2100-01-01T00:00:00Z"));
        assert!(output.contains("Not Before: 2023-11-14T22:13:20Z"));
        Ok(())
    }

    #[test]
    fn it_reads_files_and_stdin() -> TestResult {
        let text = chained()?;

        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "{text}")?;
        assert_eq!(read_input(Some(file.path()), io::empty())?.trim(), text);

        assert_eq!(read_input(None, text.as_bytes())?, text);
        Ok(())
    }

    #[test]
    fn it_rejects_missing_input() {
        let missing = read_input(Some(Path::new("/definitely/not/here.b64")), io::empty());
        assert!(missing.unwrap_err().to_string().contains("does not exist"));

        let empty = read_input(None, "  \n".as_bytes());
        assert!(empty.unwrap_err().to_string().contains("no input"));
    }
}
