//! Delegation archives.
//!
//! An [`Archive`] is a CARv1 holding a delegation block, every proof block
//! that could be reached from it, and a root "variant" block
//! `{"ucan@<version>": <delegation link>}` that names the delegation. The
//! textual form is an identity CID over the archive bytes, so the string
//! carries the archive itself and no external lookup is needed.

mod car;
pub mod content_id;

use crate::{
    BlockStore, Delegation, DelegationError, DelegationInfo, Proof,
    block::{self, Block},
    resolve,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use ipld_core::{cid::Cid, ipld::Ipld};
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
};

const VARIANT_PREFIX: &str = "ucan@";

/// CARv1 bytes of an encoded delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive(Vec<u8>);

impl Archive {
    /// The archive bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the archive, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Decode the delegation and the blocks carried by this archive.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationError::DecodeFailure`] if the bytes are not a
    /// delegation archive.
    pub fn extract(&self) -> Result<Extracted, DelegationError> {
        extract(&self.0)
    }
}

impl From<Vec<u8>> for Archive {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Archive {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(self))
    }
}

/// A delegation decoded from an archive, with the blocks that came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// The root delegation. Its proofs are [`Proof::Link`]s into `blocks`.
    pub delegation: Delegation,

    /// Every delegation block found in the archive, the root's included.
    pub blocks: BlockStore,
}

impl Extracted {
    /// Resolve the proof chain of the extracted delegation.
    ///
    /// # Errors
    ///
    /// See [`resolve`](crate::resolve()).
    pub fn resolve(&self, max_depth: usize) -> Result<DelegationInfo, DelegationError> {
        resolve::resolve(&self.delegation, &self.blocks, max_depth)
    }

    /// Resolve the proof chain with an explicit node budget.
    ///
    /// # Errors
    ///
    /// See [`resolve_bounded`](crate::resolve_bounded()).
    pub fn resolve_bounded(
        &self,
        max_depth: usize,
        max_nodes: usize,
    ) -> Result<DelegationInfo, DelegationError> {
        resolve::resolve_bounded(&self.delegation, &self.blocks, max_depth, max_nodes)
    }

    /// Re-encode the extracted delegation with its blocks.
    ///
    /// # Errors
    ///
    /// See [`encode_with`].
    pub fn archive(&self) -> Result<Archive, DelegationError> {
        encode_with(&self.delegation, &self.blocks)
    }
}

/// Encode a delegation and its inline proofs into an archive.
///
/// # Errors
///
/// Returns [`DelegationError::EncodeFailure`] if a block cannot be encoded.
pub fn encode(delegation: &Delegation) -> Result<Archive, DelegationError> {
    encode_with(delegation, &BlockStore::new())
}

/// Encode a delegation into an archive, including linked proof blocks that
/// `store` holds.
///
/// Proofs are walked transitively in order. Inline proofs are always
/// written. A linked proof is written only when `store` has its block, and
/// its own proofs are then walked in turn. Each block is written once.
///
/// # Errors
///
/// Returns [`DelegationError::EncodeFailure`] if a block cannot be encoded.
pub fn encode_with(delegation: &Delegation, store: &BlockStore) -> Result<Archive, DelegationError> {
    let blocks = collect_blocks(delegation, store)?;
    let Some(Block { cid: root, .. }) = blocks.first() else {
        return Err(DelegationError::encode("no delegation block to archive"));
    };

    let variant = variant_block(delegation.version(), *root)?;
    let car = car::write(
        variant.cid,
        std::iter::once(&variant)
            .chain(&blocks)
            .map(|block| (&block.cid, block.bytes.as_slice())),
    )?;

    tracing::debug!(
        root = %root,
        blocks = blocks.len(),
        size = car.len(),
        "encoded delegation archive"
    );

    Ok(Archive(car))
}

/// Render an archive as its identity CID string.
///
/// The result is a CIDv1 with the CAR codec and an identity multihash, in
/// multibase base64 (`m` prefix, no padding). Formatting the same archive
/// always yields the same string.
#[must_use]
pub fn format(archive: &Archive) -> String {
    content_id::format(&archive.0)
}

/// Parse an identity CID string back into a delegation.
///
/// Surrounding whitespace is ignored. If the text does not decode, it is
/// read once more as standard base64 wrapping an identifier, which is how
/// some tools store delegations in environment variables.
///
/// # Errors
///
/// Returns [`DelegationError::DecodeFailure`] if neither form decodes.
pub fn parse(text: &str) -> Result<Extracted, DelegationError> {
    let text = text.trim();
    let error = match parse_identifier(text) {
        Ok(extracted) => return Ok(extracted),
        Err(error) => error,
    };

    tracing::debug!(%error, "identifier did not decode, retrying as base64");

    let decoded = STANDARD.decode(text).map_err(|fallback| {
        DelegationError::DecodeFailure(format!("{error}; not base64 either: {fallback}"))
    })?;
    let inner = String::from_utf8(decoded).map_err(DelegationError::decode)?;
    parse_identifier(inner.trim())
}

fn parse_identifier(text: &str) -> Result<Extracted, DelegationError> {
    let bytes = content_id::parse(text)?;
    extract(&bytes)
}

fn extract(bytes: &[u8]) -> Result<Extracted, DelegationError> {
    let car::CarFile { roots, blocks } = car::read(bytes)?;
    let mut blocks: BlockStore = blocks.into_iter().collect();

    // The variant block only names the delegation; it is not a proof.
    let variant_cid = roots[0];
    let variant = blocks
        .remove(&variant_cid)
        .ok_or_else(|| DelegationError::DecodeFailure(format!("missing root block {variant_cid}")))?;
    let cid = variant_link(&variant)?;

    let delegation = blocks
        .get(&cid)
        .ok_or_else(|| DelegationError::DecodeFailure(format!("missing delegation block {cid}")))
        .and_then(block::decode_block)?;

    tracing::debug!(root = %cid, blocks = blocks.len(), "extracted delegation archive");
    Ok(Extracted { delegation, blocks })
}

fn variant_block(version: &str, root: Cid) -> Result<Block, DelegationError> {
    let mut variant = BTreeMap::new();
    variant.insert(format!("{VARIANT_PREFIX}{version}"), root);

    let bytes = serde_ipld_dagcbor::to_vec(&variant).map_err(DelegationError::encode)?;
    let cid = block::to_dagcbor_cid(&bytes)?;
    Ok(Block { cid, bytes })
}

fn variant_link(bytes: &[u8]) -> Result<Cid, DelegationError> {
    let variant: BTreeMap<String, Ipld> =
        serde_ipld_dagcbor::from_slice(bytes).map_err(DelegationError::decode)?;

    variant
        .iter()
        .find_map(|(key, value)| match value {
            Ipld::Link(cid) if is_supported_variant(key) => Some(*cid),
            _ => None,
        })
        .ok_or_else(|| {
            let keys: Vec<_> = variant.keys().map(String::as_str).collect();
            DelegationError::DecodeFailure(format!(
                "root block names no supported UCAN version: [{}]",
                keys.join(", ")
            ))
        })
}

fn is_supported_variant(key: &str) -> bool {
    key.strip_prefix(VARIANT_PREFIX)
        .is_some_and(|version| version == "0.9" || version.starts_with("0.9."))
}

enum Pending<'a> {
    Inline(&'a Delegation),
    Link(Cid),
}

fn collect_blocks(root: &Delegation, store: &BlockStore) -> Result<Vec<Block>, DelegationError> {
    let mut blocks = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![Pending::Inline(root)];

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Inline(delegation) => {
                let block = delegation.to_block()?;
                if !seen.insert(block.cid) {
                    continue;
                }
                blocks.push(block);
                stack.extend(delegation.proofs().iter().rev().map(|proof| match proof {
                    Proof::Inline(inner) => Pending::Inline(inner),
                    Proof::Link(cid) => Pending::Link(*cid),
                }));
            }
            Pending::Link(cid) => {
                if seen.contains(&cid) {
                    continue;
                }
                let Some(bytes) = store.get(&cid) else {
                    tracing::debug!(%cid, "proof block not available, leaving it out");
                    continue;
                };
                seen.insert(cid);
                blocks.push(Block {
                    cid,
                    bytes: bytes.to_vec(),
                });

                match block::decode_block(bytes) {
                    Ok(delegation) => stack.extend(
                        delegation
                            .proofs()
                            .iter()
                            .rev()
                            .filter_map(|proof| match proof {
                                Proof::Link(cid) => Some(Pending::Link(*cid)),
                                Proof::Inline(_) => None,
                            }),
                    ),
                    Err(error) => {
                        tracing::debug!(%cid, %error, "proof block does not decode, not walking it");
                    }
                }
            }
        }
    }

    Ok(blocks)
}
