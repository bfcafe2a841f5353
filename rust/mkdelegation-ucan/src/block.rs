//! DAG-CBOR block encoding for delegations.
//!
//! A delegation block is a DAG-CBOR map keyed with the UCAN 0.9 field names
//! (`v`, `iss`, `aud`, `att`, `exp`, `nbf`, `nnc`, `fct`, `prf`, `s`), laid
//! out as `dag-ucan` does:
//!
//! - `iss` and `aud` hold the binary principal ([`Did::to_bytes`])
//! - `s` holds the [`Varsig`] tagged signature
//! - `exp` is always present, `null` when the delegation never expires
//!
//! Proofs are always written as links, so a block never embeds another
//! delegation.
//!
//! The issuer does not sign the block. It signs the JWT form of the same
//! fields, `base64url(header) "." base64url(payload)`, so that the signature
//! checks out against any UCAN 0.9 implementation.

use crate::{Capability, Delegation, DelegationError, Fact, Proof};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use ipld_core::cid::{Cid, multihash::Multihash};
use mkdelegation_credentials::{Did, Varsig, varsig};
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

/// Multicodec code for DAG-CBOR.
pub const DAG_CBOR: u64 = 0x71;

/// Multihash code for SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// An encoded delegation and its content address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// CIDv1 of `bytes` (DAG-CBOR, SHA2-256).
    pub cid: Cid,

    /// DAG-CBOR encoding of the delegation.
    pub bytes: Vec<u8>,
}

#[derive(Serialize)]
struct BlockFields<'a> {
    v: &'a str,
    iss: ByteBuf,
    aud: ByteBuf,
    att: Vec<&'a Capability>,
    exp: Option<u64>,
    #[serde(skip_serializing_if = "is_zero")]
    nbf: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    nnc: Option<&'a str>,
    fct: &'a [Fact],
    prf: Vec<Cid>,
    s: &'a serde_bytes::Bytes,
}

#[derive(Deserialize)]
struct RawBlock {
    v: String,
    iss: ByteBuf,
    aud: ByteBuf,
    att: Vec<Capability>,
    #[serde(default)]
    exp: Option<u64>,
    #[serde(default)]
    nbf: Option<u64>,
    #[serde(default)]
    nnc: Option<String>,
    #[serde(default)]
    fct: Vec<Fact>,
    #[serde(default)]
    prf: Vec<Cid>,
    s: ByteBuf,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &u64) -> bool {
    *value == 0
}

fn proof_links(delegation: &Delegation) -> Result<Vec<Cid>, DelegationError> {
    delegation.proofs.iter().map(Proof::cid).collect()
}

/// Bytes the issuer signs for a signature with algorithm `code`.
///
/// Keys are written in sorted order with no whitespace. Empty facts, an
/// absent nonce and a zero not-before are left out.
pub(crate) fn signing_payload(delegation: &Delegation, code: u64) -> Result<Vec<u8>, DelegationError> {
    let alg = varsig::algorithm_name(code).ok_or_else(|| {
        DelegationError::EncodeFailure(format!("signature algorithm {code:#x} has no JWT name"))
    })?;
    let header = json!({ "alg": alg, "typ": "JWT", "ucv": delegation.version });

    let mut payload = Map::new();
    let att: Vec<&Capability> = delegation.capabilities.iter().collect();
    payload.insert("att".into(), serde_json::to_value(att).map_err(DelegationError::encode)?);
    payload.insert("aud".into(), Value::from(delegation.audience.as_str()));
    payload.insert("exp".into(), delegation.expiration.map_or(Value::Null, Value::from));
    if !delegation.facts.is_empty() {
        let fct = serde_json::to_value(&delegation.facts).map_err(DelegationError::encode)?;
        payload.insert("fct".into(), fct);
    }
    payload.insert("iss".into(), Value::from(delegation.issuer.as_str()));
    if delegation.not_before != 0 {
        payload.insert("nbf".into(), Value::from(delegation.not_before));
    }
    if let Some(nonce) = delegation.nonce.as_deref().filter(|nonce| !nonce.is_empty()) {
        payload.insert("nnc".into(), Value::from(nonce));
    }
    let prf = proof_links(delegation)?
        .iter()
        .map(|cid| Value::from(cid.to_string()))
        .collect();
    payload.insert("prf".into(), Value::Array(prf));

    let header = serde_json::to_vec(&header).map_err(DelegationError::encode)?;
    let payload = serde_json::to_vec(&payload).map_err(DelegationError::encode)?;
    Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(header), URL_SAFE_NO_PAD.encode(payload)).into_bytes())
}

/// Encode a delegation as a DAG-CBOR block.
///
/// # Errors
///
/// Returns [`DelegationError::EncodeFailure`] if the delegation or one of its
/// inline proofs cannot be serialized.
pub fn encode_block(delegation: &Delegation) -> Result<Block, DelegationError> {
    let fields = BlockFields {
        v: &delegation.version,
        iss: ByteBuf::from(delegation.issuer.to_bytes()),
        aud: ByteBuf::from(delegation.audience.to_bytes()),
        att: delegation.capabilities.iter().collect(),
        exp: delegation.expiration,
        nbf: delegation.not_before,
        nnc: delegation.nonce.as_deref(),
        fct: &delegation.facts,
        prf: proof_links(delegation)?,
        s: serde_bytes::Bytes::new(&delegation.signature),
    };

    let bytes = serde_ipld_dagcbor::to_vec(&fields).map_err(DelegationError::encode)?;
    let cid = to_dagcbor_cid(&bytes)?;
    Ok(Block { cid, bytes })
}

/// Decode a delegation from a DAG-CBOR block.
///
/// Every proof of the decoded delegation is a [`Proof::Link`]. An empty
/// nonce reads as no nonce.
///
/// # Errors
///
/// Returns [`DelegationError::DecodeFailure`] if the bytes are not a
/// delegation block, name a malformed principal, carry an untagged
/// signature, or grant no capabilities.
pub fn decode_block(bytes: &[u8]) -> Result<Delegation, DelegationError> {
    let raw: RawBlock = serde_ipld_dagcbor::from_slice(bytes).map_err(DelegationError::decode)?;
    let capabilities = NonEmpty::from_vec(raw.att)
        .ok_or_else(|| DelegationError::decode("delegation block grants no capabilities"))?;
    let issuer = Did::from_bytes(&raw.iss).map_err(DelegationError::decode)?;
    let audience = Did::from_bytes(&raw.aud).map_err(DelegationError::decode)?;
    Varsig::decode(&raw.s).map_err(DelegationError::decode)?;

    Ok(Delegation {
        issuer,
        audience,
        version: raw.v,
        capabilities,
        expiration: raw.exp,
        not_before: raw.nbf.unwrap_or(0),
        nonce: raw.nnc.filter(|nonce| !nonce.is_empty()),
        facts: raw.fct,
        proofs: raw.prf.into_iter().map(Proof::Link).collect(),
        signature: raw.s.into_vec(),
    })
}

/// CIDv1 of a DAG-CBOR block hashed with SHA2-256.
///
/// # Errors
///
/// Returns [`DelegationError::EncodeFailure`] if the digest cannot be wrapped
/// as a multihash.
pub fn to_dagcbor_cid(bytes: &[u8]) -> Result<Cid, DelegationError> {
    let digest = Sha256::digest(bytes);
    let multihash = Multihash::wrap(SHA2_256, &digest).map_err(DelegationError::encode)?;
    Ok(Cid::new_v1(DAG_CBOR, multihash))
}
