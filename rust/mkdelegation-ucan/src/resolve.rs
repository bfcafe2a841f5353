//! Proof chain resolution.
//!
//! [`resolve`] turns a delegation and the blocks that travelled with it into
//! a [`DelegationInfo`] tree for display. A proof whose block is absent, or
//! does not decode, is left out of the tree instead of failing the call.
//! Compare [`DelegationInfo::proofs`] with
//! [`DelegationInfo::proof_delegations`] to spot such gaps.
//!
//! Two bounds keep hostile archives in check: `max_depth` limits nesting,
//! and a node budget limits the size of the whole tree. The budget matters
//! because proof blocks can be shared, and every reference to a shared block
//! is expanded again.

use crate::{BlockStore, Delegation, DelegationError, Fact, Proof, block};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Serialize, Serializer};

/// Default bound on proof nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default bound on the number of delegations in one resolved tree.
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Display form of a capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityInfo {
    /// Resource.
    pub with: String,
    /// Ability.
    pub can: String,
}

/// Display-only view of a delegation and the proofs that could be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationInfo {
    /// DID of the issuer.
    pub issuer: String,

    /// DID of the audience.
    pub audience: String,

    /// UCAN version of the delegation.
    pub version: String,

    /// Expiration in seconds since the UNIX epoch. `None` never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u64>,

    /// Earliest validity in seconds since the UNIX epoch. 0 when unset.
    pub not_before: u64,

    /// Nonce, if the issuer set one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// CIDs of every proof the delegation references, resolved or not.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub proofs: Vec<String>,

    /// Proofs that were found, in reference order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub proof_delegations: Vec<DelegationInfo>,

    /// Varsig tagged signature bytes. Serialized as standard base64.
    #[serde(serialize_with = "serialize_base64")]
    pub signature: Vec<u8>,

    /// Granted capabilities, in delegation order.
    pub capabilities: Vec<CapabilityInfo>,

    /// Facts attached by the issuer.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,
}

impl DelegationInfo {
    /// Signature as standard base64.
    #[must_use]
    pub fn signature_base64(&self) -> String {
        STANDARD.encode(&self.signature)
    }

    /// Flat copy of `delegation` with proof CIDs but no resolved proofs.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationError::EncodeFailure`] if an inline proof cannot
    /// be encoded to compute its CID.
    pub fn flat(delegation: &Delegation) -> Result<Self, DelegationError> {
        let proofs = delegation
            .proofs()
            .iter()
            .map(|proof| proof.cid().map(|cid| cid.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            issuer: delegation.issuer().to_string(),
            audience: delegation.audience().to_string(),
            version: delegation.version().to_string(),
            expiration: delegation.expiration(),
            not_before: delegation.not_before(),
            nonce: delegation.nonce().map(str::to_owned),
            proofs,
            proof_delegations: Vec::new(),
            signature: delegation.signature().to_vec(),
            capabilities: delegation
                .capabilities()
                .iter()
                .map(|capability| CapabilityInfo {
                    with: capability.resource.clone(),
                    can: capability.ability.clone(),
                })
                .collect(),
            facts: delegation.facts().to_vec(),
        })
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Resolve `delegation` and its proofs into a [`DelegationInfo`] tree.
///
/// Inline proofs are resolved directly. Linked proofs are looked up in
/// `blocks`; missing or undecodable blocks are skipped. The root sits at
/// depth 0 and each proof one level below its parent. The tree may hold at
/// most [`DEFAULT_MAX_NODES`] delegations; use [`resolve_bounded`] to pick
/// another budget.
///
/// # Errors
///
/// - [`DelegationError::ProofChainTooDeep`] if any proof sits deeper than
///   `max_depth`
/// - [`DelegationError::ProofTreeTooLarge`] if the tree outgrows the node
///   budget
/// - [`DelegationError::EncodeFailure`] if an inline proof cannot be encoded
pub fn resolve(
    delegation: &Delegation,
    blocks: &BlockStore,
    max_depth: usize,
) -> Result<DelegationInfo, DelegationError> {
    resolve_bounded(delegation, blocks, max_depth, DEFAULT_MAX_NODES)
}

/// [`resolve`] with an explicit bound on the number of delegations in the
/// tree, the root included.
///
/// # Errors
///
/// See [`resolve`].
pub fn resolve_bounded(
    delegation: &Delegation,
    blocks: &BlockStore,
    max_depth: usize,
    max_nodes: usize,
) -> Result<DelegationInfo, DelegationError> {
    let mut resolver = Resolver {
        blocks,
        max_depth,
        max_nodes,
        nodes: 0,
    };
    resolver.resolve_at(delegation, 0)
}

struct Resolver<'a> {
    blocks: &'a BlockStore,
    max_depth: usize,
    max_nodes: usize,
    nodes: usize,
}

impl Resolver<'_> {
    fn resolve_at(
        &mut self,
        delegation: &Delegation,
        depth: usize,
    ) -> Result<DelegationInfo, DelegationError> {
        if depth > self.max_depth {
            return Err(DelegationError::ProofChainTooDeep {
                max_depth: self.max_depth,
            });
        }
        self.nodes += 1;
        if self.nodes > self.max_nodes {
            return Err(DelegationError::ProofTreeTooLarge {
                max_nodes: self.max_nodes,
            });
        }

        let mut info = DelegationInfo::flat(delegation)?;

        for proof in delegation.proofs() {
            let resolved = match proof {
                Proof::Inline(inner) => self.resolve_at(inner, depth + 1)?,
                Proof::Link(cid) => {
                    let Some(bytes) = self.blocks.get(cid) else {
                        tracing::debug!(%cid, depth, "proof block not found, omitting");
                        continue;
                    };
                    let inner = match block::decode_block(bytes) {
                        Ok(inner) => inner,
                        Err(error) => {
                            tracing::debug!(%cid, depth, %error, "proof block does not decode, omitting");
                            continue;
                        }
                    };
                    self.resolve_at(&inner, depth + 1)?
                }
            };
            info.proof_delegations.push(resolved);
        }

        Ok(info)
    }
}
