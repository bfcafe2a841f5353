//! UCAN Delegation
//!
//! A delegation is an issuer's signed statement granting an audience a set of
//! capabilities, optionally backed by earlier delegations as proofs.

pub mod builder;

use crate::{
    CapabilitySpec, DelegationError,
    block::{self, Block},
    capability::Capability,
};
use ipld_core::{cid::Cid, ipld::Ipld};
use mkdelegation_credentials::{Did, Signer, Varsig};
use nonempty::NonEmpty;
use std::collections::BTreeMap;

/// A fact attached to a delegation.
pub type Fact = BTreeMap<String, Ipld>;

/// Grant of capabilities from an issuer to an audience.
///
/// Delegations are immutable once built or decoded. Use
/// [`Delegation::builder`] to issue one.
#[derive(Debug, Clone, PartialEq)]
pub struct Delegation {
    pub(crate) issuer: Did,
    pub(crate) audience: Did,
    pub(crate) version: String,
    pub(crate) capabilities: NonEmpty<Capability>,
    pub(crate) expiration: Option<u64>,
    pub(crate) not_before: u64,
    pub(crate) nonce: Option<String>,
    pub(crate) facts: Vec<Fact>,
    pub(crate) proofs: Vec<Proof>,
    pub(crate) signature: Vec<u8>,
}

impl Delegation {
    /// Start building a delegation from `issuer` to `audience`.
    pub fn builder<S: Signer>(issuer: S, audience: Did) -> builder::DelegationBuilder<S> {
        builder::DelegationBuilder::new(issuer, audience)
    }

    /// Getter for the `issuer` field.
    #[must_use]
    pub const fn issuer(&self) -> &Did {
        &self.issuer
    }

    /// Getter for the `audience` field.
    #[must_use]
    pub const fn audience(&self) -> &Did {
        &self.audience
    }

    /// Getter for the `version` field.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Getter for the `capabilities` field. Never empty.
    #[must_use]
    pub const fn capabilities(&self) -> &NonEmpty<Capability> {
        &self.capabilities
    }

    /// Getter for the `expiration` field. `None` means the delegation never
    /// expires.
    #[must_use]
    pub const fn expiration(&self) -> Option<u64> {
        self.expiration
    }

    /// Getter for the `not_before` field.
    #[must_use]
    pub const fn not_before(&self) -> u64 {
        self.not_before
    }

    /// Getter for the `nonce` field.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    /// Getter for the `facts` field.
    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Getter for the `proofs` field.
    #[must_use]
    pub fn proofs(&self) -> &[Proof] {
        &self.proofs
    }

    /// Getter for the `signature` field: the [`Varsig`] tagged signature
    /// bytes exactly as stored in the block.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The signature split into its algorithm code and raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationError::DecodeFailure`] if the stored bytes are not
    /// a tagged signature.
    pub fn varsig(&self) -> Result<Varsig, DelegationError> {
        Varsig::decode(&self.signature).map_err(DelegationError::decode)
    }

    /// Encode this delegation as a single DAG-CBOR block.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationError::EncodeFailure`] if the block cannot be
    /// serialized.
    pub fn to_block(&self) -> Result<Block, DelegationError> {
        block::encode_block(self)
    }

    /// Compute the CID of this delegation's block.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationError::EncodeFailure`] if the block cannot be
    /// serialized.
    pub fn to_cid(&self) -> Result<Cid, DelegationError> {
        Ok(self.to_block()?.cid)
    }
}

/// A proof backing a delegation.
#[derive(Debug, Clone)]
pub enum Proof {
    /// The proof delegation is carried by value.
    Inline(Delegation),

    /// The proof is referenced by the CID of its block, to be looked up in a
    /// [`BlockStore`](crate::BlockStore).
    Link(Cid),
}

impl Proof {
    /// CID of the proof block.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationError::EncodeFailure`] if an inline proof cannot be
    /// encoded.
    pub fn cid(&self) -> Result<Cid, DelegationError> {
        match self {
            Proof::Inline(delegation) => delegation.to_cid(),
            Proof::Link(cid) => Ok(*cid),
        }
    }
}

impl PartialEq for Proof {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Proof::Inline(a), Proof::Inline(b)) => a == b,
            (Proof::Link(a), Proof::Link(b)) => a == b,
            // Content addressed: an inline proof is the block its link names.
            _ => matches!((self.cid(), other.cid()), (Ok(a), Ok(b)) if a == b),
        }
    }
}

impl From<Delegation> for Proof {
    fn from(delegation: Delegation) -> Self {
        Proof::Inline(delegation)
    }
}

impl From<Cid> for Proof {
    fn from(cid: Cid) -> Self {
        Proof::Link(cid)
    }
}

/// Issue a delegation in one call.
///
/// Each capability's resource defaults to the issuer's DID. `expiration` of
/// `None` means the delegation never expires; `not_before` of `None` means
/// it is valid from the epoch.
///
/// # Errors
///
/// See [`builder::DelegationBuilder::try_build`].
pub fn delegate<S, I, C>(
    issuer: S,
    audience: Did,
    capabilities: I,
    expiration: Option<u64>,
    not_before: Option<u64>,
) -> Result<Delegation, DelegationError>
where
    S: Signer,
    I: IntoIterator<Item = C>,
    C: Into<CapabilitySpec>,
{
    let mut builder = Delegation::builder(issuer, audience).capabilities(capabilities);
    if let Some(expiration) = expiration {
        builder = builder.expiration(expiration);
    }
    if let Some(not_before) = not_before {
        builder = builder.not_before(not_before);
    }
    builder.try_build()
}
