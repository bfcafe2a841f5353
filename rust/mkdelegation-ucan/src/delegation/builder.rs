//! Typesafe builder for [`Delegation`].

use super::{Delegation, Fact, Proof};
use crate::{Capability, CapabilitySpec, DelegationError, UCAN_VERSION, block};
use mkdelegation_credentials::{Did, Signer, Varsig};
use nonempty::NonEmpty;
use std::time::{SystemTime, UNIX_EPOCH};

/// Builder for a [`Delegation`].
///
/// The issuer signs the delegation when [`try_build`](Self::try_build) is
/// called; nothing is signed before that.
#[derive(Debug, Clone)]
pub struct DelegationBuilder<S> {
    issuer: S,
    audience: Did,
    capabilities: Vec<CapabilitySpec>,
    resource: Option<String>,
    expiration: Option<u64>,
    not_before: Option<u64>,
    nonce: Option<String>,
    facts: Vec<Fact>,
    proofs: Vec<Proof>,
}

impl<S: Signer> DelegationBuilder<S> {
    /// Create a builder with no capabilities.
    pub fn new(issuer: S, audience: Did) -> Self {
        Self {
            issuer,
            audience,
            capabilities: Vec::new(),
            resource: None,
            expiration: None,
            not_before: None,
            nonce: None,
            facts: Vec::new(),
            proofs: Vec::new(),
        }
    }

    /// Add a capability.
    #[must_use]
    pub fn capability(mut self, capability: impl Into<CapabilitySpec>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Add several capabilities, keeping their order.
    #[must_use]
    pub fn capabilities<I, C>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CapabilitySpec>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Resource for capabilities that do not name their own. Defaults to the
    /// issuer's DID.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Expiration in seconds since the UNIX epoch. Must be in the future.
    #[must_use]
    pub fn expiration(mut self, expiration: u64) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Earliest validity in seconds since the UNIX epoch.
    #[must_use]
    pub fn not_before(mut self, not_before: u64) -> Self {
        self.not_before = Some(not_before);
        self
    }

    /// Attach a nonce.
    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Attach a fact.
    #[must_use]
    pub fn fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }

    /// Attach a proof. Proof order is preserved.
    #[must_use]
    pub fn proof(mut self, proof: impl Into<Proof>) -> Self {
        self.proofs.push(proof.into());
        self
    }

    /// Validate the fields, sign them and return the delegation.
    ///
    /// # Errors
    ///
    /// - [`DelegationError::EmptyCapabilitySet`] if no capability was added
    /// - [`DelegationError::InvalidExpiration`] if the expiration is not
    ///   strictly after the current time
    /// - [`DelegationError::SigningFailure`] if the issuer fails to sign
    /// - [`DelegationError::EncodeFailure`] if the payload cannot be encoded,
    ///   or the issuer's signature algorithm has no JWT name
    pub fn try_build(self) -> Result<Delegation, DelegationError> {
        let specs =
            NonEmpty::from_vec(self.capabilities).ok_or(DelegationError::EmptyCapabilitySet)?;

        if let Some(expiration) = self.expiration {
            let now = now();
            if expiration <= now {
                return Err(DelegationError::InvalidExpiration { expiration, now });
            }
        }

        let issuer = self.issuer.did();
        let resource = self.resource.unwrap_or_else(|| issuer.to_string());
        let capabilities = specs.map(|spec| {
            Capability::new(spec.ability, spec.resource.unwrap_or_else(|| resource.clone()))
        });

        let mut delegation = Delegation {
            issuer,
            audience: self.audience,
            version: UCAN_VERSION.to_string(),
            capabilities,
            expiration: self.expiration,
            not_before: self.not_before.unwrap_or(0),
            nonce: self.nonce,
            facts: self.facts,
            proofs: self.proofs,
            signature: Vec::new(),
        };

        let code = self.issuer.signature_code();
        let payload = block::signing_payload(&delegation, code)?;
        let raw = self
            .issuer
            .sign(&payload)
            .map_err(DelegationError::SigningFailure)?;
        delegation.signature = Varsig::new(code, raw).encode();

        tracing::debug!(
            issuer = %delegation.issuer,
            audience = %delegation.audience,
            capabilities = delegation.capabilities.len(),
            proofs = delegation.proofs.len(),
            "signed delegation"
        );

        Ok(delegation)
    }
}

/// Current time in seconds since the UNIX epoch.
pub(crate) fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
