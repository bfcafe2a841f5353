//! Errors raised while building, encoding and inspecting delegations.

/// Errors that can occur while issuing or inspecting a delegation.
///
/// Validation failures are deterministic and returned immediately. A proof
/// block missing from an archive is not an error: the resolver omits it.
#[derive(Debug, thiserror::Error)]
pub enum DelegationError {
    /// The delegation would grant no capabilities.
    #[error("delegation must grant at least one capability")]
    EmptyCapabilitySet,

    /// The requested expiration is not in the future.
    #[error("expiration {expiration} is not after the current time {now}")]
    InvalidExpiration {
        /// Requested expiration (seconds since the UNIX epoch).
        expiration: u64,
        /// Time of the check (seconds since the UNIX epoch).
        now: u64,
    },

    /// One or more abilities are not in the known registry.
    #[error("unknown capabilities: {}", .0.join(", "))]
    UnknownCapability(Vec<String>),

    /// The signer refused or failed to sign the payload.
    #[error("signing failed: {0}")]
    SigningFailure(#[source] signature::Error),

    /// The archive text or one of its blocks could not be decoded.
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// A block or archive could not be encoded.
    #[error("encode failure: {0}")]
    EncodeFailure(String),

    /// The proof chain nests deeper than the resolver allows.
    #[error("proof chain exceeds maximum depth of {max_depth}")]
    ProofChainTooDeep {
        /// Depth bound that was exceeded.
        max_depth: usize,
    },

    /// The resolved proof tree has more nodes than the resolver allows.
    ///
    /// Proof blocks may be shared, so a small archive can still describe an
    /// exponentially large tree.
    #[error("proof tree exceeds maximum of {max_nodes} delegations")]
    ProofTreeTooLarge {
        /// Node bound that was exceeded.
        max_nodes: usize,
    },
}

impl DelegationError {
    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        Self::DecodeFailure(err.to_string())
    }

    pub(crate) fn encode(err: impl std::fmt::Display) -> Self {
        Self::EncodeFailure(err.to_string())
    }
}
