//! UCAN delegation issuing and inspection.
//!
//! This crate builds signed UCAN delegations, packs a delegation together
//! with every proof block it can reach into a CAR archive, and renders that
//! archive as a single self-describing string: a CIDv1 whose multihash uses
//! the identity function, so the "digest" is the archive itself.
//!
//! # Overview
//!
//! Issuing flows one way:
//!
//! 1. [`DelegationBuilder`] signs the capability grant
//! 2. [`archive::encode`] writes the delegation and its proofs into a CAR
//! 3. [`archive::format`] wraps the CAR in an identity CID string
//!
//! Inspection runs in reverse:
//!
//! 1. [`archive::parse`] decodes the string back into a [`Delegation`] and
//!    the [`BlockStore`] of blocks it carried
//! 2. [`resolve`] walks the proofs into a [`DelegationInfo`] tree
//!
//! # Example
//!
//! ```
//! use mkdelegation_credentials::{Ed25519Signer, Principal};
//! use mkdelegation_ucan::{archive, resolve, CapabilitySpec, Delegation, DEFAULT_MAX_DEPTH};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = Ed25519Signer::import(&[1; 32])?;
//! let audience = Ed25519Signer::import(&[2; 32])?.did();
//!
//! let delegation = Delegation::builder(&issuer, audience)
//!     .capability(CapabilitySpec::new("blob/allocate"))
//!     .capability(CapabilitySpec::new("blob/accept"))
//!     .try_build()?;
//!
//! let text = archive::format(&archive::encode(&delegation)?);
//! let extracted = archive::parse(&text)?;
//! assert_eq!(extracted.delegation, delegation);
//!
//! let info = resolve(&extracted.delegation, &extracted.blocks, DEFAULT_MAX_DEPTH)?;
//! assert_eq!(info.capabilities.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod block;
pub mod capability;
pub mod delegation;
pub mod error;
pub mod preset;
pub mod resolve;
pub mod store;
pub mod validator;

pub use archive::{Archive, Extracted};
pub use capability::{Capability, CapabilitySpec};
pub use delegation::{Delegation, Fact, Proof, builder::DelegationBuilder, delegate};
pub use error::DelegationError;
pub use resolve::{
    CapabilityInfo, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, DelegationInfo, resolve, resolve_bounded,
};
pub use store::BlockStore;
pub use validator::{KnownAbilities, validate};

/// UCAN version written into every delegation this crate issues.
pub const UCAN_VERSION: &str = "0.9.1";
