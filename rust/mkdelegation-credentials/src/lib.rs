//! Principals and signers for UCAN delegations.
//!
//! A delegation names its issuer and audience by [DID]. This crate provides
//! the [`Did`] type used for both, the [`Principal`] and [`Signer`] traits
//! that the delegation builder depends on, a concrete Ed25519 `did:key`
//! signer, and the [`Varsig`] tag that records which algorithm signed.
//!
//! [DID]: https://www.w3.org/TR/did-core/

pub mod did;
pub mod ed25519;
pub mod signer;
pub mod varsig;

pub use did::*;
pub use ed25519::{Ed25519KeyError, Ed25519Signer};
pub use signer::*;
pub use varsig::{Varsig, VarsigError};
