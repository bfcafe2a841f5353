//! Service-to-service delegations used when standing up a storage network.
//!
//! Each preset grants a fixed ability set, scoped to the issuer, with no
//! expiration.

use crate::{Delegation, DelegationError, delegate};
use mkdelegation_credentials::{Principal, Signer};

/// `assert/equals`
pub const ASSERT_EQUALS: &str = "assert/equals";
/// `assert/index`
pub const ASSERT_INDEX: &str = "assert/index";
/// `blob/allocate`
pub const BLOB_ALLOCATE: &str = "blob/allocate";
/// `blob/accept`
pub const BLOB_ACCEPT: &str = "blob/accept";
/// `claim/cache`
pub const CLAIM_CACHE: &str = "claim/cache";

/// Abilities the indexing service grants the upload service.
pub const INDEXING_TO_UPLOAD: &[&str] = &[ASSERT_EQUALS, ASSERT_INDEX];
/// Abilities a storage node grants the upload service.
pub const STORAGE_TO_UPLOAD: &[&str] = &[BLOB_ALLOCATE, BLOB_ACCEPT];
/// Abilities the indexing service grants a storage node.
pub const INDEXING_TO_STORAGE: &[&str] = &[CLAIM_CACHE];

/// Let the upload service publish equals and index claims on the indexer.
///
/// # Errors
///
/// See [`delegate`].
pub fn indexing_to_upload<S: Signer>(
    indexer: S,
    upload: &impl Principal,
) -> Result<Delegation, DelegationError> {
    delegate(indexer, upload.did(), INDEXING_TO_UPLOAD.iter().copied(), None, None)
}

/// Let the upload service allocate and accept blobs on a storage node.
///
/// # Errors
///
/// See [`delegate`].
pub fn storage_to_upload<S: Signer>(
    storage: S,
    upload: &impl Principal,
) -> Result<Delegation, DelegationError> {
    delegate(storage, upload.did(), STORAGE_TO_UPLOAD.iter().copied(), None, None)
}

/// Let a storage node ask the indexer to cache location claims.
///
/// # Errors
///
/// See [`delegate`].
pub fn indexing_to_storage<S: Signer>(
    indexer: S,
    storage: &impl Principal,
) -> Result<Delegation, DelegationError> {
    delegate(indexer, storage.did(), INDEXING_TO_STORAGE.iter().copied(), None, None)
}
