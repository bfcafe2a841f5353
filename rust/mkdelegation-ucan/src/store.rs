//! In-memory block storage keyed by CID.

use crate::{Delegation, DelegationError, block::Block};
use ipld_core::cid::Cid;
use std::collections::HashMap;

/// Blocks addressed by their CID.
///
/// An archive decodes into one of these, and the resolver looks proof links
/// up in it. A missing entry is not an error for the store; callers decide
/// what an absent block means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockStore(HashMap<Cid, Vec<u8>>);

impl BlockStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `cid`, replacing any earlier entry.
    ///
    /// The CID is trusted as given.
    pub fn insert(&mut self, cid: Cid, bytes: Vec<u8>) {
        self.0.insert(cid, bytes);
    }

    /// Encode `delegation` and store its block. Returns the block CID.
    ///
    /// # Errors
    ///
    /// Returns [`DelegationError::EncodeFailure`] if the delegation cannot be
    /// encoded.
    pub fn insert_delegation(&mut self, delegation: &Delegation) -> Result<Cid, DelegationError> {
        let Block { cid, bytes } = delegation.to_block()?;
        self.insert(cid, bytes);
        Ok(cid)
    }

    /// Remove and return the bytes stored under `cid`.
    pub fn remove(&mut self, cid: &Cid) -> Option<Vec<u8>> {
        self.0.remove(cid)
    }

    /// Bytes stored under `cid`.
    #[must_use]
    pub fn get(&self, cid: &Cid) -> Option<&[u8]> {
        self.0.get(cid).map(Vec::as_slice)
    }

    /// Whether a block is stored under `cid`.
    #[must_use]
    pub fn contains(&self, cid: &Cid) -> bool {
        self.0.contains_key(cid)
    }

    /// Number of stored blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the store holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Cid, Vec<u8>)> for BlockStore {
    fn from_iter<I: IntoIterator<Item = (Cid, Vec<u8>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(Cid, Vec<u8>)> for BlockStore {
    fn extend<I: IntoIterator<Item = (Cid, Vec<u8>)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl From<Block> for BlockStore {
    fn from(block: Block) -> Self {
        Self::from_iter([(block.cid, block.bytes)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate;
    use mkdelegation_credentials::{Ed25519Signer, Principal};
    use testresult::TestResult;

    #[test]
    fn it_stores_delegations_by_cid() -> TestResult {
        let issuer = Ed25519Signer::import(&[1; 32])?;
        let audience = Ed25519Signer::import(&[2; 32])?.did();
        let delegation = delegate(&issuer, audience, ["claim/cache"], None, None)?;

        let mut store = BlockStore::new();
        assert!(store.is_empty());

        let cid = store.insert_delegation(&delegation)?;
        assert_eq!(cid, delegation.to_cid()?);
        assert!(store.contains(&cid));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&cid), Some(delegation.to_block()?.bytes.as_slice()));
        Ok(())
    }
}
