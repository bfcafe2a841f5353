//! Signature creation.

use crate::did::{Did, Principal};

/// Produces a signature over canonical payload bytes on behalf of a
/// [`Principal`].
///
/// Implementations may be probabilistic internally; only the returned
/// signature bytes may depend on that.
pub trait Signer: Principal {
    /// Sign `payload` and return the raw signature bytes.
    ///
    /// # Errors
    ///
    /// Returns [`signature::Error`] if the underlying key cannot sign.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, signature::Error>;

    /// [Varsig](crate::varsig) code of the signatures this signer produces.
    fn signature_code(&self) -> u64;
}

impl<S: Signer + ?Sized> Signer for &S {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, signature::Error> {
        (**self).sign(payload)
    }

    fn signature_code(&self) -> u64 {
        (**self).signature_code()
    }
}

/// A signer that reports a different DID than the key it signs with.
///
/// Used to issue delegations as a `did:web` service identity while signing
/// with that service's `did:key`.
#[derive(Debug, Clone)]
pub struct WrappedSigner<S> {
    did: Did,
    signer: S,
}

impl<S: Signer> WrappedSigner<S> {
    /// Wrap `signer` so that it identifies as `did`.
    pub fn new(signer: S, did: Did) -> Self {
        Self { did, signer }
    }

    /// The DID of the key that actually produces signatures.
    pub fn key(&self) -> Did {
        self.signer.did()
    }
}

impl<S> Principal for WrappedSigner<S> {
    fn did(&self) -> Did {
        self.did.clone()
    }
}

impl<S: Signer> Signer for WrappedSigner<S> {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, signature::Error> {
        self.signer.sign(payload)
    }

    fn signature_code(&self) -> u64 {
        self.signer.signature_code()
    }
}
