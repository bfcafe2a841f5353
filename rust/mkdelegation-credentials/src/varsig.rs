//! Signatures tagged with their algorithm, as stored in UCAN 0.9 blocks.
//!
//! The encoding is `varint(code) | varint(raw length) | raw signature`, with
//! the algorithm codes of the [varsig] multicodec range.
//!
//! [varsig]: https://github.com/ChainAgnostic/varsig/blob/main/README.md

use thiserror::Error;

/// Signature whose algorithm has no JWT name.
pub const NON_STANDARD: u64 = 0xd000;
/// ECDSA over secp256k1.
pub const ES256K: u64 = 0xd0e7;
/// Ed25519.
pub const EDDSA: u64 = 0xd0ed;
/// ECDSA over P-256.
pub const ES256: u64 = 0xd01200;
/// RSASSA-PKCS1-v1_5 with SHA-256.
pub const RS256: u64 = 0xd01205;

/// Errors from decoding a tagged signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VarsigError {
    /// A varint could not be read.
    #[error("invalid signature varint: {0}")]
    InvalidVarint(String),

    /// The declared length does not match the bytes that follow it.
    #[error("signature declares {declared} bytes, found {found}")]
    LengthMismatch {
        /// Length written in the header.
        declared: u64,
        /// Bytes actually present.
        found: usize,
    },
}

/// A raw signature and the code of the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Varsig {
    code: u64,
    raw: Vec<u8>,
}

impl Varsig {
    /// Tag `raw` with algorithm `code`.
    pub fn new(code: u64, raw: Vec<u8>) -> Self {
        Self { code, raw }
    }

    /// Algorithm code.
    #[must_use]
    pub fn code(&self) -> u64 {
        self.code
    }

    /// Signature bytes without the tag.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// JWT `alg` name of the algorithm, if it has one.
    #[must_use]
    pub fn algorithm(&self) -> Option<&'static str> {
        algorithm_name(self.code)
    }

    /// Tagged bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.raw.len() + 6);
        // Writing into a Vec cannot fail.
        let _ = leb128::write::unsigned(&mut bytes, self.code);
        let _ = leb128::write::unsigned(&mut bytes, self.raw.len() as u64);
        bytes.extend_from_slice(&self.raw);
        bytes
    }

    /// Read tagged bytes back.
    ///
    /// # Errors
    ///
    /// Fails if either varint is malformed or the length does not cover
    /// exactly the remaining bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, VarsigError> {
        let mut cursor = bytes;
        let code = leb128::read::unsigned(&mut cursor)
            .map_err(|e| VarsigError::InvalidVarint(e.to_string()))?;
        let declared = leb128::read::unsigned(&mut cursor)
            .map_err(|e| VarsigError::InvalidVarint(e.to_string()))?;
        if declared != cursor.len() as u64 {
            return Err(VarsigError::LengthMismatch {
                declared,
                found: cursor.len(),
            });
        }
        Ok(Self::new(code, cursor.to_vec()))
    }
}

/// JWT `alg` name for a signature algorithm code.
#[must_use]
pub fn algorithm_name(code: u64) -> Option<&'static str> {
    match code {
        EDDSA => Some("EdDSA"),
        ES256K => Some("ES256K"),
        ES256 => Some("ES256"),
        RS256 => Some("RS256"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    #[test]
    fn ed25519_signatures_carry_the_eddsa_tag() -> TestResult {
        let varsig = Varsig::new(EDDSA, vec![7; 64]);
        let bytes = varsig.encode();

        assert_eq!(&bytes[..4], &[0xed, 0xa1, 0x03, 0x40]);
        assert_eq!(bytes.len(), 68);
        assert_eq!(Varsig::decode(&bytes)?, varsig);
        assert_eq!(varsig.algorithm(), Some("EdDSA"));
        Ok(())
    }

    #[test]
    fn it_rejects_a_wrong_length() {
        let mut bytes = Varsig::new(EDDSA, vec![1; 64]).encode();
        bytes.pop();
        assert_eq!(
            Varsig::decode(&bytes),
            Err(VarsigError::LengthMismatch {
                declared: 64,
                found: 63
            })
        );
        assert!(matches!(
            Varsig::decode(&[0x80]),
            Err(VarsigError::InvalidVarint(_))
        ));
    }

    #[test]
    fn non_standard_codes_have_no_jwt_name() {
        assert_eq!(algorithm_name(NON_STANDARD), None);
        assert_eq!(algorithm_name(RS256), Some("RS256"));
    }
}
