//! DID (Decentralized Identifier) types.

use base58::{FromBase58, ToBase58};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Multicodec tag of a DID stored as its UTF-8 string.
pub const DID_CORE: u64 = 0x0d1d;

/// A [Decentralized Identifier][did-core] naming the issuer or audience of a
/// delegation.
///
/// The value is opaque: beyond checking the `did:method:identifier` shape
/// on parse, nothing here interprets it.
///
/// [did-core]: https://www.w3.org/TR/did-core/
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Did(String);

impl Did {
    /// Wrap a string this crate constructed in `did:method:identifier` form.
    pub(crate) fn from_well_formed(did: String) -> Self {
        Did(did)
    }

    /// Get the raw DID string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the DID method name, e.g. `"key"` for `did:key:...`.
    #[must_use]
    pub fn method(&self) -> &str {
        self.0["did:".len()..].split(':').next().unwrap_or_default()
    }

    /// Binary form used for `iss` and `aud` in UCAN 0.9 blocks.
    ///
    /// A base58btc `did:key` becomes its multicodec tagged public key. Any
    /// other DID becomes [`DID_CORE`] followed by the DID string.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        if let Some(key) = self.key_bytes() {
            return key;
        }
        let mut bytes = Vec::with_capacity(self.0.len() + 2);
        // Writing into a Vec cannot fail.
        let _ = leb128::write::unsigned(&mut bytes, DID_CORE);
        bytes.extend_from_slice(self.0.as_bytes());
        bytes
    }

    /// Read the binary form written by [`Did::to_bytes`].
    ///
    /// # Errors
    ///
    /// Fails if the multicodec tag is malformed or a [`DID_CORE`] payload is
    /// not a DID string.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DidParseError> {
        let mut cursor = bytes;
        let code = leb128::read::unsigned(&mut cursor)
            .map_err(|e| DidParseError(format!("invalid principal multicodec: {e}")))?;
        if code == DID_CORE {
            let did = std::str::from_utf8(cursor)
                .map_err(|e| DidParseError(format!("principal is not UTF-8: {e}")))?;
            return did.parse();
        }
        Ok(Did(format!("did:key:z{}", bytes.to_base58())))
    }

    fn key_bytes(&self) -> Option<Vec<u8>> {
        let key = self.0.strip_prefix("did:key:z")?.from_base58().ok()?;
        let code = leb128::read::unsigned(&mut key.as_slice()).ok()?;
        (code != DID_CORE).then_some(key)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error when parsing a DID string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid DID: {0}")]
pub struct DidParseError(pub String);

impl FromStr for Did {
    type Err = DidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(rest) = s.strip_prefix("did:") else {
            return Err(DidParseError(format!("expected did: prefix, got: {s}")));
        };
        match rest.split_once(':') {
            Some((method, id)) if !method.is_empty() && !id.is_empty() => Ok(Did(s.to_string())),
            _ => Err(DidParseError(format!(
                "expected did:method:identifier, got: {s}"
            ))),
        }
    }
}

impl TryFrom<String> for Did {
    type Error = DidParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Serialize for Did {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An entity identified by a [`Did`].
///
/// Implemented by anything that has a DID: signers, verifiers, and the
/// [`Did`] itself.
pub trait Principal {
    /// Returns this entity's DID.
    fn did(&self) -> Did;
}

impl Principal for Did {
    fn did(&self) -> Did {
        self.clone()
    }
}

impl<P: Principal + ?Sized> Principal for &P {
    fn did(&self) -> Did {
        (**self).did()
    }
}
