//! Identity CIDs over archive bytes.
//!
//! The CID is written by hand because its "digest" is the whole archive,
//! which does not fit the fixed-size multihash that [`ipld_core::cid::Cid`]
//! carries.

use crate::DelegationError;
use base58::FromBase58;
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};

/// Multicodec code for a CAR archive.
pub const CAR: u64 = 0x0202;

/// Multihash code for the identity function.
pub const IDENTITY: u64 = 0x00;

const CID_V1: u64 = 1;

/// Render `payload` as a multibase base64 CIDv1 with the CAR codec and an
/// identity multihash.
pub(crate) fn format(payload: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(payload.len() + 16);
    write_varint(&mut bytes, CID_V1);
    write_varint(&mut bytes, CAR);
    write_varint(&mut bytes, IDENTITY);
    write_varint(&mut bytes, payload.len() as u64);
    bytes.extend_from_slice(payload);

    format!("m{}", STANDARD_NO_PAD.encode(bytes))
}

/// Recover the archive bytes from an identity CID string.
pub(crate) fn parse(text: &str) -> Result<Vec<u8>, DelegationError> {
    let bytes = decode_multibase(text)?;
    let mut cursor = bytes.as_slice();

    let version = read_varint(&mut cursor)?;
    if version != CID_V1 {
        return Err(DelegationError::DecodeFailure(format!(
            "unsupported CID version {version}"
        )));
    }

    let codec = read_varint(&mut cursor)?;
    if codec != CAR {
        return Err(DelegationError::DecodeFailure(format!(
            "expected CAR codec 0x{CAR:x}, found 0x{codec:x}"
        )));
    }

    let hash = read_varint(&mut cursor)?;
    if hash != IDENTITY {
        return Err(DelegationError::DecodeFailure(format!(
            "not an identity CID: multihash code 0x{hash:x}"
        )));
    }

    let length = read_varint(&mut cursor)?;
    if length != cursor.len() as u64 {
        return Err(DelegationError::DecodeFailure(format!(
            "identity digest declares {length} bytes, found {}",
            cursor.len()
        )));
    }

    Ok(cursor.to_vec())
}

fn decode_multibase(text: &str) -> Result<Vec<u8>, DelegationError> {
    let mut chars = text.chars();
    let prefix = chars.next();
    let body = chars.as_str();

    match prefix {
        Some('m') => STANDARD_NO_PAD.decode(body).map_err(DelegationError::decode),
        Some('M') => STANDARD.decode(body).map_err(DelegationError::decode),
        Some('u') => URL_SAFE_NO_PAD.decode(body).map_err(DelegationError::decode),
        Some('U') => URL_SAFE.decode(body).map_err(DelegationError::decode),
        Some('z') => body
            .from_base58()
            .map_err(|e| DelegationError::DecodeFailure(format!("invalid base58btc: {e:?}"))),
        Some(other) => Err(DelegationError::DecodeFailure(format!(
            "unsupported multibase prefix '{other}'"
        ))),
        None => Err(DelegationError::decode("empty identifier")),
    }
}

pub(super) fn write_varint(out: &mut Vec<u8>, value: u64) {
    // Writing into a Vec cannot fail.
    let _ = leb128::write::unsigned(out, value);
}

pub(super) fn read_varint(cursor: &mut &[u8]) -> Result<u64, DelegationError> {
    leb128::read::unsigned(cursor).map_err(DelegationError::decode)
}
