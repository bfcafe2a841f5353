//! CARv1 reading and writing.
//!
//! Layout: a varint-prefixed DAG-CBOR header `{roots, version: 1}` followed
//! by sections of `varint(len) || cid || block bytes`.

use super::content_id::{read_varint, write_varint};
use crate::{
    DelegationError,
    block::{SHA2_256, to_dagcbor_cid},
};
use ipld_core::cid::Cid;
use serde::{Deserialize, Serialize};

const CAR_VERSION: u64 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CarHeader {
    roots: Vec<Cid>,
    version: u64,
}

/// Decoded CAR contents, blocks in file order.
#[derive(Debug)]
pub(crate) struct CarFile {
    pub roots: Vec<Cid>,
    pub blocks: Vec<(Cid, Vec<u8>)>,
}

/// Write a CAR with a single root.
pub(crate) fn write<'a, I>(root: Cid, blocks: I) -> Result<Vec<u8>, DelegationError>
where
    I: IntoIterator<Item = (&'a Cid, &'a [u8])>,
{
    let header = serde_ipld_dagcbor::to_vec(&CarHeader {
        roots: vec![root],
        version: CAR_VERSION,
    })
    .map_err(DelegationError::encode)?;

    let mut out = Vec::new();
    write_varint(&mut out, header.len() as u64);
    out.extend_from_slice(&header);

    for (cid, bytes) in blocks {
        let cid = cid.to_bytes();
        write_varint(&mut out, (cid.len() + bytes.len()) as u64);
        out.extend_from_slice(&cid);
        out.extend_from_slice(bytes);
    }

    Ok(out)
}

/// Read a CAR, checking SHA2-256 block digests.
pub(crate) fn read(bytes: &[u8]) -> Result<CarFile, DelegationError> {
    let mut cursor = bytes;

    let header = take_section(&mut cursor)?;
    let header: CarHeader =
        serde_ipld_dagcbor::from_slice(header).map_err(DelegationError::decode)?;
    if header.version != CAR_VERSION {
        return Err(DelegationError::DecodeFailure(format!(
            "unsupported CAR version {}",
            header.version
        )));
    }
    if header.roots.is_empty() {
        return Err(DelegationError::decode("CAR has no roots"));
    }

    let mut blocks = Vec::new();
    while !cursor.is_empty() {
        let mut section = take_section(&mut cursor)?;
        let cid = Cid::read_bytes(&mut section).map_err(DelegationError::decode)?;
        let data = section.to_vec();

        if cid.hash().code() == SHA2_256 && to_dagcbor_cid(&data)?.hash() != cid.hash() {
            return Err(DelegationError::DecodeFailure(format!(
                "block {cid} does not match its digest"
            )));
        }
        tracing::trace!(%cid, size = data.len(), "read CAR block");
        blocks.push((cid, data));
    }

    Ok(CarFile {
        roots: header.roots,
        blocks,
    })
}

fn take_section<'a>(cursor: &mut &'a [u8]) -> Result<&'a [u8], DelegationError> {
    let length = usize::try_from(read_varint(cursor)?).map_err(DelegationError::decode)?;
    if cursor.len() < length {
        return Err(DelegationError::DecodeFailure(format!(
            "CAR section declares {length} bytes, {} remain",
            cursor.len()
        )));
    }
    let (section, rest) = cursor.split_at(length);
    *cursor = rest;
    Ok(section)
}
