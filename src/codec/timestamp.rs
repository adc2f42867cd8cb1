//! Timestamp framing
//!
//! Payload after the magic:
//!
//! ```text
//! version=1 | i64 BE seconds since 0001-01-01T00:00:00Z | i32 BE nanos | i16 BE offset minutes
//! version=2 | same as version 1                                          | i8 offset seconds
//! ```
//!
//! An offset of -1 minutes marks UTC. The stored seconds are absolute, so the
//! offset only matters for display and is dropped on decode.

use super::{has_magic, CodecError, Decoded, TIMESTAMP_MAGIC};
use crate::types::Timestamp;

/// Seconds between 0001-01-01 and 1970-01-01
const UNIX_TO_ABSOLUTE: i64 = 62_135_596_800;

const VERSION_V1: u8 = 1;
const VERSION_V2: u8 = 2;
const V1_LEN: usize = 15;
const V2_LEN: usize = 16;
const UTC_OFFSET: i16 = -1;

pub fn encode_timestamp(value: &Timestamp) -> Result<Vec<u8>, CodecError> {
    let secs = value
        .as_secs()
        .checked_add(UNIX_TO_ABSOLUTE)
        .ok_or_else(|| CodecError::InvalidTimestamp("seconds out of range".into()))?;

    let mut buf = Vec::with_capacity(TIMESTAMP_MAGIC.len() + V1_LEN);
    buf.extend_from_slice(TIMESTAMP_MAGIC);
    buf.push(VERSION_V1);
    buf.extend_from_slice(&secs.to_be_bytes());
    buf.extend_from_slice(&(value.subsec_nanos() as i32).to_be_bytes());
    buf.extend_from_slice(&UTC_OFFSET.to_be_bytes());
    Ok(buf)
}

pub fn decode_timestamp(raw: &[u8]) -> Result<Decoded<Timestamp>, CodecError> {
    if !has_magic(raw, TIMESTAMP_MAGIC) {
        return Ok(Decoded::Unhandled);
    }

    let payload = &raw[TIMESTAMP_MAGIC.len()..];
    let version = *payload
        .first()
        .ok_or_else(|| CodecError::InvalidTimestamp("missing version".into()))?;

    let expected_len = match version {
        VERSION_V1 => V1_LEN,
        VERSION_V2 => V2_LEN,
        other => {
            return Err(CodecError::InvalidTimestamp(format!("unsupported version {}", other)))
        }
    };
    if payload.len() != expected_len {
        return Err(CodecError::InvalidTimestamp(format!(
            "expected {} bytes, found {}",
            expected_len,
            payload.len()
        )));
    }

    let secs = i64::from_be_bytes(read_array(&payload[1..9]));
    let nanos = i32::from_be_bytes(read_array(&payload[9..13]));
    if !(0..Timestamp::NANOS_PER_SEC as i32).contains(&nanos) {
        return Err(CodecError::InvalidTimestamp(format!("nanoseconds {} out of range", nanos)));
    }

    let unix_secs = secs
        .checked_sub(UNIX_TO_ABSOLUTE)
        .filter(|s| (Timestamp::MIN_SECS..=Timestamp::MAX_SECS).contains(s))
        .ok_or_else(|| CodecError::InvalidTimestamp(format!("seconds {} out of range", secs)))?;

    Ok(Decoded::Handled(Timestamp::new(unix_secs, nanos as u32)))
}

fn read_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
