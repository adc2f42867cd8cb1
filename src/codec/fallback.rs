//! Generic structural encoding and magic dispatch

use super::{decode_strings, decode_timestamp, reserved_magic_of, CodecError, Decoded};
use crate::types::Timestamp;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A blob after magic dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBlob<'a> {
    Strings(Option<Vec<String>>),
    Timestamp(Timestamp),
    /// No reserved magic; the bytes are a generic structural encoding
    Generic(&'a [u8]),
}

/// Encode any serializable value with the generic structural format
pub fn encode_generic<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    let encoded = bincode::serialize(value)?;
    if let Some(magic) = reserved_magic_of(&encoded) {
        return Err(CodecError::ReservedMagic(
            String::from_utf8_lossy(magic).into_owned(),
        ));
    }
    Ok(encoded)
}

pub fn decode_generic<T: DeserializeOwned>(raw: &[u8]) -> Result<T, CodecError> {
    Ok(bincode::deserialize(raw)?)
}

/// Try every specialised format, then fall back to the generic one
pub fn decode_blob(raw: &[u8]) -> Result<DecodedBlob<'_>, CodecError> {
    if let Decoded::Handled(values) = decode_strings(raw)? {
        return Ok(DecodedBlob::Strings(values));
    }
    if let Decoded::Handled(ts) = decode_timestamp(raw)? {
        return Ok(DecodedBlob::Timestamp(ts));
    }
    Ok(DecodedBlob::Generic(raw))
}
