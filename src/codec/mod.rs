//! Blob codecs for non-scalar field values
//!
//! Specialised formats start with a 4-byte ASCII magic so a reader can tell
//! them apart from the generic structural encoding, which carries no prefix:
//!
//! - string sequences: `GMS1 | flags | uvarint count | (uvarint len | bytes)*`
//! - timestamps: `GMT1 | fixed binary timestamp`
//! - anything else: bincode, refused if it would start with a reserved magic
//!
//! Decoders return [`Decoded::Unhandled`] when the magic does not match, so
//! callers can fall through to the next format.

mod fallback;
mod strings;
mod timestamp;
pub mod varint;

pub use fallback::{decode_blob, decode_generic, encode_generic, DecodedBlob};
pub use strings::{decode_strings, encode_strings};
pub use timestamp::{decode_timestamp, encode_timestamp};

use thiserror::Error;

/// Magic of the string sequence framing
pub const STRING_SEQ_MAGIC: &[u8; 4] = b"GMS1";

/// Magic of the timestamp framing
pub const TIMESTAMP_MAGIC: &[u8; 4] = b"GMT1";

/// Every magic reserved by a specialised format
pub const RESERVED_MAGICS: [&[u8; 4]; 2] = [STRING_SEQ_MAGIC, TIMESTAMP_MAGIC];

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("truncated {0}")]
    Truncated(&'static str),

    #[error("invalid varint in {0}")]
    InvalidVarint(&'static str),

    #[error("{0} trailing bytes after payload")]
    TrailingData(usize),

    #[error("element is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid timestamp payload: {0}")]
    InvalidTimestamp(String),

    #[error("generic encoding collides with reserved magic {0:?}")]
    ReservedMagic(String),

    #[error("expected a blob, found {0}")]
    NotABlob(&'static str),

    #[error("structural serialization failed: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Outcome of a magic-checked decode
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// The magic matched and the payload decoded
    Handled(T),
    /// The blob is not in this format
    Unhandled,
}

impl<T> Decoded<T> {
    pub fn handled(self) -> Option<T> {
        match self {
            Decoded::Handled(v) => Some(v),
            Decoded::Unhandled => None,
        }
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, Decoded::Handled(_))
    }
}

pub(crate) fn has_magic(raw: &[u8], magic: &[u8; 4]) -> bool {
    raw.len() >= magic.len() && &raw[..magic.len()] == magic
}

/// Magic the blob starts with, if it is one of the reserved ones
pub fn reserved_magic_of(raw: &[u8]) -> Option<&'static [u8; 4]> {
    RESERVED_MAGICS.iter().copied().find(|m| has_magic(raw, m))
}
