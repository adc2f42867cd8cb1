//! String sequence framing

use super::varint::{append_uvarint, read_uvarint, MAX_VARINT_LEN};
use super::{has_magic, CodecError, Decoded, STRING_SEQ_MAGIC};

const FLAG_ABSENT: u8 = 1;

/// Encode a string sequence. `None` is kept distinct from an empty sequence.
pub fn encode_strings(values: Option<&[String]>) -> Vec<u8> {
    let values = match values {
        None => {
            let mut buf = Vec::with_capacity(STRING_SEQ_MAGIC.len() + 1);
            buf.extend_from_slice(STRING_SEQ_MAGIC);
            buf.push(FLAG_ABSENT);
            return buf;
        }
        Some(values) => values,
    };

    let payload: usize = values.iter().map(|v| v.len() + MAX_VARINT_LEN).sum();
    let mut buf = Vec::with_capacity(STRING_SEQ_MAGIC.len() + 1 + MAX_VARINT_LEN + payload);
    buf.extend_from_slice(STRING_SEQ_MAGIC);
    buf.push(0);
    append_uvarint(&mut buf, values.len() as u64);
    for value in values {
        append_uvarint(&mut buf, value.len() as u64);
        buf.extend_from_slice(value.as_bytes());
    }
    buf
}

/// Decode a string sequence, consuming exactly the whole buffer
pub fn decode_strings(raw: &[u8]) -> Result<Decoded<Option<Vec<String>>>, CodecError> {
    if raw.len() < STRING_SEQ_MAGIC.len() + 1 || !has_magic(raw, STRING_SEQ_MAGIC) {
        return Ok(Decoded::Unhandled);
    }

    let flags = raw[STRING_SEQ_MAGIC.len()];
    if flags & FLAG_ABSENT != 0 {
        return Ok(Decoded::Handled(None));
    }

    let mut idx = STRING_SEQ_MAGIC.len() + 1;
    let (count, n) = read_uvarint(&raw[idx..]).ok_or(CodecError::InvalidVarint("sequence count"))?;
    idx += n;

    // every element needs at least its length byte
    if count > (raw.len() - idx) as u64 {
        return Err(CodecError::Truncated("sequence elements"));
    }

    let mut result = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if idx >= raw.len() {
            return Err(CodecError::Truncated("sequence element"));
        }
        let (len, n) = read_uvarint(&raw[idx..]).ok_or(CodecError::InvalidVarint("element length"))?;
        idx += n;

        let end = idx
            .checked_add(len as usize)
            .filter(|end| *end <= raw.len())
            .ok_or(CodecError::Truncated("element data"))?;
        let item = std::str::from_utf8(&raw[idx..end]).map_err(|_| CodecError::InvalidUtf8)?;
        result.push(item.to_string());
        idx = end;
    }

    if idx != raw.len() {
        return Err(CodecError::TrailingData(raw.len() - idx));
    }

    Ok(Decoded::Handled(Some(result)))
}
