/// Conversions between record field types and [`Value`]
use crate::codec::{self, DecodedBlob};
use crate::error::{MapperError, Result};
use crate::types::{FieldDescriptor, Timestamp, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::{Deref, DerefMut};

/// A record field type that can be stored in a column.
///
/// `from_value` receives normalized values; NULL maps to the type's zero
/// value unless the type is an `Option`.
pub trait FieldValue: Sized {
    fn to_value(&self, field: &FieldDescriptor) -> Result<Value>;

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self>;
}

macro_rules! signed_field_value {
    ($($t:ty),*) => {
        $(impl FieldValue for $t {
            fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
                Ok(Value::Integer(*self as i64))
            }

            fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(0),
                    Value::Integer(v) => <$t>::try_from(v)
                        .map_err(|_| MapperError::mismatch(&field.storage_key, stringify!($t), &value)),
                    other => Err(MapperError::mismatch(&field.storage_key, stringify!($t), &other)),
                }
            }
        })*
    };
}

macro_rules! unsigned_field_value {
    ($($t:ty),*) => {
        $(impl FieldValue for $t {
            fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
                Ok(Value::Unsigned(*self as u64))
            }

            fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(0),
                    Value::Unsigned(v) => <$t>::try_from(v)
                        .map_err(|_| MapperError::mismatch(&field.storage_key, stringify!($t), &value)),
                    Value::Integer(v) => <$t>::try_from(v)
                        .map_err(|_| MapperError::mismatch(&field.storage_key, stringify!($t), &value)),
                    other => Err(MapperError::mismatch(&field.storage_key, stringify!($t), &other)),
                }
            }
        })*
    };
}

signed_field_value!(i8, i16, i32, i64);
unsigned_field_value!(u8, u16, u32, u64);

impl FieldValue for f64 {
    fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
        Ok(Value::Float(*self))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(0.0),
            Value::Float(v) => Ok(v),
            Value::Integer(v) => Ok(v as f64),
            other => Err(MapperError::mismatch(&field.storage_key, "f64", &other)),
        }
    }
}

impl FieldValue for f32 {
    fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
        Ok(Value::Float(*self as f64))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        f64::from_value(field, value).map(|v| v as f32)
    }
}

impl FieldValue for bool {
    fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::Integer(v) => Ok(v != 0),
            other => Err(MapperError::mismatch(&field.storage_key, "bool", &other)),
        }
    }
}

impl FieldValue for String {
    fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(String::new()),
            Value::Text(s) => Ok(s),
            other => Err(MapperError::mismatch(&field.storage_key, "text", &other)),
        }
    }
}

/// Raw bytes, stored without framing
impl FieldValue for Vec<u8> {
    fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
        Ok(Value::Bytes(self.clone()))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Bytes(b) => Ok(b),
            other => Err(MapperError::mismatch(&field.storage_key, "bytes", &other)),
        }
    }
}

fn blob_of<'a>(field: &FieldDescriptor, value: &'a Value) -> Result<&'a [u8]> {
    match value {
        Value::Bytes(raw) => Ok(raw),
        other => Err(MapperError::codec(
            &field.storage_key,
            codec::CodecError::NotABlob(other.type_name()),
        )),
    }
}

fn decode_string_seq(field: &FieldDescriptor, value: &Value) -> Result<Option<Vec<String>>> {
    let raw = blob_of(field, value)?;
    match codec::decode_blob(raw).map_err(|e| MapperError::codec(&field.storage_key, e))? {
        DecodedBlob::Strings(values) => Ok(values),
        DecodedBlob::Generic(raw) => codec::decode_generic(raw)
            .map(Some)
            .map_err(|e| MapperError::codec(&field.storage_key, e)),
        DecodedBlob::Timestamp(_) => Err(MapperError::mismatch(&field.storage_key, "string sequence", value)),
    }
}

/// String sequences use the dedicated framing; an empty list and an absent
/// one stay distinguishable through `Option<Vec<String>>`.
impl FieldValue for Vec<String> {
    fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
        Ok(Value::Bytes(codec::encode_strings(Some(self))))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Vec::new());
        }
        Ok(decode_string_seq(field, &value)?.unwrap_or_default())
    }
}

impl FieldValue for Option<Vec<String>> {
    fn to_value(&self, _field: &FieldDescriptor) -> Result<Value> {
        Ok(Value::Bytes(codec::encode_strings(self.as_deref())))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        decode_string_seq(field, &value)
    }
}

impl FieldValue for Timestamp {
    fn to_value(&self, field: &FieldDescriptor) -> Result<Value> {
        codec::encode_timestamp(self)
            .map(Value::Bytes)
            .map_err(|e| MapperError::codec(&field.storage_key, e))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Timestamp::default());
        }
        let raw = blob_of(field, &value)?;
        match codec::decode_blob(raw).map_err(|e| MapperError::codec(&field.storage_key, e))? {
            DecodedBlob::Timestamp(ts) => Ok(ts),
            DecodedBlob::Generic(raw) => {
                codec::decode_generic(raw).map_err(|e| MapperError::codec(&field.storage_key, e))
            }
            DecodedBlob::Strings(_) => Err(MapperError::mismatch(&field.storage_key, "timestamp", &value)),
        }
    }
}

/// Field stored with the generic structural encoding (structs, maps, nested lists)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blob<T>(pub T);

impl<T> Blob<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Blob<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Blob<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Blob<T> {
    fn from(value: T) -> Self {
        Blob(value)
    }
}

impl<T: Serialize + DeserializeOwned + Default> FieldValue for Blob<T> {
    fn to_value(&self, field: &FieldDescriptor) -> Result<Value> {
        codec::encode_generic(&self.0)
            .map(Value::Bytes)
            .map_err(|e| MapperError::codec(&field.storage_key, e))
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Blob(T::default()));
        }
        let raw = blob_of(field, &value)?;
        match codec::decode_blob(raw).map_err(|e| MapperError::codec(&field.storage_key, e))? {
            DecodedBlob::Generic(raw) => codec::decode_generic(raw)
                .map(Blob)
                .map_err(|e| MapperError::codec(&field.storage_key, e)),
            _ => Err(MapperError::mismatch(&field.storage_key, "structural blob", &value)),
        }
    }
}

macro_rules! optional_field_value {
    ($($t:ty),*) => {
        $(impl FieldValue for Option<$t> {
            fn to_value(&self, field: &FieldDescriptor) -> Result<Value> {
                match self {
                    Some(v) => v.to_value(field),
                    None => Ok(Value::Null),
                }
            }

            fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
                if value.is_null() {
                    return Ok(None);
                }
                <$t>::from_value(field, value).map(Some)
            }
        })*
    };
}

// absent values are stored as NULL; string sequences encode absence in the blob
optional_field_value!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, bool, String, Vec<u8>, Timestamp);

impl<T: Serialize + DeserializeOwned + Default> FieldValue for Option<Blob<T>> {
    fn to_value(&self, field: &FieldDescriptor) -> Result<Value> {
        match self {
            Some(v) => v.to_value(field),
            None => Ok(Value::Null),
        }
    }

    fn from_value(field: &FieldDescriptor, value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        Blob::from_value(field, value).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldKind;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    fn blob_field() -> FieldDescriptor {
        FieldDescriptor::new("payload", FieldKind::StructBlob)
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Address {
        city: String,
        zip: u32,
    }

    #[test]
    fn test_scalars() {
        let f = FieldDescriptor::new("n", FieldKind::Int);
        assert_eq!(42i32.to_value(&f).unwrap(), Value::Integer(42));
        assert_eq!(i32::from_value(&f, Value::Integer(42)).unwrap(), 42);
        assert_eq!(i64::from_value(&f, Value::Null).unwrap(), 0);
        assert!(i8::from_value(&f, Value::Integer(1000)).is_err());
        assert!(String::from_value(&f, Value::Integer(1)).is_err());
    }

    #[test]
    fn test_string_sequences() {
        let f = FieldDescriptor::new("tags", FieldKind::ArrayBlob);
        let tags = vec!["a".to_string(), String::new()];
        let stored = tags.to_value(&f).unwrap();
        assert_eq!(Vec::<String>::from_value(&f, stored).unwrap(), tags);

        let absent: Option<Vec<String>> = None;
        let stored = absent.to_value(&f).unwrap();
        assert!(matches!(stored, Value::Bytes(_)));
        assert_eq!(Option::<Vec<String>>::from_value(&f, stored).unwrap(), None);

        let empty: Option<Vec<String>> = Some(Vec::new());
        let stored = empty.to_value(&f).unwrap();
        assert_eq!(Option::<Vec<String>>::from_value(&f, stored).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_string_sequence_reads_generic_blob() {
        let f = FieldDescriptor::new("tags", FieldKind::ArrayBlob);
        let raw = codec::encode_generic(&vec!["x".to_string()]).unwrap();
        assert_eq!(
            Vec::<String>::from_value(&f, Value::Bytes(raw)).unwrap(),
            vec!["x".to_string()]
        );
    }

    #[test]
    fn test_timestamp_field() {
        let f = FieldDescriptor::new("created", FieldKind::StructBlob);
        let ts = Timestamp::new(1_700_000_000, 250);
        let stored = ts.to_value(&f).unwrap();
        assert_eq!(Timestamp::from_value(&f, stored).unwrap(), ts);
        assert_eq!(Option::<Timestamp>::None.to_value(&f).unwrap(), Value::Null);
    }

    #[test]
    fn test_structural_blobs() {
        let f = blob_field();
        let address = Blob(Address {
            city: "Oslo".into(),
            zip: 150,
        });
        let stored = address.to_value(&f).unwrap();
        assert_eq!(Blob::<Address>::from_value(&f, stored).unwrap(), address);

        let mut map = BTreeMap::new();
        map.insert("k".to_string(), 3i64);
        let stored = Blob(map.clone()).to_value(&f).unwrap();
        assert_eq!(Blob::<BTreeMap<String, i64>>::from_value(&f, stored).unwrap().0, map);

        let pointer: Option<Blob<Address>> = None;
        assert_eq!(pointer.to_value(&f).unwrap(), Value::Null);
        assert_eq!(Option::<Blob<Address>>::from_value(&f, Value::Null).unwrap(), None);
    }

    #[test]
    fn test_corrupt_blob_reports_field() {
        let f = blob_field();
        let err = Blob::<Address>::from_value(&f, Value::Bytes(vec![1])).unwrap_err();
        match err {
            MapperError::Codec { field, .. } => assert_eq!(field, "payload"),
            other => panic!("unexpected error {other:?}"),
        }

        let truncated = Value::Bytes(b"GMS1\x00\x05".to_vec());
        let tags = FieldDescriptor::new("tags", FieldKind::ArrayBlob);
        assert!(matches!(
            Vec::<String>::from_value(&tags, truncated),
            Err(MapperError::Codec { .. })
        ));
    }
}
