//! Record boundary
//!
//! A record type declares its fields once and exposes get/set access by
//! descriptor; the database handle does the rest. Values read back from the
//! store pass through [`normalize`] before reaching [`Record::set_field`], so
//! implementations only ever see the shape their declared kind implies.
//!
//! ```ignore
//! #[derive(Default)]
//! struct User { id: i64, name: String }
//!
//! impl Record for User {
//!     fn table_name() -> &'static str { "User" }
//!
//!     fn fields() -> Vec<FieldDescriptor> {
//!         vec![
//!             FieldDescriptor::new("id", FieldKind::Int).primary_key().auto_increment(),
//!             FieldDescriptor::new("name", FieldKind::String).unique(),
//!         ]
//!     }
//!
//!     fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
//!         match field.storage_key.as_str() {
//!             "id" => self.id.to_value(field),
//!             "name" => self.name.to_value(field),
//!             other => Err(MapperError::UnknownField(other.to_string())),
//!         }
//!     }
//!
//!     fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
//!         match field.storage_key.as_str() {
//!             "id" => self.id = FieldValue::from_value(field, value)?,
//!             "name" => self.name = FieldValue::from_value(field, value)?,
//!             other => return Err(MapperError::UnknownField(other.to_string())),
//!         }
//!         Ok(())
//!     }
//! }
//! ```

mod value;

pub use value::{Blob, FieldValue};

use crate::error::{MapperError, Result};
use crate::types::{FieldDescriptor, FieldKind, Value};

/// A typed record persisted as one row of one table
pub trait Record: Default {
    fn table_name() -> &'static str;

    /// Field declarations in declaration order
    fn fields() -> Vec<FieldDescriptor>;

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value>;

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()>;
}

/// Coerce a value read from the store to the shape of `field`'s kind.
///
/// NULL stays NULL; the field conversion decides what absence means.
pub fn normalize(field: &FieldDescriptor, value: Value) -> Result<Value> {
    let key = field.storage_key.as_str();
    if value.is_null() {
        return Ok(value);
    }

    match field.kind {
        FieldKind::Int => match value {
            Value::Integer(_) => Ok(value),
            Value::Unsigned(v) => i64::try_from(v)
                .map(Value::Integer)
                .map_err(|_| MapperError::mismatch(key, "integer", &value)),
            Value::Bool(b) => Ok(Value::Integer(b as i64)),
            Value::Text(ref s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| MapperError::mismatch(key, "integer", &value)),
            other => Err(MapperError::mismatch(key, "integer", &other)),
        },
        FieldKind::Uint => match value {
            Value::Unsigned(_) => Ok(value),
            Value::Integer(v) => u64::try_from(v)
                .map(Value::Unsigned)
                .map_err(|_| MapperError::mismatch(key, "unsigned", &value)),
            Value::Bool(b) => Ok(Value::Unsigned(b as u64)),
            Value::Text(ref s) => s
                .trim()
                .parse::<u64>()
                .map(Value::Unsigned)
                .map_err(|_| MapperError::mismatch(key, "unsigned", &value)),
            other => Err(MapperError::mismatch(key, "unsigned", &other)),
        },
        FieldKind::Bool => match value {
            Value::Bool(_) => Ok(value),
            Value::Integer(v) => Ok(Value::Bool(v != 0)),
            Value::Unsigned(v) => Ok(Value::Bool(v != 0)),
            Value::Text(ref s) => match s.trim() {
                "1" | "true" | "TRUE" | "True" => Ok(Value::Bool(true)),
                "0" | "false" | "FALSE" | "False" | "" => Ok(Value::Bool(false)),
                _ => Err(MapperError::mismatch(key, "bool", &value)),
            },
            other => Err(MapperError::mismatch(key, "bool", &other)),
        },
        FieldKind::Float => match value {
            Value::Float(_) => Ok(value),
            Value::Integer(v) => Ok(Value::Float(v as f64)),
            Value::Unsigned(v) => Ok(Value::Float(v as f64)),
            other => Err(MapperError::mismatch(key, "float", &other)),
        },
        FieldKind::String => match value {
            Value::Text(_) => Ok(value),
            Value::Bytes(raw) => String::from_utf8(raw)
                .map(Value::Text)
                .map_err(|e| MapperError::mismatch(key, "text", &Value::Bytes(e.into_bytes()))),
            other => Err(MapperError::mismatch(key, "text", &other)),
        },
        FieldKind::ArrayBlob | FieldKind::StructBlob | FieldKind::MapBlob | FieldKind::Pointer => {
            match value {
                Value::Bytes(_) => Ok(value),
                Value::Text(s) => Ok(Value::Bytes(s.into_bytes())),
                other => Err(MapperError::mismatch(key, "bytes", &other)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: FieldKind) -> FieldDescriptor {
        FieldDescriptor::new("f", kind)
    }

    #[test]
    fn test_bool_coercion() {
        let f = field(FieldKind::Bool);
        assert_eq!(normalize(&f, Value::Integer(1)).unwrap(), Value::Bool(true));
        assert_eq!(normalize(&f, Value::Integer(0)).unwrap(), Value::Bool(false));
        assert_eq!(normalize(&f, Value::from("true")).unwrap(), Value::Bool(true));
        assert_eq!(normalize(&f, Value::from("")).unwrap(), Value::Bool(false));
        assert!(normalize(&f, Value::from("maybe")).is_err());
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        let f = field(FieldKind::Uint);
        assert_eq!(normalize(&f, Value::Integer(7)).unwrap(), Value::Unsigned(7));
        assert!(matches!(
            normalize(&f, Value::Integer(-1)),
            Err(MapperError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_text_parses_as_integer() {
        assert_eq!(normalize(&field(FieldKind::Int), Value::from(" -4 ")).unwrap(), Value::Integer(-4));
        assert_eq!(normalize(&field(FieldKind::Uint), Value::from("42")).unwrap(), Value::Unsigned(42));
        assert!(normalize(&field(FieldKind::Uint), Value::from("-1")).is_err());
        assert!(normalize(&field(FieldKind::Uint), Value::from("many")).is_err());
    }

    #[test]
    fn test_null_is_preserved() {
        for kind in [FieldKind::Int, FieldKind::String, FieldKind::Pointer] {
            assert_eq!(normalize(&field(kind), Value::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(
            normalize(&field(FieldKind::Float), Value::Integer(3)).unwrap(),
            Value::Float(3.0)
        );
        assert_eq!(
            normalize(&field(FieldKind::Int), Value::Unsigned(3)).unwrap(),
            Value::Integer(3)
        );
        assert!(normalize(&field(FieldKind::Int), Value::Float(1.5)).is_err());
    }
}
