use crate::error::{MapperError, Result};
use crate::types::{FieldDescriptor, Value};

/// One `SET` clause entry of a filtered update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateAssignment {
    column: String,
    /// Right-hand side, with `?` placeholders for `args`
    expr: String,
    args: Vec<Value>,
}

impl UpdateAssignment {
    /// `col = ?`
    pub fn set(field: &FieldDescriptor, value: impl Into<Value>) -> Self {
        Self {
            column: field.storage_key.clone(),
            expr: "?".to_string(),
            args: vec![value.into()],
        }
    }

    /// `col = <expr>` with caller-supplied placeholders
    pub fn expr(field: &FieldDescriptor, expr: &str, args: Vec<Value>) -> Result<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(MapperError::InvalidArgument(format!(
                "empty update expression for {}",
                field.storage_key
            )));
        }
        let placeholders = expr.matches('?').count();
        if placeholders != args.len() {
            return Err(MapperError::InvalidArgument(format!(
                "update expression for {} has {} placeholder(s) but {} argument(s)",
                field.storage_key,
                placeholders,
                args.len()
            )));
        }
        Ok(Self {
            column: field.storage_key.clone(),
            expr: expr.to_string(),
            args,
        })
    }

    pub fn add(field: &FieldDescriptor, value: impl Into<Value>) -> Self {
        Self::arithmetic(field, '+', value.into())
    }

    pub fn sub(field: &FieldDescriptor, value: impl Into<Value>) -> Self {
        Self::arithmetic(field, '-', value.into())
    }

    pub fn mul(field: &FieldDescriptor, value: impl Into<Value>) -> Self {
        Self::arithmetic(field, '*', value.into())
    }

    pub fn div(field: &FieldDescriptor, value: impl Into<Value>) -> Self {
        Self::arithmetic(field, '/', value.into())
    }

    fn arithmetic(field: &FieldDescriptor, op: char, value: Value) -> Self {
        Self {
            column: field.storage_key.clone(),
            expr: format!("{} {} ?", field.storage_key, op),
            args: vec![value],
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// `col = expr`
    pub fn to_sql(&self) -> String {
        format!("{} = {}", self.column, self.expr)
    }
}
