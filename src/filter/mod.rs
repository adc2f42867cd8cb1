//! Filter builder
//!
//! Builds the WHERE / ORDER BY / LIMIT / OFFSET tail of a query, one checked
//! call at a time. Conditions and joiners must alternate:
//!
//! - a condition (or group open) follows nothing, a joiner, or a group open
//! - a joiner (or group close) follows a condition or a group close
//!
//! Each call consumes the filter and returns it back, or the grammar error
//! for that call. Placeholder arguments are kept in emission order.
//!
//! ```ignore
//! let filter = Filter::new()
//!     .open_group()?
//!     .key_cmp(title, SqlOperator::Like, "%even%")?
//!     .or()?
//!     .key_cmp(title, SqlOperator::Like, "%odd%")?
//!     .close_group()?
//!     .and()?
//!     .key_in(id, SqlOperator::In, [1, 2, 4])?
//!     .order_by(id, false)?;
//! let fragment = filter.build()?;
//! ```

mod assignment;
mod operator;

pub use assignment::UpdateAssignment;
pub use operator::SqlOperator;

use crate::error::{MapperError, Result};
use crate::types::{FieldDescriptor, Value};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Condition(String),
    And,
    Or,
    Open,
    Close,
}

/// Query filter under construction
#[derive(Debug, Clone)]
pub struct Filter {
    tokens: Vec<Token>,
    args: Vec<Value>,
    order_by: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    expecting_condition: bool,
    open_groups: usize,
}

/// Finalized SQL tail and its positional arguments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterFragment {
    /// Empty, or starts with `WHERE`, `ORDER BY` or `LIMIT`
    pub sql: String,
    pub args: Vec<Value>,
}

impl FilterFragment {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            args: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
            expecting_condition: true,
            open_groups: 0,
        }
    }

    /// `field <op> ?` for the equality family and LIKE, or a NULL test
    /// when `op` is `IS NULL` / `IS NOT NULL` (the value must then be
    /// `Value::Null`).
    pub fn key_cmp(self, field: &FieldDescriptor, op: SqlOperator, value: impl Into<Value>) -> Result<Self> {
        let value = value.into();
        if op.is_membership() {
            return Err(MapperError::Grammar(format!(
                "{} on {} takes a set of values, use key_in",
                op, field.storage_key
            )));
        }
        if op.is_null_test() {
            if !value.is_null() {
                return Err(MapperError::Grammar(format!(
                    "{} on {} does not take a value, got {}",
                    op, field.storage_key, value
                )));
            }
            return self.push_condition(format!("{} {}", field.storage_key, op), Vec::new());
        }
        self.push_condition(format!("{} {} ?", field.storage_key, op), vec![value])
    }

    /// `field IN (?, ...)` or `field NOT IN (?, ...)`, one placeholder per value
    pub fn key_in<I, V>(self, field: &FieldDescriptor, op: SqlOperator, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if !op.is_membership() {
            return Err(MapperError::Grammar(format!(
                "key_in on {} requires IN or NOT IN, got {}",
                field.storage_key, op
            )));
        }
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(MapperError::Grammar(format!(
                "{} on {} requires at least one value",
                op, field.storage_key
            )));
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.push_condition(
            format!("{} {} ({})", field.storage_key, op, placeholders),
            values,
        )
    }

    pub fn is_null(self, field: &FieldDescriptor) -> Result<Self> {
        self.key_cmp(field, SqlOperator::IsNull, Value::Null)
    }

    pub fn is_not_null(self, field: &FieldDescriptor) -> Result<Self> {
        self.key_cmp(field, SqlOperator::IsNotNull, Value::Null)
    }

    pub fn and(self) -> Result<Self> {
        self.push_joiner(Token::And, "AND")
    }

    pub fn or(self) -> Result<Self> {
        self.push_joiner(Token::Or, "OR")
    }

    pub fn open_group(mut self) -> Result<Self> {
        self.check_open("open_group")?;
        if !self.expecting_condition {
            return Err(MapperError::Grammar(
                "open_group must follow nothing, a joiner or another open_group".into(),
            ));
        }
        self.tokens.push(Token::Open);
        self.open_groups += 1;
        Ok(self)
    }

    pub fn close_group(mut self) -> Result<Self> {
        self.check_open("close_group")?;
        if self.open_groups == 0 {
            return Err(MapperError::Grammar("close_group without a matching open_group".into()));
        }
        if self.expecting_condition {
            return Err(MapperError::Grammar(
                "close_group must follow a condition or another close_group".into(),
            ));
        }
        self.tokens.push(Token::Close);
        self.open_groups -= 1;
        Ok(self)
    }

    /// `ORDER BY field ASC|DESC`; single use, ends the condition stream
    pub fn order_by(mut self, field: &FieldDescriptor, ascending: bool) -> Result<Self> {
        self.check_modifier("order_by", self.order_by.is_some())?;
        let direction = if ascending { "ASC" } else { "DESC" };
        self.order_by = Some(format!("{} {}", field.storage_key, direction));
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> Result<Self> {
        self.check_modifier("limit", self.limit.is_some())?;
        self.limit = Some(limit);
        Ok(self)
    }

    pub fn offset(mut self, offset: u64) -> Result<Self> {
        self.check_modifier("offset", self.offset.is_some())?;
        self.offset = Some(offset);
        Ok(self)
    }

    /// Snapshot the SQL tail and its arguments. The filter stays usable.
    pub fn build(&self) -> Result<FilterFragment> {
        if !self.tokens.is_empty() && self.expecting_condition {
            return Err(MapperError::Grammar(
                "filter ends with a joiner, expected a condition".into(),
            ));
        }
        if self.open_groups > 0 {
            return Err(MapperError::Grammar(format!(
                "filter has {} unclosed group(s)",
                self.open_groups
            )));
        }

        let mut parts: Vec<String> = Vec::new();
        if !self.tokens.is_empty() {
            parts.push(format!("WHERE {}", self.render_where()));
        }
        if let Some(order) = &self.order_by {
            parts.push(format!("ORDER BY {}", order));
        }
        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => parts.push(format!("LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => parts.push(format!("LIMIT {}", limit)),
            // the engine only accepts OFFSET after a LIMIT
            (None, Some(offset)) => parts.push(format!("LIMIT -1 OFFSET {}", offset)),
            (None, None) => {}
        }

        Ok(FilterFragment {
            sql: parts.join(" "),
            args: self.args.clone(),
        })
    }

    fn render_where(&self) -> String {
        let mut out = String::new();
        let mut after_open = true;
        for token in &self.tokens {
            let text = match token {
                Token::Condition(c) => c.as_str(),
                Token::And => "AND",
                Token::Or => "OR",
                Token::Open => "(",
                Token::Close => ")",
            };
            if !after_open && *token != Token::Close {
                out.push(' ');
            }
            out.push_str(text);
            after_open = *token == Token::Open;
        }
        out
    }

    fn push_condition(mut self, condition: String, args: Vec<Value>) -> Result<Self> {
        self.check_open("condition")?;
        if !self.expecting_condition {
            return Err(MapperError::Grammar(format!(
                "condition '{}' must follow nothing, a joiner or open_group",
                condition
            )));
        }
        self.tokens.push(Token::Condition(condition));
        self.args.extend(args);
        self.expecting_condition = false;
        Ok(self)
    }

    fn push_joiner(mut self, token: Token, name: &str) -> Result<Self> {
        self.check_open(name)?;
        if self.expecting_condition {
            return Err(MapperError::Grammar(format!(
                "{} must follow a condition or close_group",
                name
            )));
        }
        self.tokens.push(token);
        self.expecting_condition = true;
        Ok(self)
    }

    /// Conditions are closed once a terminal modifier has been set
    fn check_open(&self, call: &str) -> Result<()> {
        if self.order_by.is_some() || self.limit.is_some() || self.offset.is_some() {
            return Err(MapperError::Grammar(format!(
                "{} after ORDER BY / LIMIT / OFFSET",
                call
            )));
        }
        Ok(())
    }

    fn check_modifier(&self, call: &str, already_set: bool) -> Result<()> {
        if already_set {
            return Err(MapperError::Grammar(format!("{} may only be set once", call)));
        }
        if !self.tokens.is_empty() && (self.expecting_condition || self.open_groups > 0) {
            return Err(MapperError::Grammar(format!(
                "{} while the condition stream is incomplete",
                call
            )));
        }
        Ok(())
    }
}
