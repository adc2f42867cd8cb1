//! Record fixtures shared by the unit tests

use crate::record::{Blob, FieldValue, Record};
use crate::types::{FieldDescriptor, FieldKind, Timestamp, Value};
use crate::{MapperError, Result};
use std::collections::BTreeMap;

fn unknown(table: &str, field: &FieldDescriptor) -> MapperError {
    MapperError::UnknownField(format!("{}.{}", table, field.storage_key))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
}

impl User {
    pub fn named(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
        }
    }
}

impl Record for User {
    fn table_name() -> &'static str {
        "User"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::from_tag("id,primary,increment", "ID", FieldKind::Int).unwrap(),
            FieldDescriptor::from_tag("name,unique", "Name", FieldKind::String).unwrap(),
        ]
    }

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.storage_key.as_str() {
            "id" => self.id.to_value(field),
            "name" => self.name.to_value(field),
            _ => Err(unknown("User", field)),
        }
    }

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.storage_key.as_str() {
            "id" => self.id = FieldValue::from_value(field, value)?,
            "name" => self.name = FieldValue::from_value(field, value)?,
            _ => return Err(unknown("User", field)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub money: i64,
    pub username: String,
}

impl Account {
    pub fn new(username: &str, money: i64) -> Self {
        Self {
            money,
            username: username.to_string(),
        }
    }
}

impl Record for Account {
    fn table_name() -> &'static str {
        "Account"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("money", FieldKind::Int),
            FieldDescriptor::new("username", FieldKind::String)
                .primary_key()
                .unique()
                .not_null(),
        ]
    }

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.storage_key.as_str() {
            "money" => self.money.to_value(field),
            "username" => self.username.to_value(field),
            _ => Err(unknown("Account", field)),
        }
    }

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.storage_key.as_str() {
            "money" => self.money = FieldValue::from_value(field, value)?,
            "username" => self.username = FieldValue::from_value(field, value)?,
            _ => return Err(unknown("Account", field)),
        }
        Ok(())
    }
}

/// Secondary auto-increment under a text key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ticket {
    pub code: String,
    pub seq: i64,
}

impl Ticket {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            seq: 0,
        }
    }
}

impl Record for Ticket {
    fn table_name() -> &'static str {
        "Ticket"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("code", FieldKind::String).primary_key(),
            FieldDescriptor::new("seq", FieldKind::Int).auto_increment(),
        ]
    }

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.storage_key.as_str() {
            "code" => self.code.to_value(field),
            "seq" => self.seq.to_value(field),
            _ => Err(unknown("Ticket", field)),
        }
    }

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.storage_key.as_str() {
            "code" => self.code = FieldValue::from_value(field, value)?,
            "seq" => self.seq = FieldValue::from_value(field, value)?,
            _ => return Err(unknown("Ticket", field)),
        }
        Ok(())
    }
}

/// Secondary auto-increment next to a NOT NULL column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slot {
    pub code: String,
    pub seq: i64,
    pub note: Option<String>,
}

impl Slot {
    pub fn new(code: &str, note: Option<&str>) -> Self {
        Self {
            code: code.to_string(),
            seq: 0,
            note: note.map(str::to_string),
        }
    }
}

impl Record for Slot {
    fn table_name() -> &'static str {
        "Slot"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("code", FieldKind::String).primary_key(),
            FieldDescriptor::new("seq", FieldKind::Int).auto_increment(),
            FieldDescriptor::new("note", FieldKind::String).not_null(),
        ]
    }

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.storage_key.as_str() {
            "code" => self.code.to_value(field),
            "seq" => self.seq.to_value(field),
            "note" => self.note.to_value(field),
            _ => Err(unknown("Slot", field)),
        }
    }

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.storage_key.as_str() {
            "code" => self.code = FieldValue::from_value(field, value)?,
            "seq" => self.seq = FieldValue::from_value(field, value)?,
            "note" => self.note = FieldValue::from_value(field, value)?,
            _ => return Err(unknown("Slot", field)),
        }
        Ok(())
    }
}

/// Key-only table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub name: String,
}

impl Record for Tag {
    fn table_name() -> &'static str {
        "Tag"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor::new("name", FieldKind::String).primary_key()]
    }

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.storage_key.as_str() {
            "name" => self.name.to_value(field),
            _ => Err(unknown("Tag", field)),
        }
    }

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.storage_key.as_str() {
            "name" => self.name = FieldValue::from_value(field, value)?,
            _ => return Err(unknown("Tag", field)),
        }
        Ok(())
    }
}

/// Every blob flavour in one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub tags: Vec<String>,
    pub aliases: Option<Vec<String>>,
    pub created: Timestamp,
    pub attributes: Blob<BTreeMap<String, String>>,
    pub archived: bool,
}

impl Document {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }
}

impl Record for Document {
    fn table_name() -> &'static str {
        "Document"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", FieldKind::Int).primary_key().auto_increment(),
            FieldDescriptor::new("title", FieldKind::String).not_null(),
            FieldDescriptor::new("tags", FieldKind::ArrayBlob),
            FieldDescriptor::new("aliases", FieldKind::ArrayBlob),
            FieldDescriptor::new("created", FieldKind::StructBlob).source("CreatedAt"),
            FieldDescriptor::new("attributes", FieldKind::MapBlob),
            FieldDescriptor::new("archived", FieldKind::Bool),
        ]
    }

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.storage_key.as_str() {
            "id" => self.id.to_value(field),
            "title" => self.title.to_value(field),
            "tags" => self.tags.to_value(field),
            "aliases" => self.aliases.to_value(field),
            "created" => self.created.to_value(field),
            "attributes" => self.attributes.to_value(field),
            "archived" => self.archived.to_value(field),
            _ => Err(unknown("Document", field)),
        }
    }

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.storage_key.as_str() {
            "id" => self.id = FieldValue::from_value(field, value)?,
            "title" => self.title = FieldValue::from_value(field, value)?,
            "tags" => self.tags = FieldValue::from_value(field, value)?,
            "aliases" => self.aliases = FieldValue::from_value(field, value)?,
            "created" => self.created = FieldValue::from_value(field, value)?,
            "attributes" => self.attributes = FieldValue::from_value(field, value)?,
            "archived" => self.archived = FieldValue::from_value(field, value)?,
            _ => return Err(unknown("Document", field)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonV1 {
    pub id: i64,
    pub name: String,
    pub age: i64,
}

impl Record for PersonV1 {
    fn table_name() -> &'static str {
        "Person"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", FieldKind::Int).primary_key().auto_increment(),
            FieldDescriptor::new("name", FieldKind::String),
            FieldDescriptor::new("age", FieldKind::Int),
        ]
    }

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.storage_key.as_str() {
            "id" => self.id.to_value(field),
            "name" => self.name.to_value(field),
            "age" => self.age.to_value(field),
            _ => Err(unknown("Person", field)),
        }
    }

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.storage_key.as_str() {
            "id" => self.id = FieldValue::from_value(field, value)?,
            "name" => self.name = FieldValue::from_value(field, value)?,
            "age" => self.age = FieldValue::from_value(field, value)?,
            _ => return Err(unknown("Person", field)),
        }
        Ok(())
    }
}

/// `Person` after `age` became `years`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonV2 {
    pub id: i64,
    pub name: String,
    pub years: i64,
}

impl Record for PersonV2 {
    fn table_name() -> &'static str {
        "Person"
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("id", FieldKind::Int).primary_key().auto_increment(),
            FieldDescriptor::new("name", FieldKind::String),
            FieldDescriptor::new("years", FieldKind::Int),
        ]
    }

    fn get_field(&self, field: &FieldDescriptor) -> Result<Value> {
        match field.storage_key.as_str() {
            "id" => self.id.to_value(field),
            "name" => self.name.to_value(field),
            "years" => self.years.to_value(field),
            _ => Err(unknown("Person", field)),
        }
    }

    fn set_field(&mut self, field: &FieldDescriptor, value: Value) -> Result<()> {
        match field.storage_key.as_str() {
            "id" => self.id = FieldValue::from_value(field, value)?,
            "name" => self.name = FieldValue::from_value(field, value)?,
            "years" => self.years = FieldValue::from_value(field, value)?,
            _ => return Err(unknown("Person", field)),
        }
        Ok(())
    }
}
