//! Key-value store interface
//!
//! Items are JSON objects addressed by a partition key and an optional
//! sort key. Each table may declare secondary indexes that can be queried
//! by a single attribute value, optionally ordered by a sort attribute.
//!
//! Implementations guarantee per-item atomicity only. There are no
//! cross-item transactions, so compound operations built on top of this
//! trait (for example "check email is free, then insert user") are not
//! atomic.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::configuration::TableSettings;
use crate::error::StoreError;

/// A stored item
pub type Item = Map<String, Value>;

/// Primary key of an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub partition: String,
    pub sort: Option<String>,
}

impl ItemKey {
    pub fn partition(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: None,
        }
    }

    /// Key made of a partition value and a sort value
    pub fn compound(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: Some(sort.into()),
        }
    }
}

/// Secondary index definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexSchema {
    pub name: &'static str,
    pub partition_key: &'static str,
    pub sort_key: Option<&'static str>,
}

/// Table definition: key attributes and secondary indexes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableSchema {
    pub partition_key: &'static str,
    pub sort_key: Option<&'static str>,
    pub indexes: &'static [IndexSchema],
}

pub const USER_EMAIL_INDEX: &str = "EmailIndex";
pub const NOTE_OWNER_INDEX: &str = "UserIdIndex";

/// Users: keyed by `userId`, looked up by `email`
pub const USERS_SCHEMA: TableSchema = TableSchema {
    partition_key: "userId",
    sort_key: None,
    indexes: &[IndexSchema {
        name: USER_EMAIL_INDEX,
        partition_key: "email",
        sort_key: None,
    }],
};

/// Notes: keyed by (`noteId`, `userId`), listed per owner by `createdAt`
pub const NOTES_SCHEMA: TableSchema = TableSchema {
    partition_key: "noteId",
    sort_key: Some("userId"),
    indexes: &[IndexSchema {
        name: NOTE_OWNER_INDEX,
        partition_key: "userId",
        sort_key: Some("createdAt"),
    }],
};

impl TableSchema {
    pub fn index(&self, name: &str) -> Result<&IndexSchema, StoreError> {
        self.indexes
            .iter()
            .find(|index| index.name == name)
            .ok_or_else(|| StoreError::UnknownIndex(name.to_string()))
    }

    /// Extract the primary key from an item
    pub fn key_of(&self, item: &Item) -> Result<ItemKey, StoreError> {
        let partition = string_attr(item, self.partition_key)?;
        let sort = match self.sort_key {
            Some(attr) => Some(string_attr(item, attr)?),
            None => None,
        };
        Ok(ItemKey { partition, sort })
    }

    /// Reject keys whose shape does not match the table
    pub fn check_key(&self, key: &ItemKey) -> Result<(), StoreError> {
        match (self.sort_key, &key.sort) {
            (Some(attr), None) => Err(StoreError::MissingKey(attr.to_string())),
            (None, Some(_)) => Err(StoreError::Backend(
                "sort key given for a table without one".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn string_attr(item: &Item, attr: &str) -> Result<String, StoreError> {
    item.get(attr)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::MissingKey(attr.to_string()))
}

/// Configured table names and the schema each one uses
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<String, TableSchema>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, schema: TableSchema) -> Self {
        self.tables.insert(name.into(), schema);
        self
    }

    /// Registry for the users and notes tables under their configured names
    pub fn from_settings(tables: &TableSettings) -> Self {
        Self::new()
            .with_table(tables.users.clone(), USERS_SCHEMA)
            .with_table(tables.notes.clone(), NOTES_SCHEMA)
    }

    pub fn schema(&self, table: &str) -> Result<&TableSchema, StoreError> {
        self.tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
    }
}

/// Consumed store interface
///
/// `get_item` and `delete_item` report an absent item as
/// `StoreError::NotFound`; every other error is an infrastructure failure.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Item, StoreError>;

    /// Items whose index partition attribute equals `value`, ordered by the
    /// index sort attribute
    async fn query_index(
        &self,
        table: &str,
        index: &str,
        value: &str,
        descending: bool,
    ) -> Result<Vec<Item>, StoreError>;

    /// Insert or fully replace an item
    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError>;

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), StoreError>;
}

pub fn to_item<T: Serialize>(value: &T) -> Result<Item, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::Serialization(
            "value does not serialize to an object".to_string(),
        )),
        Err(e) => Err(StoreError::Serialization(e.to_string())),
    }
}

pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T, StoreError> {
    serde_json::from_value(Value::Object(item)).map_err(|e| StoreError::Serialization(e.to_string()))
}
