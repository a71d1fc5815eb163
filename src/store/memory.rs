use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Item, ItemKey, Store, TableRegistry};
use crate::error::StoreError;

type Table = BTreeMap<ItemKey, Item>;

/// In-memory store for local development and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    registry: TableRegistry,
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryStore {
    pub fn new(registry: TableRegistry) -> Self {
        Self {
            registry,
            tables: Arc::default(),
        }
    }
}

fn sort_value<'a>(item: &'a Item, attr: Option<&str>) -> Option<&'a str> {
    attr.and_then(|attr| item.get(attr)).and_then(Value::as_str)
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Item, StoreError> {
        self.registry.schema(table)?.check_key(key)?;

        let tables = self.tables.read().await;
        tables
            .get(table)
            .and_then(|items| items.get(key))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn query_index(
        &self,
        table: &str,
        index: &str,
        value: &str,
        descending: bool,
    ) -> Result<Vec<Item>, StoreError> {
        let index = *self.registry.schema(table)?.index(index)?;

        let tables = self.tables.read().await;
        let mut matches: Vec<(&ItemKey, &Item)> = tables
            .get(table)
            .map(|items| {
                items
                    .iter()
                    .filter(|(_, item)| {
                        item.get(index.partition_key).and_then(Value::as_str) == Some(value)
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Ties on the sort attribute fall back to primary key order
        matches.sort_by(|(a_key, a), (b_key, b)| {
            sort_value(a, index.sort_key)
                .cmp(&sort_value(b, index.sort_key))
                .then_with(|| a_key.cmp(b_key))
        });
        if descending {
            matches.reverse();
        }

        Ok(matches.into_iter().map(|(_, item)| item.clone()).collect())
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let key = self.registry.schema(table)?.key_of(&item)?;

        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().insert(key, item);
        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), StoreError> {
        self.registry.schema(table)?.check_key(key)?;

        let mut tables = self.tables.write().await;
        tables
            .get_mut(table)
            .and_then(|items| items.remove(key))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
