/// Postgres-backed store
///
/// All tables share one `store_items` relation; each row holds one item as
/// JSONB, keyed by (table, partition, sort). Tables without a sort key use
/// an empty sort value.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::{Item, ItemKey, Store, TableRegistry};
use crate::error::StoreError;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    registry: TableRegistry,
}

impl PgStore {
    pub fn new(pool: PgPool, registry: TableRegistry) -> Self {
        Self { pool, registry }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))
    }
}

fn sort_value(key: &ItemKey) -> &str {
    key.sort.as_deref().unwrap_or("")
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            StoreError::Unavailable(err.to_string())
        }
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn get_item(&self, table: &str, key: &ItemKey) -> Result<Item, StoreError> {
        self.registry.schema(table)?.check_key(key)?;

        let row = sqlx::query(
            r#"
            SELECT body FROM store_items
            WHERE table_name = $1 AND partition_key = $2 AND sort_key = $3
            "#,
        )
        .bind(table)
        .bind(&key.partition)
        .bind(sort_value(key))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(StoreError::NotFound)?;

        let Json(item) = row
            .try_get::<Json<Item>, _>("body")
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(item)
    }

    async fn query_index(
        &self,
        table: &str,
        index: &str,
        value: &str,
        descending: bool,
    ) -> Result<Vec<Item>, StoreError> {
        let index = *self.registry.schema(table)?.index(index)?;
        let direction = if descending { "DESC" } else { "ASC" };

        let rows = match index.sort_key {
            Some(sort_attr) => {
                let sql = format!(
                    "SELECT body FROM store_items \
                     WHERE table_name = $1 AND body ->> $2 = $3 \
                     ORDER BY body ->> $4 {dir}, partition_key {dir}, sort_key {dir}",
                    dir = direction
                );
                sqlx::query(&sql)
                    .bind(table)
                    .bind(index.partition_key)
                    .bind(value)
                    .bind(sort_attr)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT body FROM store_items \
                     WHERE table_name = $1 AND body ->> $2 = $3 \
                     ORDER BY partition_key {dir}, sort_key {dir}",
                    dir = direction
                );
                sqlx::query(&sql)
                    .bind(table)
                    .bind(index.partition_key)
                    .bind(value)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(map_sqlx_error)?;

        rows.iter()
            .map(|row| {
                row.try_get::<Json<Item>, _>("body")
                    .map(|Json(item)| item)
                    .map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .collect()
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), StoreError> {
        let key = self.registry.schema(table)?.key_of(&item)?;

        sqlx::query(
            r#"
            INSERT INTO store_items (table_name, partition_key, sort_key, body)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (table_name, partition_key, sort_key)
            DO UPDATE SET body = EXCLUDED.body
            "#,
        )
        .bind(table)
        .bind(&key.partition)
        .bind(sort_value(&key))
        .bind(Json(&item))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &ItemKey) -> Result<(), StoreError> {
        self.registry.schema(table)?.check_key(key)?;

        let result = sqlx::query(
            r#"
            DELETE FROM store_items
            WHERE table_name = $1 AND partition_key = $2 AND sort_key = $3
            "#,
        )
        .bind(table)
        .bind(&key.partition)
        .bind(sort_value(key))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_row_maps_to_not_found() {
        assert_eq!(map_sqlx_error(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn test_pool_exhaustion_maps_to_unavailable() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_sort_value_defaults_to_empty() {
        assert_eq!(sort_value(&ItemKey::partition("u-1")), "");
        assert_eq!(sort_value(&ItemKey::compound("n-1", "u-1")), "u-1");
    }
}
