//! Postgres-backed tenant store.
//!
//! All collections share one table and are stored as JSONB documents:
//!
//! ```sql
//! nc_records(tenant_id UUID, collection TEXT, record_id TEXT, doc JSONB, ...)
//! PRIMARY KEY (tenant_id, collection, record_id)
//! ```
//!
//! Documents are decoded into typed records on read; a document that no
//! longer matches the record type surfaces as `StoreError::Deserialize`.
//!
//! ## Error Mapping
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | Database (any code) | `Backend` with the database message |
//! | PoolClosed | `Backend` ("connection pool closed") |
//! | Other | `Backend` |

use std::fmt::Display;
use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use sqlx::{PgPool, Row};
use tracing::instrument;

use neurocore_core::TenantId;

use super::{StoreError, TenantStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS nc_records (
    tenant_id   UUID        NOT NULL,
    collection  TEXT        NOT NULL,
    record_id   TEXT        NOT NULL,
    doc         JSONB       NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (tenant_id, collection, record_id)
)
"#;

/// Create the backing table if it does not exist yet.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;
    Ok(())
}

/// One logical collection (e.g. `inventory_items`) inside `nc_records`.
pub struct PostgresTenantStore<K, V> {
    pool: PgPool,
    collection: &'static str,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> PostgresTenantStore<K, V> {
    pub fn new(pool: PgPool, collection: &'static str) -> Self {
        Self {
            pool,
            collection,
            _marker: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }
}

impl<K, V> Clone for PostgresTenantStore<K, V> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone(), self.collection)
    }
}

impl<K, V> PostgresTenantStore<K, V>
where
    V: DeserializeOwned,
{
    fn decode(&self, doc: serde_json::Value) -> Result<V, StoreError> {
        serde_json::from_value(doc).map_err(|e| StoreError::Deserialize {
            collection: self.collection,
            message: e.to_string(),
        })
    }

    fn decode_row(&self, row: &sqlx::postgres::PgRow) -> Result<V, StoreError> {
        let doc: serde_json::Value = row
            .try_get("doc")
            .map_err(|e| map_sqlx_error("decode_row", e))?;
        self.decode(doc)
    }
}

#[async_trait::async_trait]
impl<K, V> TenantStore<K, V> for PostgresTenantStore<K, V>
where
    K: Display + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    #[instrument(skip(self, key), fields(collection = self.collection, tenant_id = %tenant_id), err)]
    async fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT doc
            FROM nc_records
            WHERE tenant_id = $1 AND collection = $2 AND record_id = $3
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(self.collection)
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        row.map(|row| self.decode_row(&row)).transpose()
    }

    #[instrument(skip(self, key, value), fields(collection = self.collection, tenant_id = %tenant_id), err)]
    async fn upsert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        let doc = serde_json::to_value(&value).map_err(|e| StoreError::Serialize {
            collection: self.collection,
            message: e.to_string(),
        })?;

        sqlx::query(
            r#"
            INSERT INTO nc_records (tenant_id, collection, record_id, doc)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, collection, record_id)
            DO UPDATE SET
                doc = EXCLUDED.doc,
                updated_at = NOW()
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(self.collection)
        .bind(key.to_string())
        .bind(doc)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert", e))?;

        Ok(())
    }

    #[instrument(skip(self, key), fields(collection = self.collection, tenant_id = %tenant_id), err)]
    async fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        let row = sqlx::query(
            r#"
            DELETE FROM nc_records
            WHERE tenant_id = $1 AND collection = $2 AND record_id = $3
            RETURNING doc
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(self.collection)
        .bind(key.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("remove", e))?;

        row.map(|row| self.decode_row(&row)).transpose()
    }

    #[instrument(skip(self), fields(collection = self.collection, tenant_id = %tenant_id), err)]
    async fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT doc
            FROM nc_records
            WHERE tenant_id = $1 AND collection = $2
            ORDER BY record_id COLLATE "C" ASC
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(self.collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(|row| self.decode_row(row)).collect()
    }
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    let message = match err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => format!("database error {code}: {}", db_err.message()),
            None => format!("database error: {}", db_err.message()),
        },
        sqlx::Error::PoolClosed => "connection pool closed".to_string(),
        other => other.to_string(),
    };
    StoreError::Backend { operation, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurocore_core::RecordId;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn shape_mismatch_is_a_deserialize_error() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let store: PostgresTenantStore<RecordId, neurocore_sales::SaleRecord> =
            PostgresTenantStore::new(pool, "sales");

        let err = store
            .decode(serde_json::json!({"id": "not-a-sale"}))
            .unwrap_err();
        match err {
            StoreError::Deserialize { collection, .. } => assert_eq!(collection, "sales"),
            other => panic!("expected Deserialize, got {other:?}"),
        }
    }
}
