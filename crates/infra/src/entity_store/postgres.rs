//! Postgres-backed audited entity store.
//!
//! One table per store, all sharing the same layout: a BIGSERIAL id, the
//! audit columns, and the record payload as JSONB. Optimistic concurrency is
//! enforced in the UPDATE statement itself (`WHERE version = $n AND
//! deleted_at IS NULL`), so a lost race can never overwrite a newer row; a
//! zero-row result is disambiguated into not-found vs stale-version by
//! re-reading the row.

use core::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{PgPool, Row};

use boltline_core::{AuditTrail, Audited, EntityId, UserId, VersionConflict};

use super::{DeletedRows, EntityStore, StoreError};

/// Postgres audited store for one entity table.
#[derive(Debug)]
pub struct PostgresEntityStore<T> {
    pool: Arc<PgPool>,
    table: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> PostgresEntityStore<T> {
    pub fn new(pool: PgPool, table: &'static str) -> Self {
        Self {
            pool: Arc::new(pool),
            table,
            _record: PhantomData,
        }
    }

    /// Create the table and its access paths if they do not exist yet.
    ///
    /// The three indexes cover the read patterns every audited table must
    /// serve efficiently: the live-row predicate, creation-time ordering,
    /// and per-actor activity.
    #[tracing::instrument(skip(self), fields(table = self.table))]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let table = self.table;
        let statements = [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id BIGSERIAL PRIMARY KEY,
                    record JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    created_by BIGINT,
                    updated_at TIMESTAMPTZ NOT NULL,
                    updated_by BIGINT,
                    deleted_at TIMESTAMPTZ,
                    deleted_by BIGINT,
                    version BIGINT NOT NULL
                )
                "#
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS {table}_live_idx ON {table} (id) WHERE deleted_at IS NULL"
            ),
            format!("CREATE INDEX IF NOT EXISTS {table}_created_at_idx ON {table} (created_at)"),
            format!(
                "CREATE INDEX IF NOT EXISTS {table}_actor_idx ON {table} (created_by, created_at)"
            ),
        ];

        for statement in statements {
            sqlx::query(&statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Re-read a row's concurrency state after a conditional UPDATE matched
    /// nothing: distinguishes "gone" from "stale version".
    async fn classify_missed_update(&self, id: EntityId, expected_version: u64) -> StoreError {
        let sql = format!("SELECT version, deleted_at FROM {} WHERE id = $1", self.table);
        let row = match sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
        {
            Ok(row) => row,
            Err(e) => return map_sqlx_error("classify_missed_update", e),
        };

        let Some(row) = row else {
            return StoreError::NotFound;
        };

        let deleted_at: Option<DateTime<Utc>> = match row.try_get("deleted_at") {
            Ok(value) => value,
            Err(e) => return StoreError::Backend(format!("failed to read row: {e}")),
        };
        if deleted_at.is_some() {
            return StoreError::NotFound;
        }

        match row.try_get::<i64, _>("version") {
            Ok(actual) => StoreError::VersionConflict(VersionConflict {
                expected: expected_version,
                actual: actual as u64,
            }),
            Err(e) => StoreError::Backend(format!("failed to read row: {e}")),
        }
    }
}

const AUDITED_COLUMNS: &str = "id, record, created_at, created_by, updated_at, updated_by, deleted_at, deleted_by, version";

#[async_trait]
impl<T> EntityStore<T> for PostgresEntityStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn create(&self, record: T, actor: Option<UserId>) -> Result<Audited<T>, StoreError> {
        let payload =
            serde_json::to_value(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now();

        let sql = format!(
            r#"
            INSERT INTO {} (record, created_at, created_by, updated_at, updated_by, version)
            VALUES ($1, $2, $3, $2, $3, 1)
            RETURNING {AUDITED_COLUMNS}
            "#,
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(&payload)
            .bind(now)
            .bind(actor.map(|a| a.as_i64()))
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("create", e))?;

        AuditedRow::from_pg_row(&row)?.into_audited()
    }

    async fn update(
        &self,
        id: EntityId,
        expected_version: u64,
        record: T,
        actor: Option<UserId>,
    ) -> Result<Audited<T>, StoreError> {
        let payload =
            serde_json::to_value(&record).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now();

        let sql = format!(
            r#"
            UPDATE {}
            SET record = $3,
                updated_at = GREATEST(updated_at, $4),
                updated_by = $5,
                version = version + 1
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            RETURNING {AUDITED_COLUMNS}
            "#,
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .bind(expected_version as i64)
            .bind(&payload)
            .bind(now)
            .bind(actor.map(|a| a.as_i64()))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        match row {
            Some(row) => AuditedRow::from_pg_row(&row)?.into_audited(),
            None => Err(self.classify_missed_update(id, expected_version).await),
        }
    }

    async fn soft_delete(
        &self,
        id: EntityId,
        expected_version: u64,
        actor: Option<UserId>,
    ) -> Result<Audited<T>, StoreError> {
        let now = Utc::now();

        let sql = format!(
            r#"
            UPDATE {}
            SET deleted_at = $3,
                deleted_by = $4,
                updated_at = GREATEST(updated_at, $3),
                updated_by = $4,
                version = version + 1
            WHERE id = $1 AND version = $2 AND deleted_at IS NULL
            RETURNING {AUDITED_COLUMNS}
            "#,
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .bind(expected_version as i64)
            .bind(now)
            .bind(actor.map(|a| a.as_i64()))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("soft_delete", e))?;

        match row {
            Some(row) => AuditedRow::from_pg_row(&row)?.into_audited(),
            None => Err(self.classify_missed_update(id, expected_version).await),
        }
    }

    async fn get(
        &self,
        id: EntityId,
        deleted: DeletedRows,
    ) -> Result<Option<Audited<T>>, StoreError> {
        let filter = if deleted.include_deleted() {
            ""
        } else {
            " AND deleted_at IS NULL"
        };
        let sql = format!(
            "SELECT {AUDITED_COLUMNS} FROM {} WHERE id = $1{filter}",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.map(|row| AuditedRow::from_pg_row(&row)?.into_audited())
            .transpose()
    }

    async fn list(&self, deleted: DeletedRows) -> Result<Vec<Audited<T>>, StoreError> {
        let filter = if deleted.include_deleted() {
            ""
        } else {
            " WHERE deleted_at IS NULL"
        };
        let sql = format!(
            "SELECT {AUDITED_COLUMNS} FROM {}{filter} ORDER BY created_at ASC, id ASC",
            self.table
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter()
            .map(|row| AuditedRow::from_pg_row(row)?.into_audited())
            .collect()
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("sqlx error in {operation}: {err}"))
}

/// Raw row shape shared by every audited table.
#[derive(Debug)]
struct AuditedRow {
    id: i64,
    record: serde_json::Value,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_at: DateTime<Utc>,
    updated_by: Option<i64>,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<i64>,
    version: i64,
}

impl AuditedRow {
    fn from_pg_row(row: &sqlx::postgres::PgRow) -> Result<Self, StoreError> {
        let read = |e: sqlx::Error| StoreError::Backend(format!("failed to read row: {e}"));
        Ok(Self {
            id: row.try_get("id").map_err(read)?,
            record: row.try_get("record").map_err(read)?,
            created_at: row.try_get("created_at").map_err(read)?,
            created_by: row.try_get("created_by").map_err(read)?,
            updated_at: row.try_get("updated_at").map_err(read)?,
            updated_by: row.try_get("updated_by").map_err(read)?,
            deleted_at: row.try_get("deleted_at").map_err(read)?,
            deleted_by: row.try_get("deleted_by").map_err(read)?,
            version: row.try_get("version").map_err(read)?,
        })
    }

    fn into_audited<T: DeserializeOwned>(self) -> Result<Audited<T>, StoreError> {
        let record = serde_json::from_value(self.record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Audited {
            id: EntityId::from_i64(self.id),
            audit: AuditTrail {
                created_at: self.created_at,
                created_by: self.created_by.map(UserId::from_i64),
                updated_at: self.updated_at,
                updated_by: self.updated_by.map(UserId::from_i64),
                deleted_at: self.deleted_at,
                deleted_by: self.deleted_by.map(UserId::from_i64),
                version: self.version as u64,
            },
            record,
        })
    }
}
