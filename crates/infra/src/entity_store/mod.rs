//! Audited entity storage abstraction.
//!
//! One store per entity table. Both backends enforce the audit contract
//! through `boltline_core::audit`: server-assigned stamps, soft deletes, and
//! version-checked mutations. The version check is the only concurrency
//! control; a caller that loses the race gets a conflict and must re-read.

pub mod in_memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use boltline_core::{Audited, EntityId, UserId, VersionConflict};

pub use in_memory::InMemoryEntityStore;
pub use postgres::PostgresEntityStore;

/// Whether reads see soft-deleted rows.
///
/// Excluding them is the default everywhere; including them is a deliberate
/// per-call opt-in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DeletedRows {
    #[default]
    Exclude,
    Include,
}

impl DeletedRows {
    pub fn include_deleted(self) -> bool {
        matches!(self, DeletedRows::Include)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The target row does not exist, or is soft-deleted and the caller did
    /// not opt into operating on deleted rows.
    #[error("not found")]
    NotFound,

    /// The caller presented a stale version; the row was left untouched.
    #[error(transparent)]
    VersionConflict(#[from] VersionConflict),

    #[error("record serialization failed: {0}")]
    Serialization(String),

    #[error("storage failure: {0}")]
    Backend(String),
}

/// Uniform mutation/read contract over audited entity rows.
#[async_trait]
pub trait EntityStore<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Persist a new row. Audit columns are server-assigned (`version = 1`,
    /// live, stamped with `actor` and the store's clock).
    async fn create(&self, record: T, actor: Option<UserId>) -> Result<Audited<T>, StoreError>;

    /// Replace the record payload of a live row, requiring the version the
    /// caller last observed.
    async fn update(
        &self,
        id: EntityId,
        expected_version: u64,
        record: T,
        actor: Option<UserId>,
    ) -> Result<Audited<T>, StoreError>;

    /// Mark a live row deleted (it is never physically removed), requiring
    /// the version the caller last observed.
    async fn soft_delete(
        &self,
        id: EntityId,
        expected_version: u64,
        actor: Option<UserId>,
    ) -> Result<Audited<T>, StoreError>;

    async fn get(&self, id: EntityId, deleted: DeletedRows)
    -> Result<Option<Audited<T>>, StoreError>;

    /// All rows in creation order.
    async fn list(&self, deleted: DeletedRows) -> Result<Vec<Audited<T>>, StoreError>;
}
