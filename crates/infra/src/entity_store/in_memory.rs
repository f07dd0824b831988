//! In-memory entity store for dev/tests.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use boltline_core::{AuditTrail, Audited, EntityId, UserId};

use super::{DeletedRows, EntityStore, StoreError};

/// In-memory audited store: a row map plus an id sequence.
#[derive(Debug)]
pub struct InMemoryEntityStore<T> {
    rows: RwLock<HashMap<EntityId, Audited<T>>>,
    next_id: AtomicI64,
}

impl<T> InMemoryEntityStore<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate_id(&self) -> EntityId {
        EntityId::from_i64(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

impl<T> Default for InMemoryEntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_poisoned() -> StoreError {
    StoreError::Backend("entity store lock poisoned".to_string())
}

#[async_trait]
impl<T> EntityStore<T> for InMemoryEntityStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn create(&self, record: T, actor: Option<UserId>) -> Result<Audited<T>, StoreError> {
        let row = Audited {
            id: self.allocate_id(),
            audit: AuditTrail::created(actor, Utc::now()),
            record,
        };

        let mut rows = self.rows.write().map_err(|_| lock_poisoned())?;
        rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id: EntityId,
        expected_version: u64,
        record: T,
        actor: Option<UserId>,
    ) -> Result<Audited<T>, StoreError> {
        let mut rows = self.rows.write().map_err(|_| lock_poisoned())?;
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        if row.audit.is_deleted() {
            return Err(StoreError::NotFound);
        }

        row.audit.expect_version(expected_version)?;
        row.record = record;
        row.audit.stamp_updated(actor, Utc::now());
        Ok(row.clone())
    }

    async fn soft_delete(
        &self,
        id: EntityId,
        expected_version: u64,
        actor: Option<UserId>,
    ) -> Result<Audited<T>, StoreError> {
        let mut rows = self.rows.write().map_err(|_| lock_poisoned())?;
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        if row.audit.is_deleted() {
            return Err(StoreError::NotFound);
        }

        row.audit.expect_version(expected_version)?;
        row.audit.stamp_deleted(actor, Utc::now());
        Ok(row.clone())
    }

    async fn get(
        &self,
        id: EntityId,
        deleted: DeletedRows,
    ) -> Result<Option<Audited<T>>, StoreError> {
        let rows = self.rows.read().map_err(|_| lock_poisoned())?;
        Ok(rows
            .get(&id)
            .filter(|row| deleted.include_deleted() || !row.audit.is_deleted())
            .cloned())
    }

    async fn list(&self, deleted: DeletedRows) -> Result<Vec<Audited<T>>, StoreError> {
        let rows = self.rows.read().map_err(|_| lock_poisoned())?;
        let mut out: Vec<Audited<T>> = rows
            .values()
            .filter(|row| deleted.include_deleted() || !row.audit.is_deleted())
            .cloned()
            .collect();
        out.sort_by_key(|row| (row.audit.created_at, row.id));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boltline_core::VersionConflict;

    fn store() -> InMemoryEntityStore<String> {
        InMemoryEntityStore::new()
    }

    fn actor(id: i64) -> Option<UserId> {
        Some(UserId::from_i64(id))
    }

    #[tokio::test]
    async fn create_assigns_ids_and_starts_at_version_one() {
        let store = store();
        let a = store.create("widget".to_string(), actor(1)).await.unwrap();
        let b = store.create("gadget".to_string(), actor(1)).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.audit.version, 1);
        assert_eq!(a.audit.created_by, actor(1));
        assert!(a.audit.deleted_at.is_none());
    }

    #[tokio::test]
    async fn update_requires_the_observed_version() {
        let store = store();
        let created = store.create("v1".to_string(), None).await.unwrap();

        let updated = store
            .update(created.id, 1, "v2".to_string(), actor(2))
            .await
            .unwrap();
        assert_eq!(updated.audit.version, 2);
        assert_eq!(updated.record, "v2");
        assert_eq!(updated.audit.updated_by, actor(2));

        // A second writer still holding version 1 is rejected, and the row
        // is left exactly as the first writer committed it.
        let err = store
            .update(created.id, 1, "v2-lost".to_string(), actor(3))
            .await
            .unwrap_err();
        match err {
            StoreError::VersionConflict(VersionConflict { expected, actual }) => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 2);
            }
            other => panic!("expected VersionConflict, got {other:?}"),
        }

        let row = store
            .get(created.id, DeletedRows::Exclude)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.record, "v2");
        assert_eq!(row.audit.version, 2);
    }

    #[tokio::test]
    async fn soft_delete_hides_rows_from_default_reads() {
        let store = store();
        let kept = store.create("kept".to_string(), None).await.unwrap();
        let doomed = store.create("doomed".to_string(), None).await.unwrap();

        let deleted = store.soft_delete(doomed.id, 1, actor(9)).await.unwrap();
        assert!(deleted.audit.deleted_at.is_some());
        assert_eq!(deleted.audit.deleted_by, actor(9));
        assert_eq!(deleted.audit.version, 2);

        let live = store.list(DeletedRows::Exclude).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id, kept.id);

        let all = store.list(DeletedRows::Include).await.unwrap();
        assert_eq!(all.len(), 2);

        assert!(
            store
                .get(doomed.id, DeletedRows::Exclude)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .get(doomed.id, DeletedRows::Include)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn mutating_deleted_rows_is_not_found() {
        let store = store();
        let row = store.create("x".to_string(), None).await.unwrap();
        store.soft_delete(row.id, 1, None).await.unwrap();

        assert!(matches!(
            store.update(row.id, 2, "y".to_string(), None).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.soft_delete(row.id, 2, None).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let store = store();
        assert!(matches!(
            store
                .update(EntityId::from_i64(999), 1, "x".to_string(), None)
                .await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn create_update_stale_update_scenario() {
        let store = store();
        let created = store.create("draft".to_string(), None).await.unwrap();
        assert_eq!(created.audit.version, 1);
        assert!(created.audit.deleted_at.is_none());

        let updated = store
            .update(created.id, 1, "final".to_string(), None)
            .await
            .unwrap();
        assert_eq!(updated.audit.version, 2);

        let err = store
            .update(created.id, 1, "stale".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict(_)));

        let row = store
            .get(created.id, DeletedRows::Exclude)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.audit.version, 2);
        assert_eq!(row.record, "final");
    }

    #[tokio::test]
    async fn list_is_in_creation_order() {
        let store = store();
        let first = store.create("first".to_string(), None).await.unwrap();
        let second = store.create("second".to_string(), None).await.unwrap();
        let third = store.create("third".to_string(), None).await.unwrap();

        let ids: Vec<EntityId> = store
            .list(DeletedRows::Exclude)
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[tokio::test]
    async fn updated_at_is_monotonic_across_mutations() {
        let store = store();
        let created = store.create("a".to_string(), None).await.unwrap();
        let mut last = created.audit.updated_at;

        for (version, payload) in [(1, "b"), (2, "c"), (3, "d")] {
            let row = store
                .update(created.id, version, payload.to_string(), None)
                .await
                .unwrap();
            assert!(row.audit.updated_at >= last);
            last = row.audit.updated_at;
        }
    }
}
