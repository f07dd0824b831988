//! Audit contract applied to every persisted entity.
//!
//! Every domain table carries the same column set: creation/update/delete
//! provenance, timestamps, and an optimistic-concurrency version counter.
//! The column set is modeled as a struct composed into each row, and the
//! stamping/check logic lives here so every mutation path enforces the same
//! invariants regardless of backend.
//!
//! # Invariants
//! - `version` starts at 1 and increments by exactly 1 per successful
//!   mutation (update or soft delete).
//! - `updated_at` is monotonically non-decreasing per row.
//! - A row with `deleted_at` set is logically removed; it is never physically
//!   deleted by normal mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::{EntityId, UserId};

/// Optimistic-concurrency check failure: the caller acted on a stale read.
///
/// The write is rejected, never merged; the caller must re-read and resubmit.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
#[error("version conflict (expected: {expected}, actual: {actual})")]
pub struct VersionConflict {
    pub expected: u64,
    pub actual: u64,
}

/// Audit columns shared by every persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<UserId>,
    pub version: u64,
}

impl AuditTrail {
    /// Stamp a freshly created row.
    ///
    /// Server-assigned: caller-supplied values for these fields are never
    /// honored by the stores.
    pub fn created(actor: Option<UserId>, now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            created_by: actor,
            updated_at: now,
            updated_by: actor,
            deleted_at: None,
            deleted_by: None,
            version: 1,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Require the row to be at the version the caller last observed.
    pub fn expect_version(&self, expected: u64) -> Result<(), VersionConflict> {
        if self.version == expected {
            Ok(())
        } else {
            Err(VersionConflict {
                expected,
                actual: self.version,
            })
        }
    }

    /// Stamp a successful update: `version + 1`, `updated_at` non-decreasing.
    pub fn stamp_updated(&mut self, actor: Option<UserId>, now: DateTime<Utc>) {
        self.updated_at = self.updated_at.max(now);
        self.updated_by = actor;
        self.version += 1;
    }

    /// Stamp a soft delete: the row stays in place, marked logically removed.
    pub fn stamp_deleted(&mut self, actor: Option<UserId>, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.deleted_by = actor;
        self.stamp_updated(actor, now);
    }
}

/// A persisted entity row: identity + audit columns + the domain record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audited<T> {
    pub id: EntityId,
    #[serde(flatten)]
    pub audit: AuditTrail,
    pub record: T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn test_actor() -> Option<UserId> {
        Some(UserId::from_i64(7))
    }

    #[test]
    fn created_rows_start_live_at_version_one() {
        let audit = AuditTrail::created(test_actor(), test_time());
        assert_eq!(audit.version, 1);
        assert_eq!(audit.created_at, test_time());
        assert_eq!(audit.updated_at, test_time());
        assert_eq!(audit.created_by, test_actor());
        assert!(!audit.is_deleted());
    }

    #[test]
    fn expect_version_rejects_stale_reads() {
        let audit = AuditTrail::created(None, test_time());
        assert!(audit.expect_version(1).is_ok());

        let err = audit.expect_version(3).unwrap_err();
        assert_eq!(
            err,
            VersionConflict {
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn updates_increment_version_by_exactly_one() {
        let mut audit = AuditTrail::created(None, test_time());
        audit.stamp_updated(test_actor(), test_time() + chrono::Duration::seconds(5));
        assert_eq!(audit.version, 2);
        audit.stamp_updated(test_actor(), test_time() + chrono::Duration::seconds(10));
        assert_eq!(audit.version, 3);
    }

    #[test]
    fn updated_at_never_goes_backwards() {
        let mut audit = AuditTrail::created(None, test_time());
        let later = test_time() + chrono::Duration::seconds(30);
        audit.stamp_updated(None, later);
        assert_eq!(audit.updated_at, later);

        // A clock that went backwards must not regress the row.
        audit.stamp_updated(None, test_time());
        assert_eq!(audit.updated_at, later);
        assert_eq!(audit.version, 3);
    }

    #[test]
    fn soft_delete_marks_the_row_and_counts_as_a_mutation() {
        let mut audit = AuditTrail::created(None, test_time());
        let later = test_time() + chrono::Duration::seconds(60);
        audit.stamp_deleted(test_actor(), later);

        assert!(audit.is_deleted());
        assert_eq!(audit.deleted_at, Some(later));
        assert_eq!(audit.deleted_by, test_actor());
        assert_eq!(audit.version, 2);
    }
}
