//! Small helpers shared by the CRUD route modules.

use axum::{http::StatusCode, response::Response};
use serde::Deserialize;

use boltline_core::EntityId;
use boltline_infra::DeletedRows;

use crate::app::errors::json_error;

/// Parse a path segment into an entity id, or produce the 400 response.
pub(crate) fn parse_id(raw: &str, what: &'static str) -> Result<EntityId, Response> {
    raw.parse().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what} id"),
        )
    })
}

/// Listing/read flag: soft-deleted rows are visible only on explicit opt-in.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

impl ListQuery {
    pub fn deleted_rows(&self) -> DeletedRows {
        if self.include_deleted {
            DeletedRows::Include
        } else {
            DeletedRows::Exclude
        }
    }
}

/// Soft deletes carry the observed version in the query string.
#[derive(Debug, Deserialize)]
pub(crate) struct DeleteQuery {
    pub version: u64,
}
