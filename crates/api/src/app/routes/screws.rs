//! Screw catalog CRUD over the audited store.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use boltline_core::Audited;
use boltline_domain::Screw;

use super::common::{DeleteQuery, ListQuery, parse_id};
use crate::app::AppServices;
use crate::app::errors::{domain_error_to_response, json_error, store_error_to_response};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_screws).post(create_screw))
        .route("/:id", get(get_screw).put(update_screw).delete(delete_screw))
}

#[derive(Debug, Deserialize)]
struct ScrewPayload {
    designation: String,
    material: Option<String>,
    size: Option<String>,
    #[serde(default)]
    stock: i64,
    #[serde(default)]
    unit_price_cents: i64,
}

impl ScrewPayload {
    fn into_record(self) -> Screw {
        Screw {
            designation: self.designation,
            material: self.material,
            size: self.size,
            stock: self.stock,
            unit_price_cents: self.unit_price_cents,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateScrewRequest {
    version: u64,
    #[serde(flatten)]
    payload: ScrewPayload,
}

fn screw_to_json(row: &Audited<Screw>) -> serde_json::Value {
    serde_json::json!({
        "id": row.id,
        "version": row.audit.version,
        "created_at": row.audit.created_at,
        "updated_at": row.audit.updated_at,
        "deleted_at": row.audit.deleted_at,
        "designation": row.record.designation,
        "material": row.record.material,
        "size": row.record.size,
        "stock": row.record.stock,
        "unit_price_cents": row.record.unit_price_cents,
    })
}

async fn list_screws(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> Response {
    match services.screws.list(query.deleted_rows()).await {
        Ok(rows) => Json(rows.iter().map(screw_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn get_screw(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let id = match parse_id(&id, "screw") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.screws.get(id, query.deleted_rows()).await {
        Ok(Some(row)) => Json(screw_to_json(&row)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "screw not found"),
        Err(e) => store_error_to_response(e),
    }
}

async fn create_screw(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<ScrewPayload>,
) -> Response {
    let record = body.into_record();
    if let Err(e) = record.validate() {
        return domain_error_to_response(e);
    }

    match services
        .screws
        .create(record, Some(session.subject_id()))
        .await
    {
        Ok(row) => (StatusCode::CREATED, Json(screw_to_json(&row))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn update_screw(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateScrewRequest>,
) -> Response {
    let id = match parse_id(&id, "screw") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let record = body.payload.into_record();
    if let Err(e) = record.validate() {
        return domain_error_to_response(e);
    }

    match services
        .screws
        .update(id, body.version, record, Some(session.subject_id()))
        .await
    {
        Ok(row) => Json(screw_to_json(&row)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn delete_screw(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    let id = match parse_id(&id, "screw") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services
        .screws
        .soft_delete(id, query.version, Some(session.subject_id()))
        .await
    {
        Ok(row) => Json(screw_to_json(&row)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}
