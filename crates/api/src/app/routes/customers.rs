//! Customer CRUD over the audited store.

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
use boltline_domain::Customer;

use super::common::{DeleteQuery, ListQuery, parse_id};
use crate::app::AppServices;
use crate::app::errors::{domain_error_to_response, json_error, store_error_to_response};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

#[derive(Debug, Deserialize)]
struct CustomerPayload {
    name: String,
    contact_email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    notes: Option<String>,
}

impl CustomerPayload {
    fn into_record(self) -> Customer {
        Customer {
            name: self.name,
            contact_email: self.contact_email,
            phone: self.phone,
            address: self.address,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateCustomerRequest {
    /// The version the caller last observed; stale values are rejected.
    version: u64,
    #[serde(flatten)]
    payload: CustomerPayload,
}

fn customer_to_json(row: &Audited<Customer>) -> serde_json::Value {
    serde_json::json!({
        "id": row.id,
        "version": row.audit.version,
        "created_at": row.audit.created_at,
        "updated_at": row.audit.updated_at,
        "deleted_at": row.audit.deleted_at,
        "name": row.record.name,
        "contact_email": row.record.contact_email,
        "phone": row.record.phone,
        "address": row.record.address,
        "notes": row.record.notes,
    })
}

async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> Response {
    match services.customers.list(query.deleted_rows()).await {
        Ok(rows) => Json(rows.iter().map(customer_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let id = match parse_id(&id, "customer") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.customers.get(id, query.deleted_rows()).await {
        Ok(Some(row)) => Json(customer_to_json(&row)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "customer not found"),
        Err(e) => store_error_to_response(e),
    }
}

async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<CustomerPayload>,
) -> Response {
    let record = body.into_record();
    if let Err(e) = record.validate() {
        return domain_error_to_response(e);
    }

    match services
        .customers
        .create(record, Some(session.subject_id()))
        .await
    {
        Ok(row) => (StatusCode::CREATED, Json(customer_to_json(&row))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCustomerRequest>,
) -> Response {
    let id = match parse_id(&id, "customer") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let record = body.payload.into_record();
    if let Err(e) = record.validate() {
        return domain_error_to_response(e);
    }

    match services
        .customers
        .update(id, body.version, record, Some(session.subject_id()))
        .await
    {
        Ok(row) => Json(customer_to_json(&row)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    let id = match parse_id(&id, "customer") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services
        .customers
        .soft_delete(id, query.version, Some(session.subject_id()))
        .await
    {
        Ok(row) => Json(customer_to_json(&row)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}
