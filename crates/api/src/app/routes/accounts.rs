//! User account management over the audited store.
//!
//! Password hashes never leave this module: responses carry the account
//! fields only.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use boltline_auth::Role;
use boltline_core::Audited;
use boltline_domain::UserAccount;
use boltline_infra::{DeletedRows, password};

use super::common::{DeleteQuery, ListQuery, parse_id};
use crate::app::AppServices;
use crate::app::errors::{domain_error_to_response, json_error, store_error_to_response};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_accounts).post(create_account))
        .route(
            "/:id",
            get(get_account).put(update_account).delete(delete_account),
        )
}

#[derive(Debug, Deserialize)]
struct CreateAccountRequest {
    username: String,
    display_name: String,
    role: Role,
    password: String,
}

#[derive(Debug, Deserialize)]
struct UpdateAccountRequest {
    version: u64,
    display_name: String,
    role: Role,
    /// When absent the existing password is kept.
    password: Option<String>,
}

fn account_to_json(row: &Audited<UserAccount>) -> serde_json::Value {
    serde_json::json!({
        "id": row.id,
        "version": row.audit.version,
        "created_at": row.audit.created_at,
        "updated_at": row.audit.updated_at,
        "deleted_at": row.audit.deleted_at,
        "username": row.record.username,
        "display_name": row.record.display_name,
        "role": row.record.role,
    })
}

async fn list_accounts(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> Response {
    match services.accounts.list(query.deleted_rows()).await {
        Ok(rows) => Json(rows.iter().map(account_to_json).collect::<Vec<_>>()).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn get_account(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response {
    let id = match parse_id(&id, "account") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services.accounts.get(id, query.deleted_rows()).await {
        Ok(Some(row)) => Json(account_to_json(&row)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "account not found"),
        Err(e) => store_error_to_response(e),
    }
}

async fn create_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<CreateAccountRequest>,
) -> Response {
    let password_hash = match password::hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "failed to hash password");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "hash_error",
                "failed to hash password",
            );
        }
    };

    let record = UserAccount {
        username: body.username,
        display_name: body.display_name,
        role: body.role,
        password_hash,
    };
    if let Err(e) = record.validate() {
        return domain_error_to_response(e);
    }

    // Usernames must be unique among live accounts.
    let existing = match services.accounts.list(DeletedRows::Exclude).await {
        Ok(rows) => rows,
        Err(e) => return store_error_to_response(e),
    };
    if existing
        .iter()
        .any(|row| row.record.username == record.username)
    {
        return json_error(StatusCode::CONFLICT, "conflict", "username already taken");
    }

    match services
        .accounts
        .create(record, Some(session.subject_id()))
        .await
    {
        Ok(row) => (StatusCode::CREATED, Json(account_to_json(&row))).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn update_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<UpdateAccountRequest>,
) -> Response {
    let id = match parse_id(&id, "account") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let current = match services.accounts.get(id, DeletedRows::Exclude).await {
        Ok(Some(row)) => row,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "not_found", "account not found"),
        Err(e) => return store_error_to_response(e),
    };

    let password_hash = match body.password {
        Some(password) => match password::hash_password(&password) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(error = %e, "failed to hash password");
                return json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "hash_error",
                    "failed to hash password",
                );
            }
        },
        None => current.record.password_hash.clone(),
    };

    let record = UserAccount {
        username: current.record.username.clone(),
        display_name: body.display_name,
        role: body.role,
        password_hash,
    };
    if let Err(e) = record.validate() {
        return domain_error_to_response(e);
    }

    match services
        .accounts
        .update(id, body.version, record, Some(session.subject_id()))
        .await
    {
        Ok(row) => Json(account_to_json(&row)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn delete_account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Response {
    let id = match parse_id(&id, "account") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match services
        .accounts
        .soft_delete(id, query.version, Some(session.subject_id()))
        .await
    {
        Ok(row) => Json(account_to_json(&row)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}
