use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use crate::context::SessionContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "boltline",
        "status": "ok",
    }))
}

pub async fn whoami(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "subject_id": session.subject_id(),
        "username": session.username(),
        "role": session.role(),
        "issued_at": session.session().issued_at,
        "expires_at": session.session().expires_at,
    }))
}
