//! Sign-in: credentials in, session cookie out.

use std::sync::Arc;

use axum::{
    Extension, Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use boltline_auth::SessionIdentity;
use boltline_core::UserId;
use boltline_infra::{DeletedRows, password};

use crate::app::AppServices;
use crate::app::errors::{json_error, store_error_to_response};
use crate::middleware::SESSION_COOKIE;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SignInRequest>,
) -> Response {
    let accounts = match services.accounts.list(DeletedRows::Exclude).await {
        Ok(accounts) => accounts,
        Err(e) => return store_error_to_response(e),
    };

    let Some(account) = accounts
        .into_iter()
        .find(|row| row.record.username == body.username)
    else {
        return invalid_credentials();
    };

    if !password::verify_password(&account.record.password_hash, &body.password) {
        return invalid_credentials();
    }

    let identity = SessionIdentity {
        subject_id: UserId::from_i64(account.id.as_i64()),
        username: account.record.username.clone(),
        role: account.record.role,
    };

    let now = Utc::now();
    let token = match services.codec.issue(&identity, now) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to issue session token");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "token_error",
                "failed to issue session token",
            );
        }
    };

    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    let Ok(cookie) = HeaderValue::from_str(&cookie) else {
        return json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "token_error",
            "failed to encode session cookie",
        );
    };

    let mut response = (
        StatusCode::OK,
        Json(serde_json::json!({
            "username": identity.username,
            "role": identity.role,
            "expires_at": now + services.codec.lifetime(),
        })),
    )
        .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    response
}

fn invalid_credentials() -> Response {
    // Unknown username and wrong password are deliberately indistinguishable.
    json_error(
        StatusCode::UNAUTHORIZED,
        "invalid_credentials",
        "invalid credentials",
    )
}
