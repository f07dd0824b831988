//! Session model (transport-agnostic).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boltline_core::UserId;

use crate::Role;

/// Identity facts embedded in a token at issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub subject_id: UserId,
    pub username: String,
    pub role: Role,
}

/// A verified, time-bounded session.
///
/// A `Session` exists only as the output of [`crate::SessionCodec::verify`]:
/// its signature checked out and it had not expired at verification time. It
/// is never constructed from unverified input and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject_id: UserId,
    pub username: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            subject_id: self.subject_id,
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// Wire form of the token claims.
///
/// Field names and types are the external contract:
/// `{ id, username, role, iat, exp }` with unix-second timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}
