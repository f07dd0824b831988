use boltline_auth::{Role, Session};
use boltline_core::UserId;

/// Session context for a request (verified identity + role).
///
/// Inserted into request extensions by the gate; present on every request
/// that reached a protected handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn subject_id(&self) -> UserId {
        self.session.subject_id
    }

    pub fn username(&self) -> &str {
        &self.session.username
    }

    pub fn role(&self) -> Role {
        self.session.role
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
