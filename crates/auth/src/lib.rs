//! `boltline-auth` — session tokens and the identity model.
//!
//! This crate is intentionally decoupled from HTTP and storage: it turns a
//! verified identity into a tamper-evident token and back, nothing more.

pub mod codec;
pub mod role;
pub mod session;

pub use codec::{SecretError, SessionCodec, SessionIssueError, SessionSecret, SessionVerifyError};
pub use role::Role;
pub use session::{Session, SessionIdentity};
