//! Session token issue/verify (HS256).
//!
//! The codec is stateless and keyed by a shared secret: only the holder of
//! the secret can mint a token that verifies. Expiry is evaluated against a
//! caller-supplied clock so callers (and tests) control time; the JWT
//! library's ambient-clock expiry check is disabled for the same reason.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use boltline_core::UserId;

use crate::session::{Session, SessionClaims, SessionIdentity};

/// Process-wide signing secret, configured once at startup.
///
/// Constructing one from an empty value is refused: the service must not
/// serve authenticated routes without a real secret.
#[derive(Clone)]
pub struct SessionSecret(Vec<u8>);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("session secret must not be empty")]
    Empty,
}

impl SessionSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, SecretError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(SecretError::Empty);
        }
        Ok(Self(bytes))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Never log key material.
        f.write_str("SessionSecret(..)")
    }
}

#[derive(Debug, Error)]
pub enum SessionIssueError {
    #[error("failed to encode session token: {0}")]
    Encoding(String),
}

/// Why a token failed verification.
///
/// Kept distinct for logging and tests; at the HTTP boundary both outcomes
/// degrade to the same unauthenticated behavior.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionVerifyError {
    /// Not a structurally valid token signed with our secret.
    #[error("malformed or forged session token")]
    Malformed,

    /// Valid signature and structure, but the validity window has passed.
    #[error("session token has expired")]
    Expired,
}

/// Issues and verifies signed, time-bounded session tokens.
pub struct SessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl SessionCodec {
    pub fn new(secret: &SessionSecret, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mint a signed token for a verified identity.
    ///
    /// Pure function of the identity, the secret, and `now`.
    pub fn issue(
        &self,
        identity: &SessionIdentity,
        now: DateTime<Utc>,
    ) -> Result<String, SessionIssueError> {
        let claims = SessionClaims {
            id: identity.subject_id.as_i64(),
            username: identity.username.clone(),
            role: identity.role,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionIssueError::Encoding(e.to_string()))
    }

    /// Verify a token and derive the session it encodes.
    ///
    /// Never panics on arbitrary input: every failure is a typed value.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Session, SessionVerifyError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| SessionVerifyError::Malformed)?;
        let claims = data.claims;

        let issued_at = DateTime::<Utc>::from_timestamp(claims.iat, 0)
            .ok_or(SessionVerifyError::Malformed)?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0)
            .ok_or(SessionVerifyError::Malformed)?;

        if expires_at <= now {
            return Err(SessionVerifyError::Expired);
        }

        Ok(Session {
            subject_id: UserId::from_i64(claims.id),
            username: claims.username,
            role: claims.role,
            issued_at,
            expires_at,
        })
    }
}
