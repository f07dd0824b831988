//! Process configuration, read once at startup.

use anyhow::{Context, Result, bail};
use chrono::Duration;

use boltline_auth::SessionSecret;

/// Paths gated by default: the app shell plus the domain views.
pub const DEFAULT_PROTECTED_PATHS: &[&str] = &["/", "/customers", "/screws", "/accounts", "/whoami"];

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub secret: SessionSecret,
    pub session_lifetime: Duration,
    pub protected_paths: Vec<String>,
    /// `Some` selects the Postgres stores; `None` the in-memory ones.
    pub database_url: Option<String>,
    pub admin_password: Option<String>,
}

impl AppConfig {
    /// Read configuration from the environment.
    ///
    /// A missing or empty `SESSION_SECRET` is a fatal error: the process
    /// must not serve authenticated routes without it.
    pub fn from_env() -> Result<Self> {
        let secret_raw = std::env::var("SESSION_SECRET")
            .context("SESSION_SECRET is not set; refusing to serve without a signing secret")?;
        let secret = SessionSecret::new(secret_raw.into_bytes())
            .context("SESSION_SECRET is unusable; refusing to serve without a signing secret")?;

        let session_lifetime = match std::env::var("SESSION_TTL_SECS") {
            Ok(raw) => {
                let secs: i64 = raw.parse().context("SESSION_TTL_SECS must be an integer")?;
                if secs <= 0 {
                    bail!("SESSION_TTL_SECS must be positive");
                }
                Duration::seconds(secs)
            }
            Err(_) => Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        };

        let protected_paths = match std::env::var("PROTECTED_PATHS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
            Err(_) => DEFAULT_PROTECTED_PATHS.iter().map(|p| p.to_string()).collect(),
        };

        let use_persistent = std::env::var("USE_PERSISTENT_STORES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);
        let database_url = if use_persistent {
            Some(
                std::env::var("DATABASE_URL")
                    .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?,
            )
        } else {
            None
        };

        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            secret,
            session_lifetime,
            protected_paths,
            database_url,
            admin_password: std::env::var("ADMIN_PASSWORD").ok(),
        })
    }
}
