//! HTTP application wiring (axum router + service wiring).
//!
//! Layout:
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `errors.rs`: consistent JSON error responses
//! - this file: store selection, admin bootstrap, router assembly

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    routing::{get, post},
};
use sqlx::PgPool;
use tower::ServiceBuilder;

use boltline_auth::{Role, SessionCodec};
use boltline_domain::{Customer, Screw, UserAccount};
use boltline_infra::{
    DeletedRows, EntityStore, InMemoryEntityStore, PostgresEntityStore, password,
};

use crate::config::AppConfig;
use crate::middleware::{self, GateState, ProtectedPaths};

pub mod errors;
pub mod routes;

/// Shared service handles available to every handler.
pub struct AppServices {
    pub customers: Arc<dyn EntityStore<Customer>>,
    pub screws: Arc<dyn EntityStore<Screw>>,
    pub accounts: Arc<dyn EntityStore<UserAccount>>,
    pub codec: Arc<SessionCodec>,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: AppConfig) -> Result<Router> {
    let codec = Arc::new(SessionCodec::new(&config.secret, config.session_lifetime));

    let services = match &config.database_url {
        Some(url) => build_postgres_services(url, codec.clone()).await?,
        None => build_in_memory_services(codec.clone()),
    };
    let services = Arc::new(services);

    seed_admin_account(&services, config.admin_password.as_deref()).await?;

    let gate_state = GateState {
        codec,
        protected: Arc::new(ProtectedPaths::new(config.protected_paths.clone())),
    };

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .route("/sign-in", post(routes::sign_in::sign_in))
        .route("/", get(routes::system::index))
        .route("/whoami", get(routes::system::whoami))
        .nest("/customers", routes::customers::router())
        .nest("/screws", routes::screws::router())
        .nest("/accounts", routes::accounts::router())
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            gate_state,
            middleware::session_gate,
        ))
        .layer(ServiceBuilder::new()))
}

fn build_in_memory_services(codec: Arc<SessionCodec>) -> AppServices {
    let customers: Arc<dyn EntityStore<Customer>> = Arc::new(InMemoryEntityStore::new());
    let screws: Arc<dyn EntityStore<Screw>> = Arc::new(InMemoryEntityStore::new());
    let accounts: Arc<dyn EntityStore<UserAccount>> = Arc::new(InMemoryEntityStore::new());

    AppServices {
        customers,
        screws,
        accounts,
        codec,
    }
}

async fn build_postgres_services(url: &str, codec: Arc<SessionCodec>) -> Result<AppServices> {
    let pool = PgPool::connect(url)
        .await
        .context("failed to connect to Postgres")?;

    let customers: PostgresEntityStore<Customer> = PostgresEntityStore::new(pool.clone(), "customers");
    let screws: PostgresEntityStore<Screw> = PostgresEntityStore::new(pool.clone(), "screws");
    let accounts: PostgresEntityStore<UserAccount> = PostgresEntityStore::new(pool, "accounts");

    customers.ensure_schema().await?;
    screws.ensure_schema().await?;
    accounts.ensure_schema().await?;

    Ok(AppServices {
        customers: Arc::new(customers),
        screws: Arc::new(screws),
        accounts: Arc::new(accounts),
        codec,
    })
}

/// Seed the initial administrator when the account table is empty, so a
/// fresh deployment can sign in at all.
async fn seed_admin_account(services: &AppServices, admin_password: Option<&str>) -> Result<()> {
    let existing = services.accounts.list(DeletedRows::Include).await?;
    if !existing.is_empty() {
        return Ok(());
    }

    let password = match admin_password {
        Some(p) => p.to_string(),
        None => {
            tracing::warn!("ADMIN_PASSWORD not set; seeding admin with insecure dev default");
            "admin".to_string()
        }
    };

    let account = UserAccount {
        username: "admin".to_string(),
        display_name: "Administrator".to_string(),
        role: Role::Administrator,
        password_hash: password::hash_password(&password)?,
    };
    let row = services.accounts.create(account, None).await?;
    tracing::info!(account_id = %row.id, "seeded initial admin account");
    Ok(())
}
