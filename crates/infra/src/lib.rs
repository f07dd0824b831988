//! `boltline-infra` — storage backends and supporting infrastructure.

pub mod entity_store;
pub mod password;

pub use entity_store::{
    DeletedRows, EntityStore, InMemoryEntityStore, PostgresEntityStore, StoreError,
};
