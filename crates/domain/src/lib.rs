//! `boltline-domain` — persisted record types.
//!
//! Every record here is stored as an audited row (see `boltline-core::audit`);
//! the structs carry only the domain payload.

pub mod account;
pub mod customer;
pub mod screw;

pub use account::UserAccount;
pub use customer::Customer;
pub use screw::Screw;
