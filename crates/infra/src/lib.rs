//! `mostrador-infra` — concrete adapters for the core's ports.
//!
//! In-memory implementations back tests and local development; the
//! Postgres directory backs deployments. Nothing in here contains policy:
//! the interesting decisions all live above, in `mostrador-tenancy`,
//! `mostrador-auth`, `mostrador-session` and `mostrador-guard`.

pub mod directory;
pub mod identity;
pub mod storage;

pub use directory::in_memory::InMemoryDirectory;
pub use directory::postgres::PostgresDirectory;
pub use identity::InMemoryIdentity;
pub use storage::InMemoryKeyStore;
