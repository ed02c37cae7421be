//! `PostgreSQL` document store for Vellum.
//!
//! Rows live in a single `{schema}.{prefix}documents` table created by
//! [`migrations::run_migrations`]. Transient connectivity errors are retried
//! under a bounded [`RetryPolicy`].

pub mod config;
pub mod migrations;
pub mod retry;
mod store;

pub use config::PostgresConfig;
pub use retry::RetryPolicy;
pub use store::PostgresDocumentStore;
