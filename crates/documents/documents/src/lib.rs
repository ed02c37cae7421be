//! Document metadata repository for Vellum.
//!
//! [`DocumentStore`] is the backend seam (in-memory, `PostgreSQL`).
//! [`DocumentRepository`] sits on top: it stamps audit fields before each
//! write, reads through the soft-delete visibility filter, and answers with
//! [`ApiResponse`](vellum_core::ApiResponse) envelopes.

pub mod error;
pub mod repository;
pub mod store;
pub mod testing;

pub use error::DocumentStoreError;
pub use repository::{DocumentRepository, MetadataUpdate};
pub use store::DocumentStore;
