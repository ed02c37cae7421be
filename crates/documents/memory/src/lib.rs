//! In-memory [`DocumentStore`](vellum_documents::DocumentStore) for
//! development and tests.

mod store;

pub use store::MemoryDocumentStore;
