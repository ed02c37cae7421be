//! Object storage for rendered documents.
//!
//! [`StorageGateway`] derives date-partitioned keys, forms and parses
//! references, and translates backend outcomes into envelopes. Backends
//! implement [`ObjectStore`]; [`MemoryObjectStore`] lives here, S3 lives in
//! `vellum-aws`.

pub mod error;
pub mod gateway;
pub mod memory;
pub mod reference;
pub mod store;

pub use error::BlobError;
pub use gateway::StorageGateway;
pub use memory::{MemoryObjectStore, StoredObject};
pub use reference::{DOCUMENT_PREFIX, ReferenceFormat, ReferenceStyle, object_key};
pub use store::{ObjectStore, PDF_CONTENT_TYPE};
