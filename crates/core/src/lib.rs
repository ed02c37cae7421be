//! Core types for the Vellum document service.
//!
//! - [`Identifier`]: sortable 26-character identifiers
//! - [`AuditInfo`], [`Audited`], [`SoftDelete`]: the audited-entity model
//! - [`Document`]: metadata for a stored rendered artifact
//! - [`ApiResponse`]: the result envelope returned by every fallible operation

pub mod audit;
pub mod document;
pub mod error;
pub mod id;
pub mod response;

pub use audit::{AuditInfo, Audited, SaveKind, SoftDelete, Visibility, pre_save};
pub use document::{DOCUMENT_TYPE_PDF, Document};
pub use error::{AuditViolation, MalformedIdentifier};
pub use id::Identifier;
pub use response::{ApiError, ApiResponse, ErrorKind};
