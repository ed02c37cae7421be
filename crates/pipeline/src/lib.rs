//! Rendering orchestration for Vellum.
//!
//! [`RenderPipeline::generate`] turns a [`RenderRequest`] into a stored PDF
//! and a persisted metadata row. [`RenderPipeline::remove`] undoes both, in
//! the opposite order.

pub mod deadline;
pub mod pipeline;
pub mod request;

pub use pipeline::RenderPipeline;
pub use request::RenderRequest;
