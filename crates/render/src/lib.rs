//! Rendering client: turns HTML and CSS into PDF bytes through a remote
//! Gotenberg-compatible service.

pub mod client;
pub mod config;
pub mod error;
pub mod template;

pub use client::{GotenbergClient, Renderer};
pub use config::{DEFAULT_BASE_URL, DEFAULT_RENDER_PATH, PageLayout, RenderConfig};
pub use error::RenderError;
pub use template::wrap_document;
