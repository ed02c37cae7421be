mod documents;
mod logging;
mod renderer;
mod server;
mod storage;


pub use documents::*;
pub use logging::*;
pub use renderer::*;
pub use server::*;
pub use storage::*;

use std::path::Path;

use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Vellum server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct VellumConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Remote renderer configuration.
    #[serde(default)]
    pub renderer: RendererConfig,
    /// Object storage backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Document metadata backend configuration.
    #[serde(default)]
    pub documents: DocumentsConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VellumConfig {
    /// Parse a configuration document.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        toml::from_str(contents).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load configuration from `path`, or defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}
