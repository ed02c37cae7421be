use thiserror::Error;

/// Errors that can occur when starting or running the Vellum server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. reading the config file or binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A storage or metadata backend could not be initialised.
    #[error("backend error: {0}")]
    Backend(String),
}
