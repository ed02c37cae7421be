use thiserror::Error;

/// Errors that can occur during object storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The backing store answered with a non-success HTTP status.
    #[error("object store rejected the request with status {status}: {message}")]
    Rejected {
        /// HTTP status returned by the store.
        status: u16,
        /// Backend-provided detail. Logged, never returned to callers.
        message: String,
    },

    /// A storage key could not be derived from the given reference.
    #[error("invalid storage reference: {0}")]
    InvalidReference(String),

    /// The store could not be reached or the exchange failed mid-flight.
    #[error("object storage error: {0}")]
    Storage(String),
}

impl BlobError {
    /// HTTP status reported by the store, if the store answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::InvalidReference(_) | Self::Storage(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_for_rejections() {
        let rejected = BlobError::Rejected {
            status: 403,
            message: "AccessDenied".into(),
        };
        assert_eq!(rejected.status(), Some(403));
        assert_eq!(BlobError::Storage("reset".into()).status(), None);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            BlobError::InvalidReference("ftp://x".into()).to_string(),
            "invalid storage reference: ftp://x"
        );
    }
}
