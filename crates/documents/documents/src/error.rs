use thiserror::Error;
use vellum_core::{AuditViolation, Identifier, MalformedIdentifier};

/// Errors returned by [`DocumentStore`](crate::DocumentStore) backends.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    /// The backend could not be reached.
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed the operation.
    #[error("backend error: {0}")]
    Backend(String),

    /// A row with this identifier already exists.
    #[error("document {0} already exists")]
    Duplicate(Identifier),

    /// A stored row violates the audit model or carries a bad identifier.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<AuditViolation> for DocumentStoreError {
    fn from(err: AuditViolation) -> Self {
        Self::Corrupt(err.to_string())
    }
}

impl From<MalformedIdentifier> for DocumentStoreError {
    fn from(err: MalformedIdentifier) -> Self {
        Self::Corrupt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_violation_is_corruption() {
        let err: DocumentStoreError = AuditViolation::ModifiedBeforeCreated.into();
        assert!(matches!(err, DocumentStoreError::Corrupt(_)));
    }

    #[test]
    fn duplicate_display_names_id() {
        let id = Identifier::from_u128(0);
        assert_eq!(
            DocumentStoreError::Duplicate(id).to_string(),
            "document 00000000000000000000000000 already exists"
        );
    }
}
