use chrono::{DateTime, Utc};

use crate::audit::{AuditInfo, Audited, SoftDelete};
use crate::id::Identifier;

/// Document type tag for rendered PDFs.
pub const DOCUMENT_TYPE_PDF: &str = "PDF";

/// Metadata row for a rendered artifact held in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: Identifier,
    /// Free-form title. May be empty.
    pub title: String,
    /// Free-form description. May be empty.
    pub description: String,
    /// Storage reference of the rendered artifact.
    pub url: String,
    /// Classification tag, e.g. [`DOCUMENT_TYPE_PDF`].
    pub document_type: String,
    audit: AuditInfo,
}

impl Document {
    /// A new, unsaved document. Audit fields are finalised by the store.
    pub fn new(
        id: Identifier,
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        document_type: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            url: url.into(),
            document_type: document_type.into(),
            audit: AuditInfo::new(Utc::now()),
        }
    }

    /// Rehydrate a stored document.
    pub fn from_parts(
        id: Identifier,
        title: String,
        description: String,
        url: String,
        document_type: String,
        audit: AuditInfo,
    ) -> Self {
        Self {
            id,
            title,
            description,
            url,
            document_type,
            audit,
        }
    }

    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.audit.creation_time()
    }

    pub fn last_modification_time(&self) -> Option<DateTime<Utc>> {
        self.audit.last_modification_time()
    }

    pub fn deletion_time(&self) -> Option<DateTime<Utc>> {
        self.audit.deletion_time()
    }

    pub fn is_deleted(&self) -> bool {
        self.audit.is_deleted()
    }
}

impl Audited for Document {
    fn id(&self) -> Identifier {
        self.id
    }

    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

impl SoftDelete for Document {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{SaveKind, Visibility, pre_save};

    #[test]
    fn new_document_is_visible_and_unmodified() {
        let doc = Document::new(
            Identifier::generate(),
            "Invoice",
            "",
            "https://b.s3.amazonaws.com/k",
            DOCUMENT_TYPE_PDF,
        );
        assert!(!doc.is_deleted());
        assert!(doc.last_modification_time().is_none());
        assert!(doc.is_visible(Visibility::Active));
        assert_eq!(doc.description, "");
    }

    #[test]
    fn deleted_flag_tracks_deletion_time() {
        let mut doc = Document::new(Identifier::generate(), "t", "d", "u", "PDF");
        pre_save(&mut doc, SaveKind::Insert, Utc::now());
        assert_eq!(doc.is_deleted(), doc.deletion_time().is_some());
        doc.audit_mut().mark_deleted(Utc::now());
        assert!(doc.is_deleted());
        assert_eq!(doc.is_deleted(), doc.deletion_time().is_some());
        assert!(!doc.is_visible(Visibility::Active));
    }
}
