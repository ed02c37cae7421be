//! Audited-entity model shared by every persisted record.
//!
//! Audit timestamps are never written implicitly. Stores call [`pre_save`]
//! right before issuing a write, and soft deletes go through
//! [`AuditInfo::mark_deleted`], which leaves the modification time alone.

use chrono::{DateTime, Utc};

use crate::error::AuditViolation;
use crate::id::Identifier;

/// Creation, modification and deletion timestamps of a persisted entity.
///
/// `is_deleted` is derived from the presence of `deletion_time`, so the two
/// can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditInfo {
    creation_time: DateTime<Utc>,
    last_modification_time: Option<DateTime<Utc>>,
    deletion_time: Option<DateTime<Utc>>,
}

impl AuditInfo {
    /// Fresh audit fields for an entity that has not been saved yet.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            creation_time: now,
            last_modification_time: None,
            deletion_time: None,
        }
    }

    /// Rebuild audit fields from stored columns, checking the invariants.
    pub fn from_parts(
        creation_time: DateTime<Utc>,
        last_modification_time: Option<DateTime<Utc>>,
        deletion_time: Option<DateTime<Utc>>,
        is_deleted: bool,
    ) -> Result<Self, AuditViolation> {
        if is_deleted != deletion_time.is_some() {
            return Err(AuditViolation::DeletionMismatch {
                is_deleted,
                has_deletion_time: deletion_time.is_some(),
            });
        }
        if last_modification_time.is_some_and(|t| t < creation_time) {
            return Err(AuditViolation::ModifiedBeforeCreated);
        }
        Ok(Self {
            creation_time,
            last_modification_time,
            deletion_time,
        })
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    pub fn last_modification_time(&self) -> Option<DateTime<Utc>> {
        self.last_modification_time
    }

    pub fn deletion_time(&self) -> Option<DateTime<Utc>> {
        self.deletion_time
    }

    pub fn is_deleted(&self) -> bool {
        self.deletion_time.is_some()
    }

    /// Record a soft delete. Returns `false` if the entity was already
    /// deleted, in which case the original deletion time is kept.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) -> bool {
        if self.deletion_time.is_some() {
            return false;
        }
        self.deletion_time = Some(now.max(self.creation_time));
        true
    }

    fn stamp_insert(&mut self, now: DateTime<Utc>) {
        self.creation_time = now;
        self.last_modification_time = None;
    }

    fn stamp_update(&mut self, now: DateTime<Utc>) {
        // Clock skew between writers must not produce modified < created.
        self.last_modification_time = Some(now.max(self.creation_time));
    }
}

/// A persisted entity carrying an immutable identifier and audit fields.
pub trait Audited {
    fn id(&self) -> Identifier;
    fn audit(&self) -> &AuditInfo;
    fn audit_mut(&mut self) -> &mut AuditInfo;
}

/// Entities whose default reads exclude soft-deleted rows.
///
/// Stores for a `SoftDelete` type must filter every default read through
/// [`Visibility::Active`]; only an explicit [`Visibility::IncludeDeleted`]
/// read (administrative access) may return deleted rows.
pub trait SoftDelete: Audited {
    /// Whether this entity is returned by a read with the given visibility.
    fn is_visible(&self, visibility: Visibility) -> bool {
        match visibility {
            Visibility::Active => !self.audit().is_deleted(),
            Visibility::IncludeDeleted => true,
        }
    }
}

/// Which rows a read may observe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    /// Only rows that have not been soft-deleted.
    #[default]
    Active,
    /// Every row, including soft-deleted ones.
    IncludeDeleted,
}

impl Visibility {
    /// SQL predicate appended to reads, if any.
    pub fn sql_predicate(self) -> Option<&'static str> {
        match self {
            Self::Active => Some("is_deleted = FALSE"),
            Self::IncludeDeleted => None,
        }
    }
}

/// Kind of write a [`pre_save`] call precedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKind {
    Insert,
    Update,
}

/// Populate audit fields ahead of a write.
///
/// Inserts set `creation_time` and clear any modification time; updates set
/// `last_modification_time`. Soft deletes are not updates and must use
/// [`AuditInfo::mark_deleted`] instead.
pub fn pre_save<E: Audited + ?Sized>(entity: &mut E, kind: SaveKind, now: DateTime<Utc>) {
    match kind {
        SaveKind::Insert => entity.audit_mut().stamp_insert(now),
        SaveKind::Update => entity.audit_mut().stamp_update(now),
    }
}
