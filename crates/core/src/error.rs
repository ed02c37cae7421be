use thiserror::Error;

/// Reasons an input string is not a valid [`Identifier`](crate::Identifier).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedIdentifier {
    /// The input is not exactly 26 characters long.
    #[error("malformed identifier: expected 26 characters, got {0}")]
    Length(usize),

    /// The input contains a character outside the Crockford base32 alphabet.
    #[error("malformed identifier: invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol {
        /// The offending character.
        symbol: char,
        /// Zero-based character position.
        position: usize,
    },

    /// The encoded value does not fit in 128 bits.
    #[error("malformed identifier: value exceeds 128 bits")]
    Overflow,
}

/// A stored audit record violates the audited-entity invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditViolation {
    /// `is_deleted` disagrees with the presence of `deletion_time`.
    #[error("is_deleted = {is_deleted} disagrees with has_deletion_time = {has_deletion_time}")]
    DeletionMismatch {
        /// Stored flag.
        is_deleted: bool,
        /// Whether a deletion time was stored.
        has_deletion_time: bool,
    },

    /// `last_modification_time` precedes `creation_time`.
    #[error("last modification precedes creation")]
    ModifiedBeforeCreated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            MalformedIdentifier::Length(3).to_string(),
            "malformed identifier: expected 26 characters, got 3"
        );
        assert_eq!(
            MalformedIdentifier::InvalidSymbol {
                symbol: 'U',
                position: 4
            }
            .to_string(),
            "malformed identifier: invalid symbol 'U' at position 4"
        );
        assert_eq!(
            AuditViolation::DeletionMismatch {
                is_deleted: true,
                has_deletion_time: false
            }
            .to_string(),
            "is_deleted = true disagrees with has_deletion_time = false"
        );
    }
}
