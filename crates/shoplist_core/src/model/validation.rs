//! Field-level validation shared by location and item records.
//!
//! # Invariants
//! - Display names are non-blank after trim.
//! - User locations use visitation orders inside `1..=100`.
//! - Color channels stay inside `[0, 1]`.
//! - Item quantities are at least 1.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Domain validation failure for location/item records.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Record identity is the nil UUID.
    NilUuid,
    /// Name is empty or whitespace-only.
    BlankName,
    /// Visitation order outside the user-editable range.
    VisitationOrderOutOfRange(i32),
    /// One color channel is outside `[0, 1]` or not a finite number.
    ColorChannelOutOfRange { channel: &'static str, value: f64 },
    /// Quantity below 1.
    QuantityBelowOne(i32),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilUuid => write!(f, "uuid must not be nil"),
            Self::BlankName => write!(f, "name must not be blank"),
            Self::VisitationOrderOutOfRange(value) => write!(
                f,
                "visitation order {value} is outside {}..={}",
                super::location::MIN_VISITATION_ORDER,
                super::location::MAX_VISITATION_ORDER
            ),
            Self::ColorChannelOutOfRange { channel, value } => {
                write!(f, "color channel `{channel}` ({value}) must be within 0..=1")
            }
            Self::QuantityBelowOne(value) => write!(f, "quantity ({value}) must be >= 1"),
        }
    }
}

impl Error for ValidationError {}

/// Trims a display name and rejects blank values.
pub fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankName);
    }
    Ok(trimmed.to_string())
}

/// Returns whether `name` would pass [`normalize_name`].
pub fn is_committable_name(name: &str) -> bool {
    !name.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::{is_committable_name, normalize_name, ValidationError};

    #[test]
    fn normalize_name_trims_surrounding_whitespace() {
        assert_eq!(normalize_name("  Milk ").unwrap(), "Milk");
    }

    #[test]
    fn normalize_name_rejects_whitespace_only() {
        assert_eq!(normalize_name(" \t ").unwrap_err(), ValidationError::BlankName);
        assert!(!is_committable_name("   "));
        assert!(is_committable_name("x"));
    }
}
