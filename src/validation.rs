//! Shared request validation helpers.
//!
//! Enum fields accept relaxed client input (case-insensitive, spaces or
//! hyphens for underscores) and are normalized to their canonical form in
//! exactly one place, [`normalize_enum`]. Everything else is small
//! field-level checks that handlers compose into an error list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::errors::FieldError;

/// Implemented by every enum that crosses the API boundary.
pub trait CanonicalEnum: Sized {
    /// Canonical spellings, in declaration order.
    const VALUES: &'static [&'static str];

    fn from_canonical(value: &str) -> Option<Self>;
}

/// Normalizes `value` (trim, uppercase) and resolves it against `E`'s
/// canonical values. The error message quotes the input as received, not
/// the normalized form.
pub fn normalize_enum<E: CanonicalEnum>(field: &'static str, value: &str) -> Result<E, FieldError> {
    let normalized = value.trim().to_uppercase();
    E::from_canonical(&normalized).ok_or_else(|| {
        FieldError::new(
            field,
            format!(
                "Invalid {}: {}. Valid values are: {}",
                field,
                value,
                E::VALUES.join(", ")
            ),
        )
    })
}

/// Deserializes a field that distinguishes "absent" from "explicitly null".
/// Pair with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Rejects blank input with "`{label}` is required".
pub fn required(field: &'static str, label: &str, value: &str) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::new(field, format!("{label} is required")));
    }
    Ok(value.to_owned())
}

/// Trims `value` and enforces a character-count range, returning the
/// trimmed text on success. A minimum of 1 reads as a presence check and
/// reports "`{label}` is required" instead of a length message.
pub fn required_text(
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<String, FieldError> {
    let trimmed = value.trim();
    let count = trimmed.chars().count();
    if count < min {
        let message = if min <= 1 {
            format!("{label} is required")
        } else {
            format!("{label} must be at least {min} characters")
        };
        return Err(FieldError::new(field, message));
    }
    if count > max {
        return Err(FieldError::new(
            field,
            format!("{label} must not exceed {max} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

pub fn require_uuid(
    field: &'static str,
    value: &str,
    message: &str,
) -> Result<String, FieldError> {
    if Uuid::parse_str(value).is_err() {
        return Err(FieldError::new(field, message));
    }
    Ok(value.to_owned())
}

pub fn in_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, FieldError> {
    if !value.is_finite() || value < min || value > max {
        return Err(FieldError::new(
            field,
            format!("{field} must be between {min} and {max}"),
        ));
    }
    Ok(value)
}

pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, FieldError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| {
            FieldError::new(
                field,
                format!("Invalid {field}: expected an RFC 3339 date-time"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CaseStatus, Severity};

    #[test]
    fn normalize_accepts_case_insensitive_input() {
        assert_eq!(
            normalize_enum::<CaseStatus>("status", "open").unwrap(),
            CaseStatus::Open
        );
        assert_eq!(
            normalize_enum::<CaseStatus>("status", "in_progress").unwrap(),
            CaseStatus::InProgress
        );
        assert_eq!(
            normalize_enum::<CaseStatus>("status", " Closed ").unwrap(),
            CaseStatus::Closed
        );
    }

    #[test]
    fn normalize_rejects_unknown_values_with_the_valid_set() {
        let err = normalize_enum::<Severity>("severity", "URGENT").unwrap_err();
        assert_eq!(err.field, "severity");
        assert_eq!(
            err.message,
            "Invalid severity: URGENT. Valid values are: LOW, MEDIUM, HIGH, CRITICAL"
        );
    }

    #[test]
    fn email_check_requires_local_part_and_dotted_domain() {
        assert!(is_valid_email("analyst@forensics.io"));
        assert!(!is_valid_email("analyst"));
        assert!(!is_valid_email("@forensics.io"));
        assert!(!is_valid_email("analyst@forensics"));
        assert!(!is_valid_email("analyst@.io"));
    }

    #[test]
    fn required_text_trims_before_counting() {
        assert_eq!(
            required_text("title", "Title", "  Breach  ", 3, 200).unwrap(),
            "Breach"
        );
        let err = required_text("title", "Title", "  ab ", 3, 200).unwrap_err();
        assert_eq!(err.message, "Title must be at least 3 characters");

        let err = required_text("location.city", "City", " ", 1, 100).unwrap_err();
        assert_eq!(err.message, "City is required");

        let err = required("source", "Source", "   ").unwrap_err();
        assert_eq!(err.message, "Source is required");
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        #[derive(Deserialize, Default)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            assigned_to_id: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert!(absent.assigned_to_id.is_none());

        let null: Patch = serde_json::from_str(r#"{"assigned_to_id": null}"#).unwrap();
        assert_eq!(null.assigned_to_id, Some(None));

        let set: Patch = serde_json::from_str(r#"{"assigned_to_id": "u1"}"#).unwrap();
        assert_eq!(set.assigned_to_id, Some(Some("u1".to_owned())));
    }

    #[test]
    fn timestamps_parse_from_rfc3339() {
        let parsed = parse_timestamp("timestamp", "2025-01-15T10:30:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-01-15T10:30:00+00:00");
        assert!(parse_timestamp("timestamp", "yesterday").is_err());
    }
}
