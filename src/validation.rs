//! Input shape rules shared by the domain types and the HTTP handlers.
//!
//! None of these functions touch the store.

use email_address::EmailAddress;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::ValidationError;

/// The maximum number of characters in a category name, after trimming.
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// The maximum number of characters in a transaction description, after trimming.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Parse an identifier that must be a UUID in canonical dashed form,
/// e.g. `67e55044-10b1-426f-9247-bb680e5fe0c8`.
///
/// The simple, braced and URN forms that [Uuid::parse_str] also accepts are
/// rejected.
///
/// # Errors
///
/// Returns a [ValidationError] naming `field` and echoing `value` if the
/// string is empty or not a canonical UUID.
pub fn parse_uuid(field: &'static str, value: &str) -> Result<Uuid, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, format!("{field} is required")));
    }

    let invalid = || ValidationError::new(field, "invalid UUID format").with_value(value);

    if !is_canonical_uuid(value) {
        return Err(invalid());
    }

    Uuid::parse_str(value).map_err(|_| invalid())
}

fn is_canonical_uuid(value: &str) -> bool {
    const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

    value.len() == 36
        && value.char_indices().all(|(index, character)| {
            if HYPHEN_POSITIONS.contains(&index) {
                character == '-'
            } else {
                character.is_ascii_hexdigit()
            }
        })
}

/// Get a query parameter that must be present and not empty.
pub fn require_query_param<'a>(
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ValidationError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ValidationError::new(
            field,
            format!("{field} query parameter is required"),
        )),
    }
}

/// Check that an email address is present.
///
/// This is the only email rule enforced by the user store, see
/// [validate_email_format] for the stricter check used by the HTTP layer.
pub fn validate_email_present(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        Err(ValidationError::new("email", "email is required"))
    } else {
        Ok(())
    }
}

/// Check that an email address is present and well formed.
pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    validate_email_present(email)?;

    if EmailAddress::is_valid(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email", "invalid email format").with_value(email))
    }
}

/// Validate a category name and return it trimmed.
///
/// The rejected name is never echoed back.
pub fn validate_category_name(name: &str) -> Result<String, ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new("name", "category name is required"));
    }

    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::new(
            "name",
            "category name cannot be only whitespace",
        ));
    }

    let length = name.chars().count();
    if length > MAX_CATEGORY_NAME_LENGTH {
        return Err(ValidationError::new(
            "name",
            format!(
                "category name cannot exceed {MAX_CATEGORY_NAME_LENGTH} characters, got {length}"
            ),
        ));
    }

    Ok(name.to_owned())
}

/// Validate an optional description and return it trimmed.
///
/// Descriptions that are empty after trimming become `None`. The rejected
/// description is never echoed back.
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(description) = description else {
        return Ok(None);
    };

    let description = description.trim();
    let length = description.chars().count();

    if length > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::new(
            "description",
            format!("description cannot exceed {MAX_DESCRIPTION_LENGTH} characters, got {length}"),
        ));
    }

    if description.is_empty() {
        Ok(None)
    } else {
        Ok(Some(description.to_owned()))
    }
}

/// Check that `from` is not after `to` when both bounds are given.
pub fn validate_date_range(
    from: Option<OffsetDateTime>,
    to: Option<OffsetDateTime>,
) -> Result<(), ValidationError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ValidationError::new(
            "from",
            "'from' date must be before or equal to 'to' date",
        )),
        _ => Ok(()),
    }
}

/// Parse an RFC3339 timestamp, e.g. `2025-01-31T12:00:00Z`.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<OffsetDateTime, ValidationError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|_| {
        ValidationError::new(field, format!("invalid '{field}' date format, use RFC3339"))
            .with_value(value)
    })
}

/// Parse an optional RFC3339 timestamp from a query parameter.
///
/// An empty parameter, e.g. `?from=`, counts as absent.
pub fn parse_optional_timestamp(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<OffsetDateTime>, ValidationError> {
    match value {
        Some(value) if !value.is_empty() => parse_timestamp(field, value).map(Some),
        _ => Ok(None),
    }
}
