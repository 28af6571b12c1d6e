//! Shared validation helpers for inbound HTTP adapters.
//!
//! Field-level failures become `validation_failed` (422) errors carrying
//! `details.field` and `details.code`; malformed listing parameters and
//! bulk id lists are plain bad requests (400).

use serde_json::json;

use crate::domain::{Error, UserId, UserListingError, UserValidationError};

/// Message returned when a bulk id list does not parse.
pub(crate) const INVALID_BULK_IDS_MESSAGE: &str =
    "Invalid format for user IDs. Please provide a comma-separated list of integers.";

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    const fn as_str(self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn with_code(self, code: &str) -> Error {
        Error::validation_failed(self.message).with_details(json!({
            "field": self.field,
            "code": code,
        }))
    }

    fn with_value(self, code: &str, value: &str) -> Error {
        Error::validation_failed(self.message).with_details(json!({
            "field": self.field,
            "value": value,
            "code": code,
        }))
    }
}

/// Map a value-type failure onto the request field it came from.
pub(crate) fn user_field_error(err: &UserValidationError) -> Error {
    ValidationError::new(err.field(), err.to_string()).with_code(err.reason())
}

/// Parse a `{id}` path segment.
pub(crate) fn parse_user_id(raw: &str, field: FieldName) -> Result<UserId, Error> {
    let field = field.as_str();
    raw.parse().map_err(|_| {
        ValidationError::new(field, format!("{field} must be a positive integer"))
            .with_value("invalid_id", raw)
    })
}

/// Parse a comma-separated `{ids}` path segment.
///
/// Every entry must be a positive integer; surrounding whitespace is
/// ignored.
pub(crate) fn parse_bulk_ids(raw: &str) -> Result<Vec<UserId>, Error> {
    raw.split(',')
        .map(|entry| entry.parse::<UserId>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| {
            Error::invalid_request(INVALID_BULK_IDS_MESSAGE)
                .with_details(json!({ "field": "ids", "value": raw, "code": "invalid_format" }))
        })
}

/// Map listing parameter failures to bad requests.
pub(crate) fn listing_error(err: &UserListingError) -> Error {
    let (field, code) = match err {
        UserListingError::InvalidSortField(_) => ("sort_by", "invalid_sort_field"),
        UserListingError::InvalidSortType(_) => ("sort_type", "invalid_sort_type"),
        UserListingError::InvalidDateRange { .. } => ("start_date", "invalid_date_range"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Map a non-positive pagination parameter to a validation failure.
pub(crate) fn page_parameter_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be greater than 0"))
        .with_code("out_of_range")
}
