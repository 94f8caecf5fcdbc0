//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every request validation failure is an `invalid_request` error whose
//! details name the offending `field` and a machine-readable `code`.

use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    BodyValidationError, Error, FeedbackValidationError, GeoValidationError, InvalidRating,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
    Blank,
    TooLong,
    InvalidCoordinates,
    InvalidRating,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::Blank => "blank",
            ErrorCode::TooLong => "too_long",
            ErrorCode::InvalidCoordinates => "invalid_coordinates",
            ErrorCode::InvalidRating => "invalid_rating",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        self.0
    }
}

pub(crate) fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn field_value_error(
    field: FieldName,
    code: ErrorCode,
    message: impl Into<String>,
    value: &str,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let name = field.as_str();
    field_error(
        field,
        ErrorCode::MissingField,
        format!("missing required field: {name}"),
    )
}

pub(crate) fn invalid_value_error(field: FieldName, value: &str, expected: &str) -> Error {
    let name = field.as_str();
    field_value_error(
        field,
        ErrorCode::InvalidValue,
        format!("{name} must be {expected}"),
        value,
    )
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| {
        let name = field.as_str();
        field_value_error(
            field,
            ErrorCode::InvalidUuid,
            format!("{name} must be a valid UUID"),
            value,
        )
    })
}

/// Map a message or reference body failure onto `field`.
pub(crate) fn body_error(field: FieldName, err: BodyValidationError) -> Error {
    let code = match err {
        BodyValidationError::Empty => ErrorCode::Blank,
        BodyValidationError::TooLong { .. } => ErrorCode::TooLong,
    };
    field_error(field, code, err.to_string())
}

pub(crate) fn rating_error(field: FieldName, err: InvalidRating) -> Error {
    field_error(field, ErrorCode::InvalidRating, err.to_string())
}

pub(crate) fn geo_error(field: FieldName, err: GeoValidationError) -> Error {
    field_error(field, ErrorCode::InvalidCoordinates, err.to_string())
}

pub(crate) fn feedback_error(err: FeedbackValidationError) -> Error {
    let code = match err {
        FeedbackValidationError::EmptyMessage => ErrorCode::Blank,
        _ => ErrorCode::InvalidValue,
    };
    field_error(FieldName::new(err.field()), code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainCode;
    use rstest::rstest;

    #[rstest]
    fn missing_field_names_the_field() {
        let err = missing_field_error(FieldName::new("itinerary_id"));
        assert_eq!(err.code(), DomainCode::InvalidRequest);
        assert_eq!(
            err.details(),
            Some(&json!({"field": "itinerary_id", "code": "missing_field"}))
        );
    }

    #[rstest]
    fn malformed_uuid_echoes_value() {
        let err = parse_uuid("nope", FieldName::new("itinerary_id")).expect_err("invalid uuid");
        assert_eq!(err.message(), "itinerary_id must be a valid UUID");
        assert_eq!(
            err.details(),
            Some(&json!({"field": "itinerary_id", "value": "nope", "code": "invalid_uuid"}))
        );
    }

    #[rstest]
    #[case(BodyValidationError::Empty, "blank")]
    #[case(BodyValidationError::TooLong { max: 1_000 }, "too_long")]
    fn body_errors_carry_codes(#[case] err: BodyValidationError, #[case] code: &str) {
        let err = body_error(FieldName::new("message.body"), err);
        let details = err.details().expect("details present");
        assert_eq!(details["field"], "message.body");
        assert_eq!(details["code"], code);
    }
}
