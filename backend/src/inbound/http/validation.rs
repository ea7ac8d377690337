//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request payloads arrive as plain strings; these helpers lift them into
//! the domain's validated newtypes and turn validation failures into
//! `invalid_request` errors with field context.

use serde_json::json;

use crate::domain::Error;
use crate::domain::household::HouseholdName;
use crate::domain::user::PersonName;

pub(crate) fn missing_field_error(field: &'static str) -> Error {
    Error::invalid_request(format!("{field} is required")).with_details(json!({
        "field": field,
        "code": "missing_field",
    }))
}

fn invalid_value_error(field: &'static str, value: &str, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field,
        "value": value,
        "code": "invalid_value",
    }))
}

/// Parse a household name, reporting failures against the given field.
pub(crate) fn parse_household_name(
    value: String,
    field: &'static str,
) -> Result<HouseholdName, Error> {
    HouseholdName::new(value.clone())
        .map_err(|err| invalid_value_error(field, &value, err.to_string()))
}

/// Parse a person's full name, reporting failures against the given field.
pub(crate) fn parse_person_name(value: String, field: &'static str) -> Result<PersonName, Error> {
    PersonName::new(value.clone())
        .map_err(|err| invalid_value_error(field, &value, err.to_string()))
}
