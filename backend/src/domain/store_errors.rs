//! Shared mappings from driven-port store errors to the domain error type.
//!
//! Connection failures become `service_unavailable`; anything else a store
//! raises is an unexpected failure and maps to `internal_error`. The
//! conflict-shaped variants carry enough context for per-service mapping and
//! are handled where they occur.

use crate::domain::Error;
use crate::domain::ports::{MemberStoreError, RequestStoreError, UserStoreError};

pub(super) fn map_user_store_error(error: UserStoreError) -> Error {
    match error {
        UserStoreError::Connection { message } => {
            Error::service_unavailable(format!("identity store unavailable: {message}"))
        }
        UserStoreError::Query { message } => {
            Error::internal(format!("identity store error: {message}"))
        }
    }
}

pub(super) fn map_member_store_error(error: MemberStoreError) -> Error {
    match error {
        MemberStoreError::Connection { message } => {
            Error::service_unavailable(format!("member store unavailable: {message}"))
        }
        MemberStoreError::Query { message } => {
            Error::internal(format!("member store error: {message}"))
        }
        MemberStoreError::DuplicateMember { name } => Error::conflict(
            "unregistered member with this name already exists in the household",
        )
        .with_details(serde_json::json!({ "fullName": name, "code": "duplicate_member" })),
    }
}

pub(super) fn map_request_store_error(error: RequestStoreError) -> Error {
    match error {
        RequestStoreError::Connection { message } => {
            Error::service_unavailable(format!("request store unavailable: {message}"))
        }
        RequestStoreError::Query { message } => {
            Error::internal(format!("request store error: {message}"))
        }
    }
}
