//! PostgreSQL-backed `MembershipRequestRepository` implementation using
//! Diesel ORM.
//!
//! `resolve` is a compare-and-set: the UPDATE only matches rows still in the
//! pending state, so two concurrent resolutions cannot both succeed.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::household::HouseholdId;
use crate::domain::membership_request::{
    MembershipRequest, RequestId, RequestKind, RequestStatus,
};
use crate::domain::ports::{MembershipRequestRepository, RequestStoreError};
use crate::domain::user::UserId;

use super::models::{MembershipRequestRow, NewMembershipRequestRow};
use super::pool::{DbPool, PoolError};
use super::schema::membership_requests;

/// Diesel-backed implementation of the `MembershipRequestRepository` port.
#[derive(Clone)]
pub struct DieselMembershipRequestRepository {
    pool: DbPool,
}

impl DieselMembershipRequestRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain request store errors.
fn map_pool_error(error: PoolError) -> RequestStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            RequestStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain request store errors.
fn map_diesel_error(error: diesel::result::Error) -> RequestStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => RequestStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            RequestStoreError::connection("database connection error")
        }
        _ => RequestStoreError::query("database error"),
    }
}

/// Convert a database row to a domain MembershipRequest.
fn row_to_request(row: MembershipRequestRow) -> Result<MembershipRequest, RequestStoreError> {
    let kind = RequestKind::from_str(&row.kind)
        .map_err(|err| RequestStoreError::query(format!("corrupted kind in database: {err}")))?;
    let status = RequestStatus::from_str(&row.status)
        .map_err(|err| RequestStoreError::query(format!("corrupted status in database: {err}")))?;

    Ok(MembershipRequest {
        id: RequestId::from_uuid(row.id),
        household_id: HouseholdId::from_uuid(row.household_id),
        sender_id: UserId::from_uuid(row.sender_id),
        receiver_id: UserId::from_uuid(row.receiver_id),
        kind,
        status,
        created_at: row.created_at,
    })
}

#[async_trait]
impl MembershipRequestRepository for DieselMembershipRequestRepository {
    async fn insert(&self, request: &MembershipRequest) -> Result<(), RequestStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewMembershipRequestRow {
            id: *request.id.as_uuid(),
            household_id: *request.household_id.as_uuid(),
            sender_id: *request.sender_id.as_uuid(),
            receiver_id: *request.receiver_id.as_uuid(),
            kind: request.kind.as_str(),
            status: request.status.as_str(),
            created_at: request.created_at,
        };

        diesel::insert_into(membership_requests::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<MembershipRequest>, RequestStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<MembershipRequestRow> = membership_requests::table
            .filter(membership_requests::id.eq(id.as_uuid()))
            .select(MembershipRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_request).transpose()
    }

    async fn resolve(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<bool, RequestStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(membership_requests::table)
            .filter(membership_requests::id.eq(id.as_uuid()))
            .filter(membership_requests::status.eq(RequestStatus::Pending.as_str()))
            .set(membership_requests::status.eq(status.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn list_received(
        &self,
        receiver_id: &UserId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MembershipRequestRow> = membership_requests::table
            .filter(membership_requests::receiver_id.eq(receiver_id.as_uuid()))
            .filter(membership_requests::kind.eq(kind.as_str()))
            .filter(membership_requests::status.eq(status.as_str()))
            .order(membership_requests::created_at.asc())
            .select(MembershipRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_request).collect()
    }

    async fn list_sent(
        &self,
        sender_id: &UserId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MembershipRequestRow> = membership_requests::table
            .filter(membership_requests::sender_id.eq(sender_id.as_uuid()))
            .filter(membership_requests::kind.eq(kind.as_str()))
            .filter(membership_requests::status.eq(status.as_str()))
            .order(membership_requests::created_at.asc())
            .select(MembershipRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_request).collect()
    }

    async fn list_for_household(
        &self,
        household_id: &HouseholdId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<MembershipRequestRow> = membership_requests::table
            .filter(membership_requests::household_id.eq(household_id.as_uuid()))
            .filter(membership_requests::kind.eq(kind.as_str()))
            .filter(membership_requests::status.eq(status.as_str()))
            .order(membership_requests::created_at.asc())
            .select(MembershipRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_request).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn sample_row() -> MembershipRequestRow {
        MembershipRequestRow {
            id: uuid::Uuid::new_v4(),
            household_id: uuid::Uuid::new_v4(),
            sender_id: uuid::Uuid::new_v4(),
            receiver_id: uuid::Uuid::new_v4(),
            kind: "invitation".into(),
            status: "pending".into(),
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(repo_err, RequestStoreError::Connection { .. }));
    }

    #[rstest]
    fn row_to_request_parses_kind_and_status() {
        let request = row_to_request(sample_row()).expect("valid row");

        assert_eq!(request.kind, RequestKind::Invitation);
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[rstest]
    #[case::bad_kind("petition", "pending")]
    #[case::bad_status("invitation", "limbo")]
    fn corrupted_enums_are_query_errors(#[case] kind: &str, #[case] status: &str) {
        let mut row = sample_row();
        row.kind = kind.into();
        row.status = status.into();

        let err = row_to_request(row).expect_err("corrupted row rejected");

        assert!(matches!(err, RequestStoreError::Query { .. }));
    }
}
