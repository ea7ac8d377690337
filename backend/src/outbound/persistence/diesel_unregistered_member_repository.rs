//! PostgreSQL-backed `UnregisteredMemberRepository` implementation using
//! Diesel ORM.
//!
//! Reads and the rename mutation only. Insert and delete change the owning
//! household's member count and therefore live on
//! [`DieselMembershipStore`](super::DieselMembershipStore).

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::household::{HouseholdId, MemberId, UnregisteredMember};
use crate::domain::ports::{MemberStoreError, UnregisteredMemberRepository};
use crate::domain::user::PersonName;

use super::models::UnregisteredMemberRow;
use super::pool::{DbPool, PoolError};
use super::schema::unregistered_members;

/// Diesel-backed implementation of the `UnregisteredMemberRepository` port.
#[derive(Clone)]
pub struct DieselUnregisteredMemberRepository {
    pool: DbPool,
}

impl DieselUnregisteredMemberRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain member store errors.
fn map_pool_error(error: PoolError) -> MemberStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            MemberStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain member store errors.
///
/// A unique violation here means the `(household_id, full_name)` constraint
/// fired, so it maps to `DuplicateMember` with the offending name.
fn map_diesel_error(error: diesel::result::Error, name: Option<&str>) -> MemberStoreError {
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
        DieselError::NotFound => MemberStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            MemberStoreError::duplicate_member(name.unwrap_or_default())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            MemberStoreError::connection("database connection error")
        }
        _ => MemberStoreError::query("database error"),
    }
}

/// Convert a database row to a domain UnregisteredMember.
pub(crate) fn row_to_member(row: UnregisteredMemberRow) -> UnregisteredMember {
    UnregisteredMember {
        id: MemberId::from_uuid(row.id),
        full_name: PersonName::from_trusted(row.full_name),
        household_id: HouseholdId::from_uuid(row.household_id),
    }
}

#[async_trait]
impl UnregisteredMemberRepository for DieselUnregisteredMemberRepository {
    async fn find_by_id(
        &self,
        id: &MemberId,
    ) -> Result<Option<UnregisteredMember>, MemberStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UnregisteredMemberRow> = unregistered_members::table
            .filter(unregistered_members::id.eq(id.as_uuid()))
            .select(UnregisteredMemberRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;

        Ok(row.map(row_to_member))
    }

    async fn find_by_name_and_household(
        &self,
        name: &PersonName,
        household_id: &HouseholdId,
    ) -> Result<Option<UnregisteredMember>, MemberStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UnregisteredMemberRow> = unregistered_members::table
            .filter(unregistered_members::household_id.eq(household_id.as_uuid()))
            .filter(unregistered_members::full_name.eq(name.as_ref()))
            .select(UnregisteredMemberRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;

        Ok(row.map(row_to_member))
    }

    async fn list_by_household(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<UnregisteredMember>, MemberStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UnregisteredMemberRow> = unregistered_members::table
            .filter(unregistered_members::household_id.eq(household_id.as_uuid()))
            .order(unregistered_members::full_name.asc())
            .select(UnregisteredMemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;

        Ok(rows.into_iter().map(row_to_member).collect())
    }

    async fn rename(&self, id: &MemberId, name: &PersonName) -> Result<(), MemberStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(unregistered_members::table)
            .filter(unregistered_members::id.eq(id.as_uuid()))
            .set(unregistered_members::full_name.eq(name.as_ref()))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(name.as_ref())))?;

        if updated == 0 {
            return Err(MemberStoreError::query("member not found for rename"));
        }
        Ok(())
    }
}
