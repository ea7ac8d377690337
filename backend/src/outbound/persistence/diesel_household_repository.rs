//! PostgreSQL-backed `HouseholdRepository` implementation using Diesel ORM.
//!
//! Covers household reads and the single-row mutations (detail edits,
//! ownership transfer). Anything that moves the member count lives on
//! [`DieselMembershipStore`](super::DieselMembershipStore) instead.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::household::{Household, HouseholdId, HouseholdName};
use crate::domain::ports::{HouseholdRepository, HouseholdStoreError};
use crate::domain::user::UserId;

use super::models::{HouseholdRow, HouseholdUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::households;

/// Diesel-backed implementation of the `HouseholdRepository` port.
#[derive(Clone)]
pub struct DieselHouseholdRepository {
    pool: DbPool,
}

impl DieselHouseholdRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain household store errors.
fn map_pool_error(error: PoolError) -> HouseholdStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            HouseholdStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain household store errors.
///
/// A unique violation can only come from the households name constraint, so
/// it maps to `DuplicateName` with the offending value.
fn map_diesel_error(error: diesel::result::Error, name: Option<&str>) -> HouseholdStoreError {
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
        DieselError::NotFound => HouseholdStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            HouseholdStoreError::duplicate_name(name.unwrap_or_default())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            HouseholdStoreError::connection("database connection error")
        }
        _ => HouseholdStoreError::query("database error"),
    }
}

/// Convert a database row to a domain Household.
pub(crate) fn row_to_household(row: HouseholdRow) -> Household {
    Household {
        id: HouseholdId::from_uuid(row.id),
        name: HouseholdName::from_trusted(row.name),
        address: row.address,
        owner_id: UserId::from_uuid(row.owner_id),
        #[expect(
            clippy::cast_sign_loss,
            reason = "the CHECK constraint keeps the count non-negative"
        )]
        number_of_members: row.number_of_members as u32,
    }
}

#[async_trait]
impl HouseholdRepository for DieselHouseholdRepository {
    async fn find_by_id(
        &self,
        id: &HouseholdId,
    ) -> Result<Option<Household>, HouseholdStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<HouseholdRow> = households::table
            .filter(households::id.eq(id.as_uuid()))
            .select(HouseholdRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;

        Ok(row.map(row_to_household))
    }

    async fn find_by_name(
        &self,
        name: &HouseholdName,
    ) -> Result<Option<Household>, HouseholdStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<HouseholdRow> = households::table
            .filter(households::name.eq(name.as_ref()))
            .select(HouseholdRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;

        Ok(row.map(row_to_household))
    }

    async fn update_details<'a>(
        &self,
        id: &HouseholdId,
        name: Option<&'a HouseholdName>,
        address: Option<&'a str>,
    ) -> Result<(), HouseholdStoreError> {
        if name.is_none() && address.is_none() {
            return Ok(());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let update = HouseholdUpdate {
            name: name.map(HouseholdName::as_ref),
            address,
        };

        let updated = diesel::update(households::table)
            .filter(households::id.eq(id.as_uuid()))
            .set(&update)
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, name.map(HouseholdName::as_ref)))?;

        if updated == 0 {
            return Err(HouseholdStoreError::query("household not found for update"));
        }
        Ok(())
    }

    async fn set_owner(
        &self,
        id: &HouseholdId,
        owner_id: &UserId,
    ) -> Result<(), HouseholdStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(households::table)
            .filter(households::id.eq(id.as_uuid()))
            .set(households::owner_id.eq(owner_id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;

        if updated == 0 {
            return Err(HouseholdStoreError::query("household not found for update"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(repo_err, HouseholdStoreError::Connection { .. }));
    }

    #[rstest]
    fn unique_violation_maps_to_duplicate_name() {
        let diesel_err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_string()),
        );

        let repo_err = map_diesel_error(diesel_err, Some("Smiths"));

        assert_eq!(repo_err, HouseholdStoreError::duplicate_name("Smiths"));
    }

    #[rstest]
    fn row_to_household_preserves_fields() {
        let row = HouseholdRow {
            id: uuid::Uuid::new_v4(),
            name: "Smiths".into(),
            address: "1 Elm Street".into(),
            owner_id: uuid::Uuid::new_v4(),
            number_of_members: 3,
        };
        let id = row.id;

        let household = row_to_household(row);

        assert_eq!(household.id.as_uuid(), &id);
        assert_eq!(household.name.as_ref(), "Smiths");
        assert_eq!(household.number_of_members, 3);
    }
}
