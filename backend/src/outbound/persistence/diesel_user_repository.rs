//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::household::HouseholdId;
use crate::domain::ports::{UserRepository, UserStoreError};
use crate::domain::user::{EmailAddress, PersonName, Role, User, UserId};

use super::models::UserRow;
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
///
/// Read-only by design: membership writes that touch `household_id` go
/// through [`DieselMembershipStore`](super::DieselMembershipStore) so they
/// share a transaction with the member-count bookkeeping.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map pool errors to domain identity store errors.
fn map_pool_error(error: PoolError) -> UserStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to domain identity store errors.
fn map_diesel_error(error: diesel::result::Error) -> UserStoreError {
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
        DieselError::NotFound => UserStoreError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserStoreError::connection("database connection error")
        }
        _ => UserStoreError::query("database error"),
    }
}

/// Convert a database row to a domain User.
///
/// Column values passed the domain validation when they were written, so
/// they are wrapped without re-validation. The role string is the one field
/// that can still be corrupt, and that surfaces as a query error.
fn row_to_user(row: UserRow) -> Result<User, UserStoreError> {
    let role = Role::from_str(&row.role)
        .map_err(|err| UserStoreError::query(format!("corrupted role in database: {err}")))?;

    Ok(User {
        id: UserId::from_uuid(row.id),
        email: EmailAddress::from_trusted(row.email),
        password_hash: row.password_hash,
        full_name: PersonName::from_trusted(row.full_name),
        role,
        confirmed: row.confirmed,
        confirmation_token: row.confirmation_token,
        household_id: row.household_id.map(HouseholdId::from_uuid),
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn list_by_household(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<User>, UserStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = users::table
            .filter(users::household_id.eq(household_id.as_uuid()))
            .order(users::full_name.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sample_row() -> UserRow {
        UserRow {
            id: uuid::Uuid::new_v4(),
            email: "ada@example.org".into(),
            password_hash: "hash".into(),
            full_name: "Ada Lovelace".into(),
            role: "user".into(),
            confirmed: true,
            confirmation_token: None,
            household_id: None,
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(repo_err, UserStoreError::Connection { .. }));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn diesel_error_maps_to_query_error() {
        let repo_err = map_diesel_error(diesel::result::Error::NotFound);

        assert!(matches!(repo_err, UserStoreError::Query { .. }));
    }

    #[rstest]
    fn row_to_user_preserves_fields() {
        let row = sample_row();
        let id = row.id;

        let user = row_to_user(row).expect("valid row");

        assert_eq!(user.id.as_uuid(), &id);
        assert_eq!(user.email.as_ref(), "ada@example.org");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.household_id, None);
    }

    #[rstest]
    fn corrupted_role_is_a_query_error() {
        let mut row = sample_row();
        row.role = "overlord".into();

        let err = row_to_user(row).expect_err("unknown role rejected");

        assert!(matches!(err, UserStoreError::Query { .. }));
    }
}
