//! PostgreSQL-backed `MembershipStore` implementation using Diesel ORM.
//!
//! Each port method runs as a single database transaction. Member counts
//! move via atomic in-database deltas, never read-modify-write, so
//! concurrent mutations against the same household serialise on the row
//! update instead of clobbering each other. Decrements carry a
//! `number_of_members >= 1` guard; a guard miss rolls the transaction back
//! as a count underflow. Writes to `users.household_id` are guarded on the
//! membership the caller read, so two racing moves of one user cannot both
//! commit deltas derived from the same previous household.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::household::{Household, HouseholdId, MemberId, UnregisteredMember};
use crate::domain::membership_request::{RequestId, RequestStatus};
use crate::domain::ports::{MembershipStore, MembershipStoreError};
use crate::domain::user::UserId;

use super::models::{NewHouseholdRow, NewUnregisteredMemberRow};
use super::pool::{DbPool, PoolError};
use super::schema::{households, membership_requests, unregistered_members, users};

/// Diesel-backed implementation of the `MembershipStore` port.
#[derive(Clone)]
pub struct DieselMembershipStore {
    pool: DbPool,
}

impl DieselMembershipStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Transaction-internal error carrier.
///
/// Diesel's transaction combinator needs `From<diesel::result::Error>` on
/// the error type so the implicit rollback can propagate; the extra variants
/// carry the consistency failures the guards detect.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Underflow(Uuid),
    MissingHousehold(Uuid),
    MissingUser(Uuid),
    MissingMember(Uuid),
    StaleMembership(Uuid),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

/// Map pool errors to domain membership store errors.
fn map_pool_error(error: PoolError) -> MembershipStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            MembershipStoreError::connection(message)
        }
    }
}

/// Map transaction errors to domain membership store errors.
///
/// `duplicate` supplies the conflict error for a unique violation; which
/// constraint can fire depends on the operation, so each caller passes the
/// right constructor with the offending name.
fn map_tx_error(
    error: TxError,
    duplicate: impl FnOnce() -> MembershipStoreError,
) -> MembershipStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        TxError::Diesel(diesel_error) => {
            match &diesel_error {
                DieselError::DatabaseError(kind, info) => {
                    debug!(?kind, message = info.message(), "diesel operation failed");
                }
                _ => debug!(
                    error_type = %std::any::type_name_of_val(&diesel_error),
                    "diesel operation failed"
                ),
            }
            match diesel_error {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => duplicate(),
                DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                    MembershipStoreError::connection("database connection error")
                }
                _ => MembershipStoreError::query("database error"),
            }
        }
        TxError::Underflow(household_id) => {
            MembershipStoreError::count_underflow(household_id.to_string())
        }
        TxError::MissingHousehold(id) => {
            MembershipStoreError::query(format!("household not found: {id}"))
        }
        TxError::MissingUser(id) => MembershipStoreError::query(format!("user not found: {id}")),
        TxError::MissingMember(id) => {
            MembershipStoreError::query(format!("unregistered member not found: {id}"))
        }
        TxError::StaleMembership(user_id) => {
            MembershipStoreError::stale_membership(user_id.to_string())
        }
    }
}

/// Atomically add one to a household's member count.
async fn increment_count(conn: &mut AsyncPgConnection, household_id: Uuid) -> Result<(), TxError> {
    let updated = diesel::update(households::table)
        .filter(households::id.eq(household_id))
        .set(households::number_of_members.eq(households::number_of_members + 1))
        .execute(conn)
        .await?;

    if updated == 0 {
        return Err(TxError::MissingHousehold(household_id));
    }
    Ok(())
}

/// Atomically subtract one from a household's member count.
///
/// The `>= 1` guard keeps the delta from racing past zero; a miss on an
/// existing row means the count was already zero.
async fn decrement_count(conn: &mut AsyncPgConnection, household_id: Uuid) -> Result<(), TxError> {
    let updated = diesel::update(households::table)
        .filter(households::id.eq(household_id))
        .filter(households::number_of_members.ge(1))
        .set(households::number_of_members.eq(households::number_of_members - 1))
        .execute(conn)
        .await?;

    if updated == 0 {
        let exists: i64 = households::table
            .filter(households::id.eq(household_id))
            .count()
            .get_result(conn)
            .await?;
        if exists == 0 {
            return Err(TxError::MissingHousehold(household_id));
        }
        return Err(TxError::Underflow(household_id));
    }
    Ok(())
}

/// Point a user's membership back-reference at a household (or clear it).
///
/// The update is guarded on `expected`: the household the caller read the
/// user in before opening the transaction. A guard miss on an existing user
/// means a concurrent move already re-homed them, and the whole transaction
/// must roll back rather than apply count deltas derived from stale state.
async fn set_user_household(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    expected: Option<Uuid>,
    household_id: Option<Uuid>,
) -> Result<(), TxError> {
    let updated = diesel::update(users::table)
        .filter(users::id.eq(user_id))
        .filter(users::household_id.is_not_distinct_from(expected))
        .set(users::household_id.eq(household_id))
        .execute(conn)
        .await?;

    if updated == 0 {
        let exists: i64 = users::table
            .filter(users::id.eq(user_id))
            .count()
            .get_result(conn)
            .await?;
        if exists == 0 {
            return Err(TxError::MissingUser(user_id));
        }
        return Err(TxError::StaleMembership(user_id));
    }
    Ok(())
}

/// Move a user from `previous` into `target` inside an open transaction.
///
/// The guarded back-reference update runs first; the count deltas only
/// apply once the user is known to still be where the caller read them.
async fn move_user(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    previous: Option<Uuid>,
    target: Uuid,
) -> Result<(), TxError> {
    set_user_household(conn, user_id, previous, Some(target)).await?;
    if let Some(previous_id) = previous {
        decrement_count(conn, previous_id).await?;
    }
    increment_count(conn, target).await?;
    Ok(())
}

#[async_trait]
impl MembershipStore for DieselMembershipStore {
    async fn create_household(
        &self,
        household: &Household,
        previous: Option<HouseholdId>,
    ) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewHouseholdRow {
            id: *household.id.as_uuid(),
            name: household.name.as_ref(),
            address: &household.address,
            owner_id: *household.owner_id.as_uuid(),
            #[expect(
                clippy::cast_possible_wrap,
                reason = "member counts stay far below i32::MAX"
            )]
            number_of_members: household.number_of_members as i32,
        };
        let owner_id = *household.owner_id.as_uuid();
        let household_id = *household.id.as_uuid();
        let previous_id = previous.map(|id| *id.as_uuid());

        conn.transaction::<(), TxError, _>(|conn| {
            async move {
                diesel::insert_into(households::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;
                set_user_household(conn, owner_id, previous_id, Some(household_id)).await?;
                if let Some(previous_id) = previous_id {
                    decrement_count(conn, previous_id).await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| {
            map_tx_error(err, || {
                MembershipStoreError::duplicate_name(household.name.as_ref())
            })
        })
    }

    async fn attach_user(
        &self,
        user_id: &UserId,
        previous: Option<HouseholdId>,
        target: &HouseholdId,
    ) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let user_id = *user_id.as_uuid();
        let previous_id = previous.map(|id| *id.as_uuid());
        let target_id = *target.as_uuid();

        conn.transaction::<(), TxError, _>(|conn| {
            async move { move_user(conn, user_id, previous_id, target_id).await }.scope_boxed()
        })
        .await
        .map_err(|err| map_tx_error(err, || MembershipStoreError::query("database error")))
    }

    async fn detach_user(
        &self,
        user_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let user_id = *user_id.as_uuid();
        let household_id = *household_id.as_uuid();

        conn.transaction::<(), TxError, _>(|conn| {
            async move {
                set_user_household(conn, user_id, Some(household_id), None).await?;
                decrement_count(conn, household_id).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_tx_error(err, || MembershipStoreError::query("database error")))
    }

    async fn insert_unregistered(
        &self,
        member: &UnregisteredMember,
    ) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewUnregisteredMemberRow {
            id: *member.id.as_uuid(),
            full_name: member.full_name.as_ref(),
            household_id: *member.household_id.as_uuid(),
        };
        let household_id = *member.household_id.as_uuid();

        conn.transaction::<(), TxError, _>(|conn| {
            async move {
                diesel::insert_into(unregistered_members::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;
                increment_count(conn, household_id).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| {
            map_tx_error(err, || {
                MembershipStoreError::duplicate_member(member.full_name.as_ref())
            })
        })
    }

    async fn delete_unregistered(
        &self,
        member_id: &MemberId,
        household_id: &HouseholdId,
    ) -> Result<(), MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let member_id = *member_id.as_uuid();
        let household_id = *household_id.as_uuid();

        conn.transaction::<(), TxError, _>(|conn| {
            async move {
                let deleted = diesel::delete(unregistered_members::table)
                    .filter(unregistered_members::id.eq(member_id))
                    .filter(unregistered_members::household_id.eq(household_id))
                    .execute(conn)
                    .await?;
                if deleted == 0 {
                    return Err(TxError::MissingMember(member_id));
                }
                decrement_count(conn, household_id).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_tx_error(err, || MembershipStoreError::query("database error")))
    }

    async fn accept_request(
        &self,
        request_id: &RequestId,
        user_id: &UserId,
        previous: Option<HouseholdId>,
        target: &HouseholdId,
    ) -> Result<bool, MembershipStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let request_id = *request_id.as_uuid();
        let user_id = *user_id.as_uuid();
        let previous_id = previous.map(|id| *id.as_uuid());
        let target_id = *target.as_uuid();

        conn.transaction::<bool, TxError, _>(|conn| {
            async move {
                // Compare-and-set first: when the request is no longer
                // pending nothing else may happen.
                let transitioned = diesel::update(membership_requests::table)
                    .filter(membership_requests::id.eq(request_id))
                    .filter(
                        membership_requests::status.eq(RequestStatus::Pending.as_str()),
                    )
                    .set(membership_requests::status.eq(RequestStatus::Accepted.as_str()))
                    .execute(conn)
                    .await?;
                if transitioned == 0 {
                    return Ok(false);
                }

                move_user(conn, user_id, previous_id, target_id).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_tx_error(err, || MembershipStoreError::query("database error")))
    }
}
