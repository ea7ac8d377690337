//! Transactional membership mutations spanning multiple stores.
//!
//! Every operation here couples a membership change with the owning
//! household's `number_of_members` bookkeeping. Adapters must apply each
//! method as one atomic unit: either every step persists or none does, and
//! the count moves via atomic deltas at the storage layer rather than
//! read-modify-write in application code.

use async_trait::async_trait;

use crate::domain::household::{Household, HouseholdId, MemberId, UnregisteredMember};
use crate::domain::membership_request::RequestId;
use crate::domain::user::UserId;

/// Errors raised by the transactional membership store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipStoreError {
    /// Store connection could not be established.
    #[error("membership store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("membership store query failed: {message}")]
    Query { message: String },
    /// Another household already uses this name.
    #[error("household name already in use: {name}")]
    DuplicateName { name: String },
    /// The household already has an unregistered member with this name.
    #[error("unregistered member already exists in household: {name}")]
    DuplicateMember { name: String },
    /// A decrement would have driven a member count below zero. This is a
    /// consistency violation, not a recoverable state.
    #[error("member count underflow for household {household_id}")]
    CountUnderflow { household_id: String },
    /// The user's membership no longer matches the state the caller read;
    /// a concurrent move won. The transaction was rolled back.
    #[error("membership changed concurrently for user {user_id}")]
    StaleMembership { user_id: String },
}

impl MembershipStoreError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a duplicate-name error.
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// Create a duplicate-member error.
    pub fn duplicate_member(name: impl Into<String>) -> Self {
        Self::DuplicateMember { name: name.into() }
    }

    /// Create a count-underflow error.
    pub fn count_underflow(household_id: impl Into<String>) -> Self {
        Self::CountUnderflow {
            household_id: household_id.into(),
        }
    }

    /// Create a stale-membership error.
    pub fn stale_membership(user_id: impl Into<String>) -> Self {
        Self::StaleMembership {
            user_id: user_id.into(),
        }
    }
}

/// Atomic multi-store membership mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Persist a new household and point its owner's back-reference at it.
    ///
    /// The household row is inserted first so the owner reference targets an
    /// existing identity. The caller supplies `number_of_members = 1`. When
    /// the owner is leaving a `previous` household, that household's count is
    /// decremented in the same transaction; the owner's back-reference update
    /// is guarded on `previous` like [`MembershipStore::attach_user`].
    async fn create_household(
        &self,
        household: &Household,
        previous: Option<HouseholdId>,
    ) -> Result<(), MembershipStoreError>;

    /// Move a user into `target`, leaving `previous` if set.
    ///
    /// `previous` doubles as the expected current membership: the
    /// back-reference update is guarded on it, and a mismatch (a concurrent
    /// move won) rolls the whole unit back with
    /// [`MembershipStoreError::StaleMembership`]. Applies set-reference,
    /// decrement-old, increment-new as one unit.
    async fn attach_user(
        &self,
        user_id: &UserId,
        previous: Option<HouseholdId>,
        target: &HouseholdId,
    ) -> Result<(), MembershipStoreError>;

    /// Remove a user from their household and clear the back-reference.
    ///
    /// Guarded on the user still belonging to `household_id`; a mismatch
    /// rolls back with [`MembershipStoreError::StaleMembership`].
    async fn detach_user(
        &self,
        user_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<(), MembershipStoreError>;

    /// Insert an unregistered member and increment the household count.
    async fn insert_unregistered(
        &self,
        member: &UnregisteredMember,
    ) -> Result<(), MembershipStoreError>;

    /// Delete an unregistered member and decrement the household count.
    async fn delete_unregistered(
        &self,
        member_id: &MemberId,
        household_id: &HouseholdId,
    ) -> Result<(), MembershipStoreError>;

    /// Accept a pending request and move the joining user into the household
    /// in the same transaction.
    ///
    /// Returns `false` without side effects when the request was no longer
    /// pending, so callers can surface the terminal-state conflict. The
    /// membership move carries the same `previous` guard as
    /// [`MembershipStore::attach_user`].
    async fn accept_request(
        &self,
        request_id: &RequestId,
        user_id: &UserId,
        previous: Option<HouseholdId>,
        target: &HouseholdId,
    ) -> Result<bool, MembershipStoreError>;
}
