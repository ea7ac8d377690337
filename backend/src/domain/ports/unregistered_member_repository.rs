//! Port abstraction for the unregistered-member store.

use async_trait::async_trait;

use crate::domain::household::{HouseholdId, MemberId, UnregisteredMember};
use crate::domain::user::PersonName;

/// Persistence errors raised by unregistered-member store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemberStoreError {
    /// Store connection could not be established.
    #[error("member store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("member store query failed: {message}")]
    Query { message: String },
    /// The household already has an unregistered member with this name.
    #[error("unregistered member already exists in household: {name}")]
    DuplicateMember { name: String },
}

impl MemberStoreError {
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

    /// Create a duplicate-member error.
    pub fn duplicate_member(name: impl Into<String>) -> Self {
        Self::DuplicateMember { name: name.into() }
    }
}

/// Unregistered-member reads and the rename mutation.
///
/// Creation and deletion live on the
/// [`MembershipStore`](super::MembershipStore) because they must move the
/// household member count in the same transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnregisteredMemberRepository: Send + Sync {
    /// Fetch a member by identifier.
    async fn find_by_id(
        &self,
        id: &MemberId,
    ) -> Result<Option<UnregisteredMember>, MemberStoreError>;

    /// Fetch a member by full name within one household.
    async fn find_by_name_and_household(
        &self,
        name: &PersonName,
        household_id: &HouseholdId,
    ) -> Result<Option<UnregisteredMember>, MemberStoreError>;

    /// List all unregistered members of a household.
    async fn list_by_household(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<UnregisteredMember>, MemberStoreError>;

    /// Overwrite a member's full name.
    async fn rename(&self, id: &MemberId, name: &PersonName) -> Result<(), MemberStoreError>;
}
