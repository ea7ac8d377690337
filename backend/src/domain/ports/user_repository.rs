//! Port abstraction for the identity store.

use async_trait::async_trait;

use crate::domain::household::HouseholdId;
use crate::domain::user::{User, UserId};

/// Persistence errors raised by identity store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    /// Store connection could not be established.
    #[error("identity store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("identity store query failed: {message}")]
    Query { message: String },
}

impl UserStoreError {
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
}

/// Read access to registered users.
///
/// All writes that touch the `household_id` back-reference go through the
/// [`MembershipStore`](super::MembershipStore) so they stay inside the same
/// transaction as the member-count bookkeeping.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError>;

    /// List all registered members of a household.
    async fn list_by_household(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<User>, UserStoreError>;
}
