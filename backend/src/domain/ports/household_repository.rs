//! Port abstraction for the household store.

use async_trait::async_trait;

use crate::domain::household::{Household, HouseholdId, HouseholdName};
use crate::domain::user::UserId;

/// Persistence errors raised by household store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HouseholdStoreError {
    /// Store connection could not be established.
    #[error("household store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("household store query failed: {message}")]
    Query { message: String },
    /// Another household already uses this name.
    #[error("household name already in use: {name}")]
    DuplicateName { name: String },
}

impl HouseholdStoreError {
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
}

/// Household reads plus the single-row mutations that need no cross-store
/// transaction (partial detail edits, ownership transfer).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HouseholdRepository: Send + Sync {
    /// Fetch a household by identifier.
    async fn find_by_id(&self, id: &HouseholdId)
    -> Result<Option<Household>, HouseholdStoreError>;

    /// Fetch a household by exact, case-sensitive name.
    async fn find_by_name(
        &self,
        name: &HouseholdName,
    ) -> Result<Option<Household>, HouseholdStoreError>;

    /// Apply a partial update. `None` fields are left unchanged, not cleared.
    async fn update_details<'a>(
        &self,
        id: &HouseholdId,
        name: Option<&'a HouseholdName>,
        address: Option<&'a str>,
    ) -> Result<(), HouseholdStoreError>;

    /// Replace the owner reference.
    async fn set_owner(
        &self,
        id: &HouseholdId,
        owner_id: &UserId,
    ) -> Result<(), HouseholdStoreError>;
}
