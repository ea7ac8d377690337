//! Port abstraction for the membership-request store.

use async_trait::async_trait;

use crate::domain::household::HouseholdId;
use crate::domain::membership_request::{
    MembershipRequest, RequestId, RequestKind, RequestStatus,
};
use crate::domain::user::UserId;

/// Persistence errors raised by membership-request store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestStoreError {
    /// Store connection could not be established.
    #[error("request store connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("request store query failed: {message}")]
    Query { message: String },
}

impl RequestStoreError {
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

/// Membership-request storage.
///
/// List queries return snapshots ordered by `created_at` ascending so
/// repeated reads are deterministic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRequestRepository: Send + Sync {
    /// Persist a freshly created pending request.
    async fn insert(&self, request: &MembershipRequest) -> Result<(), RequestStoreError>;

    /// Fetch a request by identifier.
    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<MembershipRequest>, RequestStoreError>;

    /// Compare-and-set the status from pending to the given terminal state.
    ///
    /// Returns `false` when no pending row matched, i.e. the request was
    /// already resolved by a concurrent caller or does not exist.
    async fn resolve(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<bool, RequestStoreError>;

    /// List requests addressed to a user, filtered by kind and status.
    async fn list_received(
        &self,
        receiver_id: &UserId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError>;

    /// List requests sent by a user, filtered by kind and status.
    async fn list_sent(
        &self,
        sender_id: &UserId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError>;

    /// List requests targeting a household, filtered by kind and status.
    async fn list_for_household(
        &self,
        household_id: &HouseholdId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError>;
}
