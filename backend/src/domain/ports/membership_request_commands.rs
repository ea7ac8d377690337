//! Driving ports for the membership-request state machine.

use async_trait::async_trait;

use crate::domain::Error;
use crate::domain::household::HouseholdId;
use crate::domain::membership_request::{MembershipRequest, RequestId};
use crate::domain::user::UserId;

/// Invitation and join-request transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRequestCommand: Send + Sync {
    /// Create a pending invitation from a household's owner to a user.
    async fn send_invitation(
        &self,
        receiver_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<MembershipRequest, Error>;

    /// Create a pending join request from a user to a household's owner.
    async fn send_join_request(
        &self,
        sender_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<MembershipRequest, Error>;

    /// Accept a pending request; also moves the joining user into the
    /// household within the same transaction.
    async fn accept_request(&self, request_id: &RequestId) -> Result<(), Error>;

    /// Decline a pending request.
    async fn decline_request(&self, request_id: &RequestId) -> Result<(), Error>;

    /// Withdraw a pending request; sender-initiated, also terminal.
    async fn cancel_request(&self, request_id: &RequestId) -> Result<(), Error>;
}

/// Membership-request read models. Snapshots are ordered by creation time
/// ascending.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRequestQuery: Send + Sync {
    /// Pending invitations addressed to a user.
    async fn received_invitations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipRequest>, Error>;

    /// Pending join requests targeting a household.
    async fn pending_join_requests(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<MembershipRequest>, Error>;

    /// Join requests for a household that were accepted.
    async fn accepted_join_requests(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<MembershipRequest>, Error>;

    /// Pending requests of either kind sent by a user; feeds the cancel flow.
    async fn sent_pending_requests(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipRequest>, Error>;
}
