//! Membership request state machine.
//!
//! A request is created pending and resolves exactly once: accepted,
//! rejected, or cancelled. Terminal states admit no further transitions;
//! resolution at the storage layer is a compare-and-set on the pending
//! status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::household::HouseholdId;
use super::user::UserId;

/// Stable membership request identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Wrap an identifier that already exists in storage.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Direction of a membership request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Household owner invites a user; sender is the owner.
    Invitation,
    /// User asks to join a household; receiver is the owner.
    JoinRequest,
}

impl RequestKind {
    /// Storage representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invitation => "invitation",
            Self::JoinRequest => "join_request",
        }
    }
}

impl FromStr for RequestKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "invitation" => Ok(Self::Invitation),
            "join_request" => Ok(Self::JoinRequest),
            other => Err(format!("unknown request kind: {other}")),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a membership request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl RequestStatus {
    /// Whether the status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Storage representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pending or resolved invitation / join request.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipRequest {
    pub id: RequestId,
    pub household_id: HouseholdId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl MembershipRequest {
    /// Create a fresh pending request.
    pub fn pending(
        household_id: HouseholdId,
        sender_id: UserId,
        receiver_id: UserId,
        kind: RequestKind,
    ) -> Self {
        Self {
            id: RequestId::random(),
            household_id,
            sender_id,
            receiver_id,
            kind,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// The user whose household membership changes when this request is
    /// accepted: the invited user for invitations, the requester for join
    /// requests.
    pub fn joining_user(&self) -> UserId {
        match self.kind {
            RequestKind::Invitation => self.receiver_id,
            RequestKind::JoinRequest => self.sender_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RequestStatus::Pending, false)]
    #[case(RequestStatus::Accepted, true)]
    #[case(RequestStatus::Rejected, true)]
    #[case(RequestStatus::Cancelled, true)]
    fn only_pending_is_non_terminal(#[case] status: RequestStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[rstest]
    #[case(RequestStatus::Pending, "pending")]
    #[case(RequestStatus::Accepted, "accepted")]
    #[case(RequestStatus::Rejected, "rejected")]
    #[case(RequestStatus::Cancelled, "cancelled")]
    fn statuses_round_trip_through_storage_form(
        #[case] status: RequestStatus,
        #[case] text: &str,
    ) {
        assert_eq!(status.as_str(), text);
        assert_eq!(text.parse::<RequestStatus>(), Ok(status));
    }

    #[test]
    fn invitation_moves_the_receiver() {
        let request = MembershipRequest::pending(
            HouseholdId::random(),
            UserId::random(),
            UserId::random(),
            RequestKind::Invitation,
        );
        assert_eq!(request.joining_user(), request.receiver_id);
    }

    #[test]
    fn join_request_moves_the_sender() {
        let request = MembershipRequest::pending(
            HouseholdId::random(),
            UserId::random(),
            UserId::random(),
            RequestKind::JoinRequest,
        );
        assert_eq!(request.joining_user(), request.sender_id);
        assert_eq!(request.status, RequestStatus::Pending);
    }
}
