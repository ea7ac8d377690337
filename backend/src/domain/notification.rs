//! Notification events emitted after membership state changes.
//!
//! Delivery is fire-and-forget; the sender port logs failures and never
//! propagates them into the originating operation.

use serde::Serialize;

use super::household::HouseholdId;
use super::membership_request::{RequestId, RequestKind, RequestStatus};
use super::user::UserId;

/// Event pushed to a user over the live notification channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A pending invitation or join request arrived for the recipient.
    RequestReceived {
        request_id: RequestId,
        household_id: HouseholdId,
        kind: RequestKind,
    },
    /// A request the recipient participates in reached a terminal state.
    RequestResolved {
        request_id: RequestId,
        status: RequestStatus,
    },
    /// A registered user joined the recipient's household.
    MemberJoined {
        household_id: HouseholdId,
        user_id: UserId,
    },
    /// A registered user left the recipient's household.
    MemberLeft {
        household_id: HouseholdId,
        user_id: UserId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_snake_case_tag() {
        let event = NotificationEvent::MemberJoined {
            household_id: HouseholdId::random(),
            user_id: UserId::random(),
        };
        let value = serde_json::to_value(&event).expect("serializes");
        assert_eq!(value["event"], "member_joined");
        assert!(value.get("household_id").is_some());
    }

    #[test]
    fn resolution_carries_the_terminal_status() {
        let event = NotificationEvent::RequestResolved {
            request_id: RequestId::random(),
            status: RequestStatus::Accepted,
        };
        let value = serde_json::to_value(&event).expect("serializes");
        assert_eq!(value["status"], "accepted");
    }
}
