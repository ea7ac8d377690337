//! Domain ports.
//!
//! Driven ports abstract the storage and notification collaborators; driving
//! ports expose the membership use-cases to inbound adapters. Adapters on
//! either side depend only on these traits.

mod household_commands;
mod household_repository;
mod membership_request_commands;
mod membership_request_repository;
mod membership_store;
mod notification_sender;
mod unregistered_member_repository;
mod user_repository;

pub use household_commands::{
    CreateHouseholdRequest, EditHouseholdRequest, HouseholdCommand, HouseholdQuery,
    UnregisteredMemberCommand,
};
pub use household_repository::{HouseholdRepository, HouseholdStoreError};
pub use membership_request_commands::{MembershipRequestCommand, MembershipRequestQuery};
pub use membership_request_repository::{MembershipRequestRepository, RequestStoreError};
pub use membership_store::{MembershipStore, MembershipStoreError};
pub use notification_sender::{NotificationSender, NullNotificationSender};
pub use unregistered_member_repository::{MemberStoreError, UnregisteredMemberRepository};
pub use user_repository::{UserRepository, UserStoreError};

#[cfg(test)]
pub use household_commands::{
    MockHouseholdCommand, MockHouseholdQuery, MockUnregisteredMemberCommand,
};
#[cfg(test)]
pub use household_repository::MockHouseholdRepository;
#[cfg(test)]
pub use membership_request_commands::{MockMembershipRequestCommand, MockMembershipRequestQuery};
#[cfg(test)]
pub use membership_request_repository::MockMembershipRequestRepository;
#[cfg(test)]
pub use membership_store::MockMembershipStore;
#[cfg(test)]
pub use notification_sender::MockNotificationSender;
#[cfg(test)]
pub use unregistered_member_repository::MockUnregisteredMemberRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
