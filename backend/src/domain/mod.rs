//! Domain types, ports, and services for the membership core.
//!
//! Entities are strongly typed and validated at construction; driving ports
//! express the operations the inbound adapters may invoke, driven ports the
//! storage and notification capabilities the domain requires. Services wire
//! the two together and own every business rule, most importantly the
//! member-count invariant: a household's `number_of_members` always equals
//! its registered plus unregistered members.

pub mod error;
pub mod household;
pub mod membership_request;
pub mod notification;
pub mod ports;
pub mod user;

mod household_service;
mod member_service;
mod request_service;
mod store_errors;

pub use self::error::{Error, ErrorCode};
pub use self::household::{
    Household, HouseholdDetails, HouseholdId, HouseholdName, MemberId, MemberProfile,
    UnregisteredMember,
};
pub use self::household_service::HouseholdService;
pub use self::member_service::UnregisteredMemberService;
pub use self::membership_request::{MembershipRequest, RequestId, RequestKind, RequestStatus};
pub use self::notification::NotificationEvent;
pub use self::request_service::MembershipRequestService;
pub use self::user::{User, UserId};

/// Convenient result alias for domain operations.
pub type ApiResult<T> = Result<T, Error>;
