//! Driving ports for household lifecycle and unregistered-member operations.
//!
//! HTTP handlers depend on these traits rather than on the concrete services
//! so they stay testable with deterministic doubles.

use async_trait::async_trait;

use crate::domain::Error;
use crate::domain::household::{
    Household, HouseholdDetails, HouseholdId, HouseholdName, MemberId, UnregisteredMember,
};
use crate::domain::user::{PersonName, UserId};

/// Validated input for household creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateHouseholdRequest {
    pub name: HouseholdName,
    pub address: String,
    pub owner_id: UserId,
}

/// Partial update for household details. `None` fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditHouseholdRequest {
    pub name: Option<HouseholdName>,
    pub address: Option<String>,
}

/// Household lifecycle operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HouseholdCommand: Send + Sync {
    /// Create a household; the owner becomes its first member.
    async fn create_household(&self, request: CreateHouseholdRequest)
    -> Result<Household, Error>;

    /// Move a user into a household, leaving their current one if any.
    async fn add_user_to_household(
        &self,
        user_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<(), Error>;

    /// Remove a user from their current household.
    async fn remove_user_from_household(&self, user_id: &UserId) -> Result<(), Error>;

    /// Transfer ownership to another current member of the household.
    async fn change_owner(
        &self,
        user_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<(), Error>;

    /// Apply a partial update to household name and address.
    async fn edit_household(
        &self,
        household_id: &HouseholdId,
        request: EditHouseholdRequest,
    ) -> Result<(), Error>;
}

/// Household read models.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HouseholdQuery: Send + Sync {
    /// Aggregate view of the household a user belongs to.
    async fn household_details(&self, user_id: &UserId) -> Result<HouseholdDetails, Error>;
}

/// Unregistered-member lifecycle operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnregisteredMemberCommand: Send + Sync {
    /// Add a non-authenticating occupant to a household.
    async fn add_member(
        &self,
        household_id: &HouseholdId,
        full_name: PersonName,
    ) -> Result<UnregisteredMember, Error>;

    /// Remove an occupant and release their member-count slot.
    async fn remove_member(&self, member_id: &MemberId) -> Result<(), Error>;

    /// Rename an occupant. A `None` name is an idempotent no-op.
    async fn edit_member(
        &self,
        member_id: &MemberId,
        full_name: Option<PersonName>,
    ) -> Result<(), Error>;
}
