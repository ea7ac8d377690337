//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and are
//! never exposed to the domain. They exist solely to satisfy Diesel's type
//! requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{households, membership_requests, unregistered_members, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub confirmed: bool,
    pub confirmation_token: Option<String>,
    pub household_id: Option<Uuid>,
}

/// Row struct for reading from the households table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = households)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HouseholdRow {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub owner_id: Uuid,
    pub number_of_members: i32,
}

/// Insertable struct for creating new household records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = households)]
pub(crate) struct NewHouseholdRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub address: &'a str,
    pub owner_id: Uuid,
    pub number_of_members: i32,
}

/// Changeset struct for partial household detail updates.
///
/// `None` fields are skipped, not set to NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = households)]
pub(crate) struct HouseholdUpdate<'a> {
    pub name: Option<&'a str>,
    pub address: Option<&'a str>,
}

/// Row struct for reading from the unregistered_members table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = unregistered_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UnregisteredMemberRow {
    pub id: Uuid,
    pub full_name: String,
    pub household_id: Uuid,
}

/// Insertable struct for creating new unregistered-member records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = unregistered_members)]
pub(crate) struct NewUnregisteredMemberRow<'a> {
    pub id: Uuid,
    pub full_name: &'a str,
    pub household_id: Uuid,
}

/// Row struct for reading from the membership_requests table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = membership_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MembershipRequestRow {
    pub id: Uuid,
    pub household_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub kind: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new membership-request records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = membership_requests)]
pub(crate) struct NewMembershipRequestRow<'a> {
    pub id: Uuid,
    pub household_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub kind: &'a str,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
}
