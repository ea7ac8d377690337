//! Unregistered-member lifecycle service.
//!
//! Add and remove mutate the owning household's member count, so both go
//! through the transactional [`MembershipStore`]. Rename touches only the
//! member row.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::Error;
use crate::domain::household::{HouseholdId, MemberId, UnregisteredMember};
use crate::domain::ports::{
    HouseholdRepository, MembershipStore, UnregisteredMemberCommand,
    UnregisteredMemberRepository,
};
use crate::domain::user::PersonName;

use super::household_service::{map_household_store_error, map_membership_store_error};
use super::store_errors::map_member_store_error;

/// Unregistered-member service implementing the driving port.
#[derive(Clone)]
pub struct UnregisteredMemberService<H, M, S> {
    households: Arc<H>,
    members: Arc<M>,
    store: Arc<S>,
}

impl<H, M, S> UnregisteredMemberService<H, M, S> {
    /// Create a new service with the given collaborators.
    pub fn new(households: Arc<H>, members: Arc<M>, store: Arc<S>) -> Self {
        Self {
            households,
            members,
            store,
        }
    }
}

fn duplicate_member_error(name: &PersonName) -> Error {
    Error::conflict("unregistered member with this name already exists in the household")
        .with_details(json!({ "fullName": name.as_ref(), "code": "duplicate_member" }))
}

fn member_not_found() -> Error {
    Error::not_found("unregistered member not found")
}

#[async_trait]
impl<H, M, S> UnregisteredMemberCommand for UnregisteredMemberService<H, M, S>
where
    H: HouseholdRepository,
    M: UnregisteredMemberRepository,
    S: MembershipStore,
{
    async fn add_member(
        &self,
        household_id: &HouseholdId,
        full_name: PersonName,
    ) -> Result<UnregisteredMember, Error> {
        let household = self
            .households
            .find_by_id(household_id)
            .await
            .map_err(map_household_store_error)?
            .ok_or_else(|| Error::not_found("household not found"))?;

        if self
            .members
            .find_by_name_and_household(&full_name, &household.id)
            .await
            .map_err(map_member_store_error)?
            .is_some()
        {
            return Err(duplicate_member_error(&full_name));
        }

        let member = UnregisteredMember {
            id: MemberId::random(),
            full_name,
            household_id: household.id,
        };

        self.store
            .insert_unregistered(&member)
            .await
            .map_err(map_membership_store_error)?;

        Ok(member)
    }

    async fn remove_member(&self, member_id: &MemberId) -> Result<(), Error> {
        let member = self
            .members
            .find_by_id(member_id)
            .await
            .map_err(map_member_store_error)?
            .ok_or_else(member_not_found)?;

        self.store
            .delete_unregistered(&member.id, &member.household_id)
            .await
            .map_err(map_membership_store_error)
    }

    async fn edit_member(
        &self,
        member_id: &MemberId,
        full_name: Option<PersonName>,
    ) -> Result<(), Error> {
        let member = self
            .members
            .find_by_id(member_id)
            .await
            .map_err(map_member_store_error)?
            .ok_or_else(member_not_found)?;

        let Some(full_name) = full_name else {
            // Omitted field: idempotent no-op.
            return Ok(());
        };
        if full_name == member.full_name {
            return Ok(());
        }

        self.members
            .rename(&member.id, &full_name)
            .await
            .map_err(map_member_store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::household::{Household, HouseholdName};
    use crate::domain::ports::{
        MembershipStoreError, MockHouseholdRepository, MockMembershipStore,
        MockUnregisteredMemberRepository,
    };
    use crate::domain::user::UserId;

    type Service = UnregisteredMemberService<
        MockHouseholdRepository,
        MockUnregisteredMemberRepository,
        MockMembershipStore,
    >;

    fn service(
        households: MockHouseholdRepository,
        members: MockUnregisteredMemberRepository,
        store: MockMembershipStore,
    ) -> Service {
        UnregisteredMemberService::new(Arc::new(households), Arc::new(members), Arc::new(store))
    }

    fn household(id: HouseholdId) -> Household {
        Household {
            id,
            name: HouseholdName::new("Smiths").expect("valid name"),
            address: "1 Elm Street".into(),
            owner_id: UserId::random(),
            number_of_members: 1,
        }
    }

    fn member(id: MemberId, household_id: HouseholdId, name: &str) -> UnregisteredMember {
        UnregisteredMember {
            id,
            full_name: PersonName::new(name).expect("valid name"),
            household_id,
        }
    }

    #[tokio::test]
    async fn add_member_inserts_through_the_store() {
        let household_id = HouseholdId::random();
        let mut households = MockHouseholdRepository::new();
        let mut members = MockUnregisteredMemberRepository::new();
        let mut store = MockMembershipStore::new();

        households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id))));
        members
            .expect_find_by_name_and_household()
            .times(1)
            .return_once(|_, _| Ok(None));
        store
            .expect_insert_unregistered()
            .withf(move |member| member.household_id == household_id)
            .times(1)
            .return_once(|_| Ok(()));

        let created = service(households, members, store)
            .add_member(
                &household_id,
                PersonName::new("Baby Smith").expect("valid name"),
            )
            .await
            .expect("member added");

        assert_eq!(created.household_id, household_id);
        assert_eq!(created.full_name.as_ref(), "Baby Smith");
    }

    #[tokio::test]
    async fn add_member_rejects_duplicate_name_in_household() {
        let household_id = HouseholdId::random();
        let mut households = MockHouseholdRepository::new();
        let mut members = MockUnregisteredMemberRepository::new();
        let mut store = MockMembershipStore::new();

        households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id))));
        members
            .expect_find_by_name_and_household()
            .times(1)
            .return_once(move |_, _| {
                Ok(Some(member(MemberId::random(), household_id, "Baby Smith")))
            });
        store.expect_insert_unregistered().times(0);

        let error = service(households, members, store)
            .add_member(
                &household_id,
                PersonName::new("Baby Smith").expect("valid name"),
            )
            .await
            .expect_err("duplicate rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn add_member_requires_an_existing_household() {
        let mut households = MockHouseholdRepository::new();
        let members = MockUnregisteredMemberRepository::new();
        let store = MockMembershipStore::new();

        households
            .expect_find_by_id()
            .times(1)
            .return_once(|_| Ok(None));

        let error = service(households, members, store)
            .add_member(
                &HouseholdId::random(),
                PersonName::new("Baby Smith").expect("valid name"),
            )
            .await
            .expect_err("missing household rejected");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn remove_member_deletes_and_releases_the_count_slot() {
        let household_id = HouseholdId::random();
        let member_id = MemberId::random();
        let households = MockHouseholdRepository::new();
        let mut members = MockUnregisteredMemberRepository::new();
        let mut store = MockMembershipStore::new();

        members
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(member(member_id, household_id, "Baby Smith"))));
        store
            .expect_delete_unregistered()
            .withf(move |mid, hid| *mid == member_id && *hid == household_id)
            .times(1)
            .return_once(|_, _| Ok(()));

        service(households, members, store)
            .remove_member(&member_id)
            .await
            .expect("member removed");
    }

    #[tokio::test]
    async fn remove_member_rejects_unknown_member() {
        let households = MockHouseholdRepository::new();
        let mut members = MockUnregisteredMemberRepository::new();
        let store = MockMembershipStore::new();

        members.expect_find_by_id().times(1).return_once(|_| Ok(None));

        let error = service(households, members, store)
            .remove_member(&MemberId::random())
            .await
            .expect_err("unknown member rejected");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn edit_member_without_name_is_a_no_op() {
        let member_id = MemberId::random();
        let households = MockHouseholdRepository::new();
        let mut members = MockUnregisteredMemberRepository::new();
        let store = MockMembershipStore::new();

        members
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| {
                Ok(Some(member(member_id, HouseholdId::random(), "Baby Smith")))
            });
        members.expect_rename().times(0);

        service(households, members, store)
            .edit_member(&member_id, None)
            .await
            .expect("no-op edit succeeds");
    }

    #[tokio::test]
    async fn edit_member_renames_when_a_name_is_given() {
        let member_id = MemberId::random();
        let households = MockHouseholdRepository::new();
        let mut members = MockUnregisteredMemberRepository::new();
        let store = MockMembershipStore::new();

        members
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| {
                Ok(Some(member(member_id, HouseholdId::random(), "Baby Smith")))
            });
        members
            .expect_rename()
            .withf(move |mid, name| *mid == member_id && name.as_ref() == "Toddler Smith")
            .times(1)
            .return_once(|_, _| Ok(()));

        service(households, members, store)
            .edit_member(
                &member_id,
                Some(PersonName::new("Toddler Smith").expect("valid name")),
            )
            .await
            .expect("rename succeeds");
    }

    #[tokio::test]
    async fn store_duplicate_races_surface_as_conflict() {
        let household_id = HouseholdId::random();
        let mut households = MockHouseholdRepository::new();
        let mut members = MockUnregisteredMemberRepository::new();
        let mut store = MockMembershipStore::new();

        households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id))));
        members
            .expect_find_by_name_and_household()
            .times(1)
            .return_once(|_, _| Ok(None));
        store
            .expect_insert_unregistered()
            .times(1)
            .return_once(|_| Err(MembershipStoreError::duplicate_member("Baby Smith")));

        let error = service(households, members, store)
            .add_member(
                &household_id,
                PersonName::new("Baby Smith").expect("valid name"),
            )
            .await
            .expect_err("race surfaces as conflict");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }
}
