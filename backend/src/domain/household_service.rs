//! Household lifecycle service.
//!
//! Implements the household half of the membership core: creation, member
//! moves, removal, ownership transfer, partial edits, and the aggregated
//! details read model. Every multi-step mutation is delegated to the
//! transactional [`MembershipStore`] so the member-count invariant holds
//! under concurrent callers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::domain::Error;
use crate::domain::household::{Household, HouseholdDetails, HouseholdId, MemberProfile};
use crate::domain::notification::NotificationEvent;
use crate::domain::ports::{
    CreateHouseholdRequest, EditHouseholdRequest, HouseholdCommand, HouseholdQuery,
    HouseholdRepository, HouseholdStoreError, MembershipStore, MembershipStoreError,
    NotificationSender, UnregisteredMemberRepository, UserRepository,
};
use crate::domain::user::{User, UserId};

use super::store_errors::{map_member_store_error, map_user_store_error};

/// Household lifecycle service implementing the driving ports.
#[derive(Clone)]
pub struct HouseholdService<U, H, M, S, N> {
    users: Arc<U>,
    households: Arc<H>,
    members: Arc<M>,
    store: Arc<S>,
    notifications: Arc<N>,
}

impl<U, H, M, S, N> HouseholdService<U, H, M, S, N> {
    /// Create a new service with the given collaborators.
    pub fn new(
        users: Arc<U>,
        households: Arc<H>,
        members: Arc<M>,
        store: Arc<S>,
        notifications: Arc<N>,
    ) -> Self {
        Self {
            users,
            households,
            members,
            store,
            notifications,
        }
    }
}

pub(super) fn map_household_store_error(error: HouseholdStoreError) -> Error {
    match error {
        HouseholdStoreError::Connection { message } => {
            Error::service_unavailable(format!("household store unavailable: {message}"))
        }
        HouseholdStoreError::Query { message } => {
            Error::internal(format!("household store error: {message}"))
        }
        HouseholdStoreError::DuplicateName { name } => duplicate_name_error(&name),
    }
}

pub(super) fn map_membership_store_error(error: MembershipStoreError) -> Error {
    match error {
        MembershipStoreError::Connection { message } => {
            Error::service_unavailable(format!("membership store unavailable: {message}"))
        }
        MembershipStoreError::Query { message } => {
            Error::internal(format!("membership store error: {message}"))
        }
        MembershipStoreError::DuplicateName { name } => duplicate_name_error(&name),
        MembershipStoreError::DuplicateMember { name } => {
            Error::conflict("unregistered member with this name already exists in the household")
                .with_details(json!({ "fullName": name, "code": "duplicate_member" }))
        }
        MembershipStoreError::CountUnderflow { household_id } => Error::internal(format!(
            "member count underflow for household {household_id}"
        )),
        MembershipStoreError::StaleMembership { user_id } => {
            Error::conflict("user membership changed during the operation")
                .with_details(json!({ "userId": user_id, "code": "stale_membership" }))
        }
    }
}

fn duplicate_name_error(name: &str) -> Error {
    Error::conflict("household name already in use")
        .with_details(json!({ "name": name, "code": "duplicate_name" }))
}

impl<U, H, M, S, N> HouseholdService<U, H, M, S, N>
where
    U: UserRepository,
    H: HouseholdRepository,
    M: UnregisteredMemberRepository,
    S: MembershipStore,
    N: NotificationSender,
{
    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_store_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn load_household(&self, household_id: &HouseholdId) -> Result<Household, Error> {
        self.households
            .find_by_id(household_id)
            .await
            .map_err(map_household_store_error)?
            .ok_or_else(|| Error::not_found("household not found"))
    }

    /// Best-effort household lookup used only to address notifications.
    async fn household_for_notification(&self, household_id: &HouseholdId) -> Option<Household> {
        match self.households.find_by_id(household_id).await {
            Ok(found) => found,
            Err(error) => {
                warn!(
                    household_id = %household_id,
                    error = %error,
                    "skipping notification: household lookup failed"
                );
                None
            }
        }
    }
}

#[async_trait]
impl<U, H, M, S, N> HouseholdCommand for HouseholdService<U, H, M, S, N>
where
    U: UserRepository,
    H: HouseholdRepository,
    M: UnregisteredMemberRepository,
    S: MembershipStore,
    N: NotificationSender,
{
    async fn create_household(
        &self,
        request: CreateHouseholdRequest,
    ) -> Result<Household, Error> {
        if self
            .households
            .find_by_name(&request.name)
            .await
            .map_err(map_household_store_error)?
            .is_some()
        {
            return Err(duplicate_name_error(request.name.as_ref()));
        }

        let owner = self.load_user(&request.owner_id).await?;

        let household = Household {
            id: HouseholdId::random(),
            name: request.name,
            address: request.address,
            owner_id: owner.id,
            number_of_members: 1,
        };

        self.store
            .create_household(&household, owner.household_id)
            .await
            .map_err(map_membership_store_error)?;

        Ok(household)
    }

    async fn add_user_to_household(
        &self,
        user_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<(), Error> {
        let user = self.load_user(user_id).await?;
        let household = self.load_household(household_id).await?;

        if user.household_id == Some(household.id) {
            return Err(Error::conflict("user already belongs to this household"));
        }

        self.store
            .attach_user(&user.id, user.household_id, &household.id)
            .await
            .map_err(map_membership_store_error)?;

        if household.owner_id != user.id {
            self.notifications
                .notify(
                    &household.owner_id,
                    NotificationEvent::MemberJoined {
                        household_id: household.id,
                        user_id: user.id,
                    },
                )
                .await;
        }
        Ok(())
    }

    async fn remove_user_from_household(&self, user_id: &UserId) -> Result<(), Error> {
        let user = self.load_user(user_id).await?;
        let household_id = user
            .household_id
            .ok_or_else(|| Error::conflict("user does not belong to a household"))?;

        // Owner lookup happens before the mutation and only feeds the
        // best-effort notification below.
        let household = self.household_for_notification(&household_id).await;

        self.store
            .detach_user(&user.id, &household_id)
            .await
            .map_err(map_membership_store_error)?;

        if let Some(household) = household {
            if household.owner_id != user.id {
                self.notifications
                    .notify(
                        &household.owner_id,
                        NotificationEvent::MemberLeft {
                            household_id,
                            user_id: user.id,
                        },
                    )
                    .await;
            }
        }
        Ok(())
    }

    async fn change_owner(
        &self,
        user_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<(), Error> {
        let user = self.load_user(user_id).await?;
        let household = self.load_household(household_id).await?;

        if household.owner_id == user.id {
            return Err(Error::conflict("user already owns this household"));
        }
        if user.household_id != Some(household.id) {
            return Err(Error::conflict(
                "new owner must be a member of the household",
            ));
        }

        self.households
            .set_owner(&household.id, &user.id)
            .await
            .map_err(map_household_store_error)
    }

    async fn edit_household(
        &self,
        household_id: &HouseholdId,
        request: EditHouseholdRequest,
    ) -> Result<(), Error> {
        let household = self.load_household(household_id).await?;

        if request.name.is_none() && request.address.is_none() {
            return Ok(());
        }

        if let Some(name) = &request.name {
            if *name != household.name
                && self
                    .households
                    .find_by_name(name)
                    .await
                    .map_err(map_household_store_error)?
                    .is_some()
            {
                return Err(duplicate_name_error(name.as_ref()));
            }
        }

        self.households
            .update_details(
                &household.id,
                request.name.as_ref(),
                request.address.as_deref(),
            )
            .await
            .map_err(map_household_store_error)
    }
}

#[async_trait]
impl<U, H, M, S, N> HouseholdQuery for HouseholdService<U, H, M, S, N>
where
    U: UserRepository,
    H: HouseholdRepository,
    M: UnregisteredMemberRepository,
    S: MembershipStore,
    N: NotificationSender,
{
    async fn household_details(&self, user_id: &UserId) -> Result<HouseholdDetails, Error> {
        let user = self.load_user(user_id).await?;
        let household_id = user
            .household_id
            .ok_or_else(|| Error::not_found("user does not belong to a household"))?;

        let household = self
            .households
            .find_by_id(&household_id)
            .await
            .map_err(map_household_store_error)?
            .ok_or_else(|| Error::internal("user references a missing household"))?;

        let registered_members = self
            .users
            .list_by_household(&household.id)
            .await
            .map_err(map_user_store_error)?
            .into_iter()
            .map(MemberProfile::from)
            .collect();

        let unregistered_members = self
            .members
            .list_by_household(&household.id)
            .await
            .map_err(map_member_store_error)?;

        Ok(HouseholdDetails {
            household,
            registered_members,
            unregistered_members,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::household::HouseholdName;
    use crate::domain::ports::{
        MockHouseholdRepository, MockMembershipStore, MockNotificationSender,
        MockUnregisteredMemberRepository, MockUserRepository,
    };
    use crate::domain::user::{EmailAddress, PersonName, Role};

    type Service = HouseholdService<
        MockUserRepository,
        MockHouseholdRepository,
        MockUnregisteredMemberRepository,
        MockMembershipStore,
        MockNotificationSender,
    >;

    struct Mocks {
        users: MockUserRepository,
        households: MockHouseholdRepository,
        members: MockUnregisteredMemberRepository,
        store: MockMembershipStore,
        notifications: MockNotificationSender,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockUserRepository::new(),
                households: MockHouseholdRepository::new(),
                members: MockUnregisteredMemberRepository::new(),
                store: MockMembershipStore::new(),
                notifications: MockNotificationSender::new(),
            }
        }

        fn into_service(self) -> Service {
            HouseholdService::new(
                Arc::new(self.users),
                Arc::new(self.households),
                Arc::new(self.members),
                Arc::new(self.store),
                Arc::new(self.notifications),
            )
        }
    }

    fn user(id: UserId, household_id: Option<HouseholdId>) -> User {
        User {
            id,
            email: EmailAddress::new("ada@example.org").expect("valid email"),
            password_hash: "hash".into(),
            full_name: PersonName::new("Ada Lovelace").expect("valid name"),
            role: Role::User,
            confirmed: true,
            confirmation_token: None,
            household_id,
        }
    }

    fn household(id: HouseholdId, owner_id: UserId, count: u32) -> Household {
        Household {
            id,
            name: HouseholdName::new("Smiths").expect("valid name"),
            address: "1 Elm Street".into(),
            owner_id,
            number_of_members: count,
        }
    }

    #[tokio::test]
    async fn create_household_persists_with_owner_as_first_member() {
        let owner_id = UserId::random();
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_name()
            .times(1)
            .return_once(|_| Ok(None));
        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(owner_id, None))));
        mocks
            .store
            .expect_create_household()
            .withf(move |household, previous| {
                household.number_of_members == 1
                    && household.owner_id == owner_id
                    && previous.is_none()
            })
            .times(1)
            .return_once(|_, _| Ok(()));

        let service = mocks.into_service();
        let created = service
            .create_household(CreateHouseholdRequest {
                name: HouseholdName::new("Smiths").expect("valid name"),
                address: "1 Elm Street".into(),
                owner_id,
            })
            .await
            .expect("creation succeeds");

        assert_eq!(created.number_of_members, 1);
        assert_eq!(created.owner_id, owner_id);
    }

    #[tokio::test]
    async fn create_household_rejects_duplicate_name_without_persisting() {
        let owner_id = UserId::random();
        let existing_owner = UserId::random();
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_name()
            .times(1)
            .return_once(move |_| {
                Ok(Some(household(HouseholdId::random(), existing_owner, 2)))
            });
        mocks.store.expect_create_household().times(0);

        let service = mocks.into_service();
        let error = service
            .create_household(CreateHouseholdRequest {
                name: HouseholdName::new("Smiths").expect("valid name"),
                address: "2 Oak Street".into(),
                owner_id,
            })
            .await
            .expect_err("duplicate name rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn create_household_rejects_missing_owner() {
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_name()
            .times(1)
            .return_once(|_| Ok(None));
        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(|_| Ok(None));
        mocks.store.expect_create_household().times(0);

        let service = mocks.into_service();
        let error = service
            .create_household(CreateHouseholdRequest {
                name: HouseholdName::new("Smiths").expect("valid name"),
                address: "1 Elm Street".into(),
                owner_id: UserId::random(),
            })
            .await
            .expect_err("missing owner rejected");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn add_user_moves_between_households_through_the_store() {
        let user_id = UserId::random();
        let owner_id = UserId::random();
        let previous_id = HouseholdId::random();
        let target_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, Some(previous_id)))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(target_id, owner_id, 1))));
        mocks
            .store
            .expect_attach_user()
            .withf(move |uid, previous, target| {
                *uid == user_id && *previous == Some(previous_id) && *target == target_id
            })
            .times(1)
            .return_once(|_, _, _| Ok(()));
        mocks
            .notifications
            .expect_notify()
            .withf(move |recipient, event| {
                *recipient == owner_id
                    && matches!(event, NotificationEvent::MemberJoined { .. })
            })
            .times(1)
            .return_once(|_, _| ());

        let service = mocks.into_service();
        service
            .add_user_to_household(&user_id, &target_id)
            .await
            .expect("move succeeds");
    }

    #[tokio::test]
    async fn add_user_rejects_joining_the_current_household() {
        let user_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, Some(household_id)))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, UserId::random(), 3))));
        mocks.store.expect_attach_user().times(0);

        let service = mocks.into_service();
        let error = service
            .add_user_to_household(&user_id, &household_id)
            .await
            .expect_err("no-op membership rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn remove_user_without_household_is_rejected() {
        let user_id = UserId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, None))));
        mocks.store.expect_detach_user().times(0);

        let service = mocks.into_service();
        let error = service
            .remove_user_from_household(&user_id)
            .await
            .expect_err("removal without membership rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn remove_user_detaches_and_notifies_the_owner() {
        let user_id = UserId::random();
        let owner_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, Some(household_id)))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, owner_id, 2))));
        mocks
            .store
            .expect_detach_user()
            .withf(move |uid, hid| *uid == user_id && *hid == household_id)
            .times(1)
            .return_once(|_, _| Ok(()));
        mocks
            .notifications
            .expect_notify()
            .withf(move |recipient, event| {
                *recipient == owner_id && matches!(event, NotificationEvent::MemberLeft { .. })
            })
            .times(1)
            .return_once(|_, _| ());

        let service = mocks.into_service();
        service
            .remove_user_from_household(&user_id)
            .await
            .expect("removal succeeds");
    }

    #[tokio::test]
    async fn change_owner_rejects_the_current_owner() {
        let owner_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(owner_id, Some(household_id)))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, owner_id, 2))));
        mocks.households.expect_set_owner().times(0);

        let service = mocks.into_service();
        let error = service
            .change_owner(&owner_id, &household_id)
            .await
            .expect_err("current owner rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn change_owner_requires_membership() {
        let user_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, None))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, UserId::random(), 2))));
        mocks.households.expect_set_owner().times(0);

        let service = mocks.into_service();
        let error = service
            .change_owner(&user_id, &household_id)
            .await
            .expect_err("non-member owner rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn change_owner_replaces_the_owner_reference() {
        let user_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, Some(household_id)))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, UserId::random(), 2))));
        mocks
            .households
            .expect_set_owner()
            .withf(move |hid, uid| *hid == household_id && *uid == user_id)
            .times(1)
            .return_once(|_, _| Ok(()));

        let service = mocks.into_service();
        service
            .change_owner(&user_id, &household_id)
            .await
            .expect("transfer succeeds");
    }

    #[tokio::test]
    async fn edit_household_with_no_fields_is_a_no_op() {
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, UserId::random(), 1))));
        mocks.households.expect_update_details().times(0);

        let service = mocks.into_service();
        service
            .edit_household(&household_id, EditHouseholdRequest::default())
            .await
            .expect("no-op edit succeeds");
    }

    #[tokio::test]
    async fn edit_household_applies_partial_update() {
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, UserId::random(), 1))));
        mocks
            .households
            .expect_update_details()
            .withf(|_, name, address| name.is_none() && *address == Some("9 Birch Lane"))
            .times(1)
            .return_once(|_, _, _| Ok(()));

        let service = mocks.into_service();
        service
            .edit_household(
                &household_id,
                EditHouseholdRequest {
                    name: None,
                    address: Some("9 Birch Lane".into()),
                },
            )
            .await
            .expect("partial edit succeeds");
    }

    #[tokio::test]
    async fn edit_household_rejects_renaming_to_a_taken_name() {
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, UserId::random(), 1))));
        mocks
            .households
            .expect_find_by_name()
            .times(1)
            .return_once(|_| Ok(Some(household(HouseholdId::random(), UserId::random(), 1))));
        mocks.households.expect_update_details().times(0);

        let service = mocks.into_service();
        let error = service
            .edit_household(
                &household_id,
                EditHouseholdRequest {
                    name: Some(HouseholdName::new("Jones").expect("valid name")),
                    address: None,
                },
            )
            .await
            .expect_err("taken name rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn details_require_a_household() {
        let user_id = UserId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, None))));

        let service = mocks.into_service();
        let error = service
            .household_details(&user_id)
            .await
            .expect_err("no household");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn details_aggregate_registered_and_unregistered_members() {
        let user_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, Some(household_id)))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, user_id, 2))));
        mocks
            .users
            .expect_list_by_household()
            .times(1)
            .return_once(move |_| Ok(vec![user(user_id, Some(household_id))]));
        mocks
            .members
            .expect_list_by_household()
            .times(1)
            .return_once(move |_| {
                Ok(vec![crate::domain::household::UnregisteredMember {
                    id: crate::domain::household::MemberId::random(),
                    full_name: PersonName::new("Baby Smith").expect("valid name"),
                    household_id,
                }])
            });

        let service = mocks.into_service();
        let details = service
            .household_details(&user_id)
            .await
            .expect("details load");

        assert_eq!(details.registered_members.len(), 1);
        assert_eq!(details.unregistered_members.len(), 1);
        assert_eq!(details.household.id, household_id);
    }

    #[tokio::test]
    async fn store_connection_failures_surface_as_service_unavailable() {
        let user_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, None))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, UserId::random(), 1))));
        mocks
            .store
            .expect_attach_user()
            .times(1)
            .return_once(|_, _, _| Err(MembershipStoreError::connection("refused")));

        let service = mocks.into_service();
        let error = service
            .add_user_to_household(&user_id, &household_id)
            .await
            .expect_err("connection failure surfaces");

        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn concurrent_move_of_the_same_user_surfaces_as_conflict() {
        let user_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(user_id, None))));
        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, UserId::random(), 1))));
        mocks
            .store
            .expect_attach_user()
            .times(1)
            .return_once(move |_, _, _| {
                Err(MembershipStoreError::stale_membership(user_id.to_string()))
            });
        mocks.notifications.expect_notify().times(0);

        let service = mocks.into_service();
        let error = service
            .add_user_to_household(&user_id, &household_id)
            .await
            .expect_err("losing racer surfaces the conflict");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }
}
