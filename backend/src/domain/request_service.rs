//! Membership-request service.
//!
//! Creates pending invitations and join requests and resolves them exactly
//! once. Accepting also moves the joining user into the household within the
//! same storage transaction; decline and cancel only flip the status.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Error;
use crate::domain::household::{Household, HouseholdId};
use crate::domain::membership_request::{
    MembershipRequest, RequestId, RequestKind, RequestStatus,
};
use crate::domain::notification::NotificationEvent;
use crate::domain::ports::{
    HouseholdRepository, MembershipRequestCommand, MembershipRequestQuery,
    MembershipRequestRepository, MembershipStore, NotificationSender, UserRepository,
};
use crate::domain::user::{User, UserId};

use super::household_service::{map_household_store_error, map_membership_store_error};
use super::store_errors::{map_request_store_error, map_user_store_error};

/// Membership-request service implementing the driving ports.
#[derive(Clone)]
pub struct MembershipRequestService<U, H, R, S, N> {
    users: Arc<U>,
    households: Arc<H>,
    requests: Arc<R>,
    store: Arc<S>,
    notifications: Arc<N>,
}

impl<U, H, R, S, N> MembershipRequestService<U, H, R, S, N> {
    /// Create a new service with the given collaborators.
    pub fn new(
        users: Arc<U>,
        households: Arc<H>,
        requests: Arc<R>,
        store: Arc<S>,
        notifications: Arc<N>,
    ) -> Self {
        Self {
            users,
            households,
            requests,
            store,
            notifications,
        }
    }
}

fn already_resolved() -> Error {
    Error::conflict("membership request already resolved")
}

impl<U, H, R, S, N> MembershipRequestService<U, H, R, S, N>
where
    U: UserRepository,
    H: HouseholdRepository,
    R: MembershipRequestRepository,
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

    async fn load_request(&self, request_id: &RequestId) -> Result<MembershipRequest, Error> {
        self.requests
            .find_by_id(request_id)
            .await
            .map_err(map_request_store_error)?
            .ok_or_else(|| Error::not_found("membership request not found"))
    }

    async fn create_pending(
        &self,
        request: MembershipRequest,
    ) -> Result<MembershipRequest, Error> {
        self.requests
            .insert(&request)
            .await
            .map_err(map_request_store_error)?;

        self.notifications
            .notify(
                &request.receiver_id,
                NotificationEvent::RequestReceived {
                    request_id: request.id,
                    household_id: request.household_id,
                    kind: request.kind,
                },
            )
            .await;
        Ok(request)
    }

    /// Resolve a pending request to a terminal state without membership side
    /// effects (decline, cancel).
    async fn resolve_only(
        &self,
        request_id: &RequestId,
        status: RequestStatus,
        notify: impl FnOnce(&MembershipRequest) -> UserId + Send,
    ) -> Result<(), Error> {
        let request = self.load_request(request_id).await?;
        if request.status.is_terminal() {
            return Err(already_resolved());
        }

        let transitioned = self
            .requests
            .resolve(&request.id, status)
            .await
            .map_err(map_request_store_error)?;
        if !transitioned {
            // Lost a race with a concurrent resolution.
            return Err(already_resolved());
        }

        self.notifications
            .notify(
                &notify(&request),
                NotificationEvent::RequestResolved {
                    request_id: request.id,
                    status,
                },
            )
            .await;
        Ok(())
    }
}

#[async_trait]
impl<U, H, R, S, N> MembershipRequestCommand for MembershipRequestService<U, H, R, S, N>
where
    U: UserRepository,
    H: HouseholdRepository,
    R: MembershipRequestRepository,
    S: MembershipStore,
    N: NotificationSender,
{
    async fn send_invitation(
        &self,
        receiver_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<MembershipRequest, Error> {
        let household = self.load_household(household_id).await?;
        let receiver = self.load_user(receiver_id).await?;

        let request = MembershipRequest::pending(
            household.id,
            household.owner_id,
            receiver.id,
            RequestKind::Invitation,
        );
        self.create_pending(request).await
    }

    async fn send_join_request(
        &self,
        sender_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<MembershipRequest, Error> {
        let household = self.load_household(household_id).await?;
        let sender = self.load_user(sender_id).await?;

        let request = MembershipRequest::pending(
            household.id,
            sender.id,
            household.owner_id,
            RequestKind::JoinRequest,
        );
        self.create_pending(request).await
    }

    async fn accept_request(&self, request_id: &RequestId) -> Result<(), Error> {
        let request = self.load_request(request_id).await?;
        if request.status.is_terminal() {
            return Err(already_resolved());
        }

        let joining = self.load_user(&request.joining_user()).await?;
        if joining.household_id == Some(request.household_id) {
            return Err(Error::conflict("user already belongs to this household"));
        }

        let transitioned = self
            .store
            .accept_request(
                &request.id,
                &joining.id,
                joining.household_id,
                &request.household_id,
            )
            .await
            .map_err(map_membership_store_error)?;
        if !transitioned {
            return Err(already_resolved());
        }

        self.notifications
            .notify(
                &request.sender_id,
                NotificationEvent::RequestResolved {
                    request_id: request.id,
                    status: RequestStatus::Accepted,
                },
            )
            .await;

        // The owner side of the request learns about the new member.
        let owner_id = match request.kind {
            RequestKind::Invitation => request.sender_id,
            RequestKind::JoinRequest => request.receiver_id,
        };
        if owner_id != joining.id {
            self.notifications
                .notify(
                    &owner_id,
                    NotificationEvent::MemberJoined {
                        household_id: request.household_id,
                        user_id: joining.id,
                    },
                )
                .await;
        }
        Ok(())
    }

    async fn decline_request(&self, request_id: &RequestId) -> Result<(), Error> {
        self.resolve_only(request_id, RequestStatus::Rejected, |request| {
            request.sender_id
        })
        .await
    }

    async fn cancel_request(&self, request_id: &RequestId) -> Result<(), Error> {
        self.resolve_only(request_id, RequestStatus::Cancelled, |request| {
            request.receiver_id
        })
        .await
    }
}

#[async_trait]
impl<U, H, R, S, N> MembershipRequestQuery for MembershipRequestService<U, H, R, S, N>
where
    U: UserRepository,
    H: HouseholdRepository,
    R: MembershipRequestRepository,
    S: MembershipStore,
    N: NotificationSender,
{
    async fn received_invitations(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipRequest>, Error> {
        self.requests
            .list_received(user_id, RequestKind::Invitation, RequestStatus::Pending)
            .await
            .map_err(map_request_store_error)
    }

    async fn pending_join_requests(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<MembershipRequest>, Error> {
        self.requests
            .list_for_household(household_id, RequestKind::JoinRequest, RequestStatus::Pending)
            .await
            .map_err(map_request_store_error)
    }

    async fn accepted_join_requests(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<MembershipRequest>, Error> {
        self.requests
            .list_for_household(
                household_id,
                RequestKind::JoinRequest,
                RequestStatus::Accepted,
            )
            .await
            .map_err(map_request_store_error)
    }

    async fn sent_pending_requests(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<MembershipRequest>, Error> {
        let mut sent = self
            .requests
            .list_sent(user_id, RequestKind::Invitation, RequestStatus::Pending)
            .await
            .map_err(map_request_store_error)?;
        let join_requests = self
            .requests
            .list_sent(user_id, RequestKind::JoinRequest, RequestStatus::Pending)
            .await
            .map_err(map_request_store_error)?;

        sent.extend(join_requests);
        sent.sort_by_key(|request| (request.created_at, *request.id.as_uuid()));
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::household::HouseholdName;
    use crate::domain::ports::{
        MockHouseholdRepository, MockMembershipRequestRepository, MockMembershipStore,
        MockNotificationSender, MockUserRepository,
    };
    use crate::domain::user::{EmailAddress, PersonName, Role};
    use chrono::{Duration, Utc};

    type Service = MembershipRequestService<
        MockUserRepository,
        MockHouseholdRepository,
        MockMembershipRequestRepository,
        MockMembershipStore,
        MockNotificationSender,
    >;

    struct Mocks {
        users: MockUserRepository,
        households: MockHouseholdRepository,
        requests: MockMembershipRequestRepository,
        store: MockMembershipStore,
        notifications: MockNotificationSender,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockUserRepository::new(),
                households: MockHouseholdRepository::new(),
                requests: MockMembershipRequestRepository::new(),
                store: MockMembershipStore::new(),
                notifications: MockNotificationSender::new(),
            }
        }

        fn into_service(self) -> Service {
            MembershipRequestService::new(
                Arc::new(self.users),
                Arc::new(self.households),
                Arc::new(self.requests),
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

    fn household(id: HouseholdId, owner_id: UserId) -> Household {
        Household {
            id,
            name: HouseholdName::new("Smiths").expect("valid name"),
            address: "1 Elm Street".into(),
            owner_id,
            number_of_members: 1,
        }
    }

    fn pending_invitation(
        household_id: HouseholdId,
        owner_id: UserId,
        receiver_id: UserId,
    ) -> MembershipRequest {
        MembershipRequest::pending(household_id, owner_id, receiver_id, RequestKind::Invitation)
    }

    #[tokio::test]
    async fn send_invitation_uses_the_owner_as_sender() {
        let owner_id = UserId::random();
        let receiver_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, owner_id))));
        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(receiver_id, None))));
        mocks
            .requests
            .expect_insert()
            .withf(move |request| {
                request.sender_id == owner_id
                    && request.receiver_id == receiver_id
                    && request.kind == RequestKind::Invitation
                    && request.status == RequestStatus::Pending
            })
            .times(1)
            .return_once(|_| Ok(()));
        mocks
            .notifications
            .expect_notify()
            .withf(move |recipient, event| {
                *recipient == receiver_id
                    && matches!(event, NotificationEvent::RequestReceived { .. })
            })
            .times(1)
            .return_once(|_, _| ());

        let request = mocks
            .into_service()
            .send_invitation(&receiver_id, &household_id)
            .await
            .expect("invitation created");

        assert_eq!(request.joining_user(), receiver_id);
    }

    #[tokio::test]
    async fn send_join_request_targets_the_owner() {
        let owner_id = UserId::random();
        let sender_id = UserId::random();
        let household_id = HouseholdId::random();
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(household(household_id, owner_id))));
        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(sender_id, None))));
        mocks
            .requests
            .expect_insert()
            .withf(move |request| {
                request.sender_id == sender_id
                    && request.receiver_id == owner_id
                    && request.kind == RequestKind::JoinRequest
            })
            .times(1)
            .return_once(|_| Ok(()));
        mocks
            .notifications
            .expect_notify()
            .withf(move |recipient, _| *recipient == owner_id)
            .times(1)
            .return_once(|_, _| ());

        let request = mocks
            .into_service()
            .send_join_request(&sender_id, &household_id)
            .await
            .expect("join request created");

        assert_eq!(request.joining_user(), sender_id);
    }

    #[tokio::test]
    async fn send_invitation_requires_an_existing_household() {
        let mut mocks = Mocks::new();

        mocks
            .households
            .expect_find_by_id()
            .times(1)
            .return_once(|_| Ok(None));
        mocks.requests.expect_insert().times(0);

        let error = mocks
            .into_service()
            .send_invitation(&UserId::random(), &HouseholdId::random())
            .await
            .expect_err("missing household rejected");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn accept_moves_the_joining_user_and_notifies_both_sides() {
        let owner_id = UserId::random();
        let receiver_id = UserId::random();
        let household_id = HouseholdId::random();
        let request = pending_invitation(household_id, owner_id, receiver_id);
        let request_id = request.id;
        let mut mocks = Mocks::new();

        mocks
            .requests
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(request)));
        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(receiver_id, None))));
        mocks
            .store
            .expect_accept_request()
            .withf(move |rid, uid, previous, target| {
                *rid == request_id
                    && *uid == receiver_id
                    && previous.is_none()
                    && *target == household_id
            })
            .times(1)
            .return_once(|_, _, _, _| Ok(true));
        mocks.notifications.expect_notify().times(2).returning(|_, _| ());

        mocks
            .into_service()
            .accept_request(&request_id)
            .await
            .expect("acceptance succeeds");
    }

    #[tokio::test]
    async fn accept_rejects_resolved_requests() {
        let mut request = pending_invitation(
            HouseholdId::random(),
            UserId::random(),
            UserId::random(),
        );
        request.status = RequestStatus::Rejected;
        let request_id = request.id;
        let mut mocks = Mocks::new();

        mocks
            .requests
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(request)));
        mocks.store.expect_accept_request().times(0);

        let error = mocks
            .into_service()
            .accept_request(&request_id)
            .await
            .expect_err("terminal state rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn accept_surfaces_lost_races_as_conflict() {
        let receiver_id = UserId::random();
        let request = pending_invitation(HouseholdId::random(), UserId::random(), receiver_id);
        let request_id = request.id;
        let mut mocks = Mocks::new();

        mocks
            .requests
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(request)));
        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(receiver_id, None))));
        mocks
            .store
            .expect_accept_request()
            .times(1)
            .return_once(|_, _, _, _| Ok(false));

        let error = mocks
            .into_service()
            .accept_request(&request_id)
            .await
            .expect_err("lost race rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn accept_rejects_users_already_in_the_household() {
        let receiver_id = UserId::random();
        let household_id = HouseholdId::random();
        let request = pending_invitation(household_id, UserId::random(), receiver_id);
        let request_id = request.id;
        let mut mocks = Mocks::new();

        mocks
            .requests
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(request)));
        mocks
            .users
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(user(receiver_id, Some(household_id)))));
        mocks.store.expect_accept_request().times(0);

        let error = mocks
            .into_service()
            .accept_request(&request_id)
            .await
            .expect_err("existing member rejected");

        assert_eq!(error.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn decline_flips_status_without_membership_changes() {
        let sender_id = UserId::random();
        let request = MembershipRequest::pending(
            HouseholdId::random(),
            sender_id,
            UserId::random(),
            RequestKind::JoinRequest,
        );
        let request_id = request.id;
        let mut mocks = Mocks::new();

        mocks
            .requests
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(request)));
        mocks
            .requests
            .expect_resolve()
            .withf(move |rid, status| *rid == request_id && *status == RequestStatus::Rejected)
            .times(1)
            .return_once(|_, _| Ok(true));
        mocks.store.expect_accept_request().times(0);
        mocks.store.expect_attach_user().times(0);
        mocks
            .notifications
            .expect_notify()
            .withf(move |recipient, event| {
                *recipient == sender_id
                    && matches!(
                        event,
                        NotificationEvent::RequestResolved {
                            status: RequestStatus::Rejected,
                            ..
                        }
                    )
            })
            .times(1)
            .return_once(|_, _| ());

        mocks
            .into_service()
            .decline_request(&request_id)
            .await
            .expect("decline succeeds");
    }

    #[tokio::test]
    async fn cancel_is_terminal_and_notifies_the_receiver() {
        let receiver_id = UserId::random();
        let request = MembershipRequest::pending(
            HouseholdId::random(),
            UserId::random(),
            receiver_id,
            RequestKind::Invitation,
        );
        let request_id = request.id;
        let mut mocks = Mocks::new();

        mocks
            .requests
            .expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(request)));
        mocks
            .requests
            .expect_resolve()
            .withf(move |_, status| *status == RequestStatus::Cancelled)
            .times(1)
            .return_once(|_, _| Ok(true));
        mocks
            .notifications
            .expect_notify()
            .withf(move |recipient, _| *recipient == receiver_id)
            .times(1)
            .return_once(|_, _| ());

        mocks
            .into_service()
            .cancel_request(&request_id)
            .await
            .expect("cancel succeeds");
    }

    #[tokio::test]
    async fn unknown_requests_are_not_found() {
        let mut mocks = Mocks::new();

        mocks
            .requests
            .expect_find_by_id()
            .times(1)
            .return_once(|_| Ok(None));

        let error = mocks
            .into_service()
            .decline_request(&RequestId::random())
            .await
            .expect_err("unknown request rejected");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn sent_pending_requests_merge_in_creation_order() {
        let sender_id = UserId::random();
        let mut earlier = MembershipRequest::pending(
            HouseholdId::random(),
            sender_id,
            UserId::random(),
            RequestKind::Invitation,
        );
        earlier.created_at = Utc::now() - Duration::minutes(5);
        let later = MembershipRequest::pending(
            HouseholdId::random(),
            sender_id,
            UserId::random(),
            RequestKind::JoinRequest,
        );
        let earlier_id = earlier.id;
        let later_id = later.id;
        let mut mocks = Mocks::new();

        mocks
            .requests
            .expect_list_sent()
            .withf(|_, kind, _| *kind == RequestKind::Invitation)
            .times(1)
            .return_once(move |_, _, _| Ok(vec![earlier]));
        mocks
            .requests
            .expect_list_sent()
            .withf(|_, kind, _| *kind == RequestKind::JoinRequest)
            .times(1)
            .return_once(move |_, _, _| Ok(vec![later]));

        let sent = mocks
            .into_service()
            .sent_pending_requests(&sender_id)
            .await
            .expect("list succeeds");

        let ids: Vec<_> = sent.iter().map(|request| request.id).collect();
        assert_eq!(ids, vec![earlier_id, later_id]);
    }
}
