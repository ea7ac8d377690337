//! Test utilities for the backend crate.
//!
//! Provides an in-memory implementation of every driven storage port plus a
//! recording notification sender, so service and HTTP integration tests can
//! exercise full flows without PostgreSQL. Compiled for tests and behind the
//! `test-support` feature.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::household::{Household, HouseholdId, HouseholdName, MemberId, UnregisteredMember};
use crate::domain::membership_request::{
    MembershipRequest, RequestId, RequestKind, RequestStatus,
};
use crate::domain::notification::NotificationEvent;
use crate::domain::ports::{
    HouseholdRepository, HouseholdStoreError, MemberStoreError, MembershipRequestRepository,
    MembershipStore, MembershipStoreError, NotificationSender, RequestStoreError,
    UnregisteredMemberRepository, UserRepository, UserStoreError,
};
use crate::domain::user::{PersonName, User, UserId};

#[derive(Default)]
struct StoreInner {
    users: HashMap<Uuid, User>,
    households: HashMap<Uuid, Household>,
    members: HashMap<Uuid, UnregisteredMember>,
    requests: HashMap<Uuid, MembershipRequest>,
}

/// In-memory store implementing all driven storage ports.
///
/// Mirrors the consistency rules the Diesel adapters enforce in SQL: unique
/// household names, per-household unique member names, guarded member-count
/// decrements, membership writes guarded on the expected previous
/// household, and compare-and-set request resolution.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registered user.
    pub fn insert_user(&self, user: User) {
        let mut inner = self.lock();
        inner.users.insert(*user.id.as_uuid(), user);
    }

    /// Snapshot a user.
    pub fn user(&self, id: &UserId) -> Option<User> {
        self.lock().users.get(id.as_uuid()).cloned()
    }

    /// Snapshot a household.
    pub fn household(&self, id: &HouseholdId) -> Option<Household> {
        self.lock().households.get(id.as_uuid()).cloned()
    }

    /// Snapshot a membership request.
    pub fn request(&self, id: &RequestId) -> Option<MembershipRequest> {
        self.lock().requests.get(id.as_uuid()).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }
}

fn adjust_count(
    households: &mut HashMap<Uuid, Household>,
    household_id: Uuid,
    delta: i64,
) -> Result<(), MembershipStoreError> {
    let household = households
        .get_mut(&household_id)
        .ok_or_else(|| MembershipStoreError::query(format!("household not found: {household_id}")))?;
    let next = i64::from(household.number_of_members) + delta;
    if next < 0 {
        return Err(MembershipStoreError::count_underflow(
            household_id.to_string(),
        ));
    }
    #[expect(clippy::cast_sign_loss, reason = "checked non-negative above")]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "counts stay far below u32::MAX"
    )]
    {
        household.number_of_members = next as u32;
    }
    Ok(())
}

fn set_membership_guarded(
    inner: &mut StoreInner,
    user_id: &UserId,
    expected: Option<HouseholdId>,
    target: Option<HouseholdId>,
) -> Result<(), MembershipStoreError> {
    let user = inner
        .users
        .get_mut(user_id.as_uuid())
        .ok_or_else(|| MembershipStoreError::query(format!("user not found: {user_id}")))?;
    if user.household_id != expected {
        return Err(MembershipStoreError::stale_membership(user_id.to_string()));
    }
    user.household_id = target;
    Ok(())
}

fn move_user_in_memory(
    inner: &mut StoreInner,
    user_id: &UserId,
    previous: Option<HouseholdId>,
    target: &HouseholdId,
) -> Result<(), MembershipStoreError> {
    set_membership_guarded(inner, user_id, previous, Some(*target))?;
    if let Some(previous_id) = previous {
        adjust_count(&mut inner.households, *previous_id.as_uuid(), -1)?;
    }
    adjust_count(&mut inner.households, *target.as_uuid(), 1)
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserStoreError> {
        Ok(self.lock().users.get(id.as_uuid()).cloned())
    }

    async fn list_by_household(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<User>, UserStoreError> {
        let mut users: Vec<User> = self
            .lock()
            .users
            .values()
            .filter(|user| user.household_id == Some(*household_id))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.full_name.as_ref().cmp(b.full_name.as_ref()));
        Ok(users)
    }
}

#[async_trait]
impl HouseholdRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        id: &HouseholdId,
    ) -> Result<Option<Household>, HouseholdStoreError> {
        Ok(self.lock().households.get(id.as_uuid()).cloned())
    }

    async fn find_by_name(
        &self,
        name: &HouseholdName,
    ) -> Result<Option<Household>, HouseholdStoreError> {
        Ok(self
            .lock()
            .households
            .values()
            .find(|household| household.name.as_ref() == name.as_ref())
            .cloned())
    }

    async fn update_details<'a>(
        &self,
        id: &HouseholdId,
        name: Option<&'a HouseholdName>,
        address: Option<&'a str>,
    ) -> Result<(), HouseholdStoreError> {
        let mut inner = self.lock();
        if let Some(name) = name {
            let clash = inner.households.values().any(|household| {
                household.id != *id && household.name.as_ref() == name.as_ref()
            });
            if clash {
                return Err(HouseholdStoreError::duplicate_name(name.as_ref()));
            }
        }
        let household = inner
            .households
            .get_mut(id.as_uuid())
            .ok_or_else(|| HouseholdStoreError::query("household not found for update"))?;
        if let Some(name) = name {
            household.name = name.clone();
        }
        if let Some(address) = address {
            household.address = address.to_owned();
        }
        Ok(())
    }

    async fn set_owner(
        &self,
        id: &HouseholdId,
        owner_id: &UserId,
    ) -> Result<(), HouseholdStoreError> {
        let mut inner = self.lock();
        let household = inner
            .households
            .get_mut(id.as_uuid())
            .ok_or_else(|| HouseholdStoreError::query("household not found for update"))?;
        household.owner_id = *owner_id;
        Ok(())
    }
}

#[async_trait]
impl UnregisteredMemberRepository for InMemoryStore {
    async fn find_by_id(
        &self,
        id: &MemberId,
    ) -> Result<Option<UnregisteredMember>, MemberStoreError> {
        Ok(self.lock().members.get(id.as_uuid()).cloned())
    }

    async fn find_by_name_and_household(
        &self,
        name: &PersonName,
        household_id: &HouseholdId,
    ) -> Result<Option<UnregisteredMember>, MemberStoreError> {
        Ok(self
            .lock()
            .members
            .values()
            .find(|member| {
                member.household_id == *household_id && member.full_name.as_ref() == name.as_ref()
            })
            .cloned())
    }

    async fn list_by_household(
        &self,
        household_id: &HouseholdId,
    ) -> Result<Vec<UnregisteredMember>, MemberStoreError> {
        let mut members: Vec<UnregisteredMember> = self
            .lock()
            .members
            .values()
            .filter(|member| member.household_id == *household_id)
            .cloned()
            .collect();
        members.sort_by(|a, b| a.full_name.as_ref().cmp(b.full_name.as_ref()));
        Ok(members)
    }

    async fn rename(&self, id: &MemberId, name: &PersonName) -> Result<(), MemberStoreError> {
        let mut inner = self.lock();
        let household_id = inner
            .members
            .get(id.as_uuid())
            .map(|member| member.household_id)
            .ok_or_else(|| MemberStoreError::query("member not found for rename"))?;
        let clash = inner.members.values().any(|member| {
            member.id != *id
                && member.household_id == household_id
                && member.full_name.as_ref() == name.as_ref()
        });
        if clash {
            return Err(MemberStoreError::duplicate_member(name.as_ref()));
        }
        if let Some(member) = inner.members.get_mut(id.as_uuid()) {
            member.full_name = name.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipRequestRepository for InMemoryStore {
    async fn insert(&self, request: &MembershipRequest) -> Result<(), RequestStoreError> {
        let mut inner = self.lock();
        inner.requests.insert(*request.id.as_uuid(), request.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &RequestId,
    ) -> Result<Option<MembershipRequest>, RequestStoreError> {
        Ok(self.lock().requests.get(id.as_uuid()).cloned())
    }

    async fn resolve(
        &self,
        id: &RequestId,
        status: RequestStatus,
    ) -> Result<bool, RequestStoreError> {
        let mut inner = self.lock();
        match inner.requests.get_mut(id.as_uuid()) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = status;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_received(
        &self,
        receiver_id: &UserId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError> {
        Ok(self.filter_requests(|request| request.receiver_id == *receiver_id, kind, status))
    }

    async fn list_sent(
        &self,
        sender_id: &UserId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError> {
        Ok(self.filter_requests(|request| request.sender_id == *sender_id, kind, status))
    }

    async fn list_for_household(
        &self,
        household_id: &HouseholdId,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Result<Vec<MembershipRequest>, RequestStoreError> {
        Ok(self.filter_requests(
            |request| request.household_id == *household_id,
            kind,
            status,
        ))
    }
}

impl InMemoryStore {
    fn filter_requests(
        &self,
        select: impl Fn(&MembershipRequest) -> bool,
        kind: RequestKind,
        status: RequestStatus,
    ) -> Vec<MembershipRequest> {
        let mut requests: Vec<MembershipRequest> = self
            .lock()
            .requests
            .values()
            .filter(|request| select(request) && request.kind == kind && request.status == status)
            .cloned()
            .collect();
        requests.sort_by_key(|request| request.created_at);
        requests
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn create_household(
        &self,
        household: &Household,
        previous: Option<HouseholdId>,
    ) -> Result<(), MembershipStoreError> {
        let mut inner = self.lock();
        let clash = inner
            .households
            .values()
            .any(|existing| existing.name.as_ref() == household.name.as_ref());
        if clash {
            return Err(MembershipStoreError::duplicate_name(household.name.as_ref()));
        }
        set_membership_guarded(&mut inner, &household.owner_id, previous, Some(household.id))?;
        inner
            .households
            .insert(*household.id.as_uuid(), household.clone());
        if let Some(previous_id) = previous {
            adjust_count(&mut inner.households, *previous_id.as_uuid(), -1)?;
        }
        Ok(())
    }

    async fn attach_user(
        &self,
        user_id: &UserId,
        previous: Option<HouseholdId>,
        target: &HouseholdId,
    ) -> Result<(), MembershipStoreError> {
        let mut inner = self.lock();
        move_user_in_memory(&mut inner, user_id, previous, target)
    }

    async fn detach_user(
        &self,
        user_id: &UserId,
        household_id: &HouseholdId,
    ) -> Result<(), MembershipStoreError> {
        let mut inner = self.lock();
        set_membership_guarded(&mut inner, user_id, Some(*household_id), None)?;
        adjust_count(&mut inner.households, *household_id.as_uuid(), -1)
    }

    async fn insert_unregistered(
        &self,
        member: &UnregisteredMember,
    ) -> Result<(), MembershipStoreError> {
        let mut inner = self.lock();
        let clash = inner.members.values().any(|existing| {
            existing.household_id == member.household_id
                && existing.full_name.as_ref() == member.full_name.as_ref()
        });
        if clash {
            return Err(MembershipStoreError::duplicate_member(
                member.full_name.as_ref(),
            ));
        }
        inner.members.insert(*member.id.as_uuid(), member.clone());
        adjust_count(&mut inner.households, *member.household_id.as_uuid(), 1)
    }

    async fn delete_unregistered(
        &self,
        member_id: &MemberId,
        household_id: &HouseholdId,
    ) -> Result<(), MembershipStoreError> {
        let mut inner = self.lock();
        inner
            .members
            .remove(member_id.as_uuid())
            .ok_or_else(|| {
                MembershipStoreError::query(format!("unregistered member not found: {member_id}"))
            })?;
        adjust_count(&mut inner.households, *household_id.as_uuid(), -1)
    }

    async fn accept_request(
        &self,
        request_id: &RequestId,
        user_id: &UserId,
        previous: Option<HouseholdId>,
        target: &HouseholdId,
    ) -> Result<bool, MembershipStoreError> {
        let mut inner = self.lock();
        match inner.requests.get_mut(request_id.as_uuid()) {
            Some(request) if request.status == RequestStatus::Pending => {
                request.status = RequestStatus::Accepted;
            }
            _ => return Ok(false),
        }
        move_user_in_memory(&mut inner, user_id, previous, target)?;
        Ok(true)
    }
}

/// Notification sender that records every delivered event.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(UserId, NotificationEvent)>>,
}

impl RecordingNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the recorded events in delivery order.
    pub fn events(&self) -> Vec<(UserId, NotificationEvent)> {
        self.events
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn notify(&self, recipient: &UserId, event: NotificationEvent) {
        self.events
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .push((*recipient, event));
    }
}
