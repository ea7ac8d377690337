//! Membership-request HTTP handlers.
//!
//! ```text
//! POST /api/v1/membership-requests/invitations
//! POST /api/v1/membership-requests/join-requests
//! POST /api/v1/membership-requests/{request_id}/accept
//! POST /api/v1/membership-requests/{request_id}/decline
//! POST /api/v1/membership-requests/{request_id}/cancel
//! GET  /api/v1/users/{user_id}/invitations
//! GET  /api/v1/users/{user_id}/membership-requests/sent
//! GET  /api/v1/households/{household_id}/join-requests
//! GET  /api/v1/households/{household_id}/join-requests/accepted
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::household::HouseholdId;
use crate::domain::membership_request::{MembershipRequest, RequestId};
use crate::domain::user::UserId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::missing_field_error;

/// Request payload for sending an invitation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendInvitationBody {
    pub receiver_id: Option<Uuid>,
    pub household_id: Option<Uuid>,
}

/// Request payload for sending a join request.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendJoinRequestBody {
    pub sender_id: Option<Uuid>,
    pub household_id: Option<Uuid>,
}

/// Response payload for a membership request.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequestResponse {
    pub id: Uuid,
    pub household_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub kind: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<MembershipRequest> for MembershipRequestResponse {
    fn from(value: MembershipRequest) -> Self {
        Self {
            id: *value.id.as_uuid(),
            household_id: *value.household_id.as_uuid(),
            sender_id: *value.sender_id.as_uuid(),
            receiver_id: *value.receiver_id.as_uuid(),
            kind: value.kind.to_string(),
            status: value.status.to_string(),
            created_at: value.created_at,
        }
    }
}

fn list_response(requests: Vec<MembershipRequest>) -> HttpResponse {
    let payload: Vec<MembershipRequestResponse> = requests
        .into_iter()
        .map(MembershipRequestResponse::from)
        .collect();
    HttpResponse::Ok().json(payload)
}

/// Invite a user into a household. The household owner is the sender.
#[utoipa::path(
    post,
    path = "/api/v1/membership-requests/invitations",
    request_body = SendInvitationBody,
    responses(
        (status = 201, description = "Invitation created", body = MembershipRequestResponse),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 404, description = "User or household not found", body = crate::domain::Error)
    ),
    tags = ["membership-requests"],
    operation_id = "sendInvitation"
)]
#[post("/membership-requests/invitations")]
pub async fn send_invitation(
    state: web::Data<HttpState>,
    body: web::Json<SendInvitationBody>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let receiver_id = body
        .receiver_id
        .ok_or_else(|| missing_field_error("receiverId"))?;
    let household_id = body
        .household_id
        .ok_or_else(|| missing_field_error("householdId"))?;

    let request = state
        .requests
        .send_invitation(
            &UserId::from_uuid(receiver_id),
            &HouseholdId::from_uuid(household_id),
        )
        .await?;
    Ok(HttpResponse::Created().json(MembershipRequestResponse::from(request)))
}

/// Ask to join a household. The household owner is the receiver.
#[utoipa::path(
    post,
    path = "/api/v1/membership-requests/join-requests",
    request_body = SendJoinRequestBody,
    responses(
        (status = 201, description = "Join request created", body = MembershipRequestResponse),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 404, description = "User or household not found", body = crate::domain::Error)
    ),
    tags = ["membership-requests"],
    operation_id = "sendJoinRequest"
)]
#[post("/membership-requests/join-requests")]
pub async fn send_join_request(
    state: web::Data<HttpState>,
    body: web::Json<SendJoinRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let sender_id = body
        .sender_id
        .ok_or_else(|| missing_field_error("senderId"))?;
    let household_id = body
        .household_id
        .ok_or_else(|| missing_field_error("householdId"))?;

    let request = state
        .requests
        .send_join_request(
            &UserId::from_uuid(sender_id),
            &HouseholdId::from_uuid(household_id),
        )
        .await?;
    Ok(HttpResponse::Created().json(MembershipRequestResponse::from(request)))
}

/// Accept a pending request, moving the joining user into the household.
#[utoipa::path(
    post,
    path = "/api/v1/membership-requests/{request_id}/accept",
    params(("request_id" = Uuid, Path, description = "Request identifier")),
    responses(
        (status = 204, description = "Request accepted"),
        (status = 404, description = "Request not found", body = crate::domain::Error),
        (status = 409, description = "Request already resolved", body = crate::domain::Error)
    ),
    tags = ["membership-requests"],
    operation_id = "acceptMembershipRequest"
)]
#[post("/membership-requests/{request_id}/accept")]
pub async fn accept_request(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let request_id = RequestId::from_uuid(path.into_inner());
    state.requests.accept_request(&request_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Decline a pending request without membership changes.
#[utoipa::path(
    post,
    path = "/api/v1/membership-requests/{request_id}/decline",
    params(("request_id" = Uuid, Path, description = "Request identifier")),
    responses(
        (status = 204, description = "Request declined"),
        (status = 404, description = "Request not found", body = crate::domain::Error),
        (status = 409, description = "Request already resolved", body = crate::domain::Error)
    ),
    tags = ["membership-requests"],
    operation_id = "declineMembershipRequest"
)]
#[post("/membership-requests/{request_id}/decline")]
pub async fn decline_request(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let request_id = RequestId::from_uuid(path.into_inner());
    state.requests.decline_request(&request_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Withdraw a pending request; sender-initiated and terminal.
#[utoipa::path(
    post,
    path = "/api/v1/membership-requests/{request_id}/cancel",
    params(("request_id" = Uuid, Path, description = "Request identifier")),
    responses(
        (status = 204, description = "Request cancelled"),
        (status = 404, description = "Request not found", body = crate::domain::Error),
        (status = 409, description = "Request already resolved", body = crate::domain::Error)
    ),
    tags = ["membership-requests"],
    operation_id = "cancelMembershipRequest"
)]
#[post("/membership-requests/{request_id}/cancel")]
pub async fn cancel_request(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let request_id = RequestId::from_uuid(path.into_inner());
    state.requests.cancel_request(&request_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Pending invitations addressed to a user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/invitations",
    params(("user_id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Pending invitations", body = [MembershipRequestResponse])
    ),
    tags = ["membership-requests"],
    operation_id = "listReceivedInvitations"
)]
#[get("/users/{user_id}/invitations")]
pub async fn received_invitations(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user_id = UserId::from_uuid(path.into_inner());
    let requests = state.request_query.received_invitations(&user_id).await?;
    Ok(list_response(requests))
}

/// Pending requests of either kind sent by a user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/membership-requests/sent",
    params(("user_id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Pending sent requests", body = [MembershipRequestResponse])
    ),
    tags = ["membership-requests"],
    operation_id = "listSentRequests"
)]
#[get("/users/{user_id}/membership-requests/sent")]
pub async fn sent_requests(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user_id = UserId::from_uuid(path.into_inner());
    let requests = state.request_query.sent_pending_requests(&user_id).await?;
    Ok(list_response(requests))
}

/// Pending join requests targeting a household.
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/join-requests",
    params(("household_id" = Uuid, Path, description = "Household identifier")),
    responses(
        (status = 200, description = "Pending join requests", body = [MembershipRequestResponse])
    ),
    tags = ["membership-requests"],
    operation_id = "listPendingJoinRequests"
)]
#[get("/households/{household_id}/join-requests")]
pub async fn pending_join_requests(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let household_id = HouseholdId::from_uuid(path.into_inner());
    let requests = state
        .request_query
        .pending_join_requests(&household_id)
        .await?;
    Ok(list_response(requests))
}

/// Join requests for a household that were accepted.
#[utoipa::path(
    get,
    path = "/api/v1/households/{household_id}/join-requests/accepted",
    params(("household_id" = Uuid, Path, description = "Household identifier")),
    responses(
        (status = 200, description = "Accepted join requests", body = [MembershipRequestResponse])
    ),
    tags = ["membership-requests"],
    operation_id = "listAcceptedJoinRequests"
)]
#[get("/households/{household_id}/join-requests/accepted")]
pub async fn accepted_join_requests(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let household_id = HouseholdId::from_uuid(path.into_inner());
    let requests = state
        .request_query
        .accepted_join_requests(&household_id)
        .await?;
    Ok(list_response(requests))
}
