//! Unregistered-member HTTP handlers.
//!
//! ```text
//! POST   /api/v1/households/{household_id}/unregistered-members
//! PATCH  /api/v1/unregistered-members/{member_id}
//! DELETE /api/v1/unregistered-members/{member_id}
//! ```

use actix_web::{HttpResponse, delete, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::household::{HouseholdId, MemberId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::households::UnregisteredMemberResponse;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{missing_field_error, parse_person_name};

/// Request payload for adding an unregistered member.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberBody {
    pub full_name: Option<String>,
}

/// Request payload for renaming an unregistered member.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditMemberBody {
    pub full_name: Option<String>,
}

/// Add a non-authenticating occupant to a household.
#[utoipa::path(
    post,
    path = "/api/v1/households/{household_id}/unregistered-members",
    params(("household_id" = Uuid, Path, description = "Household identifier")),
    request_body = AddMemberBody,
    responses(
        (status = 201, description = "Member added", body = UnregisteredMemberResponse),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 404, description = "Household not found", body = crate::domain::Error),
        (status = 409, description = "Name already used in this household", body = crate::domain::Error)
    ),
    tags = ["unregistered-members"],
    operation_id = "addUnregisteredMember"
)]
#[post("/households/{household_id}/unregistered-members")]
pub async fn add_member(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
    body: web::Json<AddMemberBody>,
) -> ApiResult<HttpResponse> {
    let household_id = HouseholdId::from_uuid(path.into_inner());
    let full_name = body
        .into_inner()
        .full_name
        .ok_or_else(|| missing_field_error("fullName"))?;
    let full_name = parse_person_name(full_name, "fullName")?;

    let member = state.members.add_member(&household_id, full_name).await?;
    Ok(HttpResponse::Created().json(UnregisteredMemberResponse::from(member)))
}

/// Rename an unregistered member. An absent name is a no-op.
#[utoipa::path(
    patch,
    path = "/api/v1/unregistered-members/{member_id}",
    params(("member_id" = Uuid, Path, description = "Member identifier")),
    request_body = EditMemberBody,
    responses(
        (status = 204, description = "Member updated"),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 404, description = "Member not found", body = crate::domain::Error),
        (status = 409, description = "Name already used in this household", body = crate::domain::Error)
    ),
    tags = ["unregistered-members"],
    operation_id = "editUnregisteredMember"
)]
#[patch("/unregistered-members/{member_id}")]
pub async fn edit_member(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
    body: web::Json<EditMemberBody>,
) -> ApiResult<HttpResponse> {
    let member_id = MemberId::from_uuid(path.into_inner());
    let full_name = body
        .into_inner()
        .full_name
        .map(|name| parse_person_name(name, "fullName"))
        .transpose()?;

    state.members.edit_member(&member_id, full_name).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remove an unregistered member from their household.
#[utoipa::path(
    delete,
    path = "/api/v1/unregistered-members/{member_id}",
    params(("member_id" = Uuid, Path, description = "Member identifier")),
    responses(
        (status = 204, description = "Member removed"),
        (status = 404, description = "Member not found", body = crate::domain::Error)
    ),
    tags = ["unregistered-members"],
    operation_id = "removeUnregisteredMember"
)]
#[delete("/unregistered-members/{member_id}")]
pub async fn remove_member(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let member_id = MemberId::from_uuid(path.into_inner());
    state.members.remove_member(&member_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
