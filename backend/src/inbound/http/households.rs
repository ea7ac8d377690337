//! Household lifecycle HTTP handlers.
//!
//! ```text
//! POST   /api/v1/households
//! GET    /api/v1/users/{user_id}/household
//! POST   /api/v1/households/{household_id}/members/{user_id}
//! DELETE /api/v1/users/{user_id}/household
//! PUT    /api/v1/households/{household_id}/owner
//! PATCH  /api/v1/households/{household_id}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::household::{
    Household, HouseholdDetails, HouseholdId, MemberProfile, UnregisteredMember,
};
use crate::domain::ports::{CreateHouseholdRequest, EditHouseholdRequest};
use crate::domain::user::UserId;
use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{missing_field_error, parse_household_name};

/// Request payload for creating a household.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHouseholdBody {
    pub name: Option<String>,
    pub address: Option<String>,
    pub owner_id: Option<Uuid>,
}

/// Request payload for partially updating a household.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditHouseholdBody {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Request payload for transferring ownership.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeOwnerBody {
    pub owner_id: Option<Uuid>,
}

/// Response payload for a household.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub owner_id: Uuid,
    pub number_of_members: u32,
}

impl From<Household> for HouseholdResponse {
    fn from(value: Household) -> Self {
        Self {
            id: *value.id.as_uuid(),
            name: value.name.into(),
            address: value.address,
            owner_id: *value.owner_id.as_uuid(),
            number_of_members: value.number_of_members,
        }
    }
}

/// Response payload for a registered member, credentials excluded.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub confirmed: bool,
}

impl From<MemberProfile> for MemberProfileResponse {
    fn from(value: MemberProfile) -> Self {
        Self {
            id: *value.id.as_uuid(),
            email: value.email.as_ref().to_owned(),
            full_name: value.full_name.as_ref().to_owned(),
            role: value.role.to_string(),
            confirmed: value.confirmed,
        }
    }
}

/// Response payload for an unregistered member.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnregisteredMemberResponse {
    pub id: Uuid,
    pub full_name: String,
    pub household_id: Uuid,
}

impl From<UnregisteredMember> for UnregisteredMemberResponse {
    fn from(value: UnregisteredMember) -> Self {
        Self {
            id: *value.id.as_uuid(),
            full_name: value.full_name.as_ref().to_owned(),
            household_id: *value.household_id.as_uuid(),
        }
    }
}

/// Response payload for the aggregated household view.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdDetailsResponse {
    pub household: HouseholdResponse,
    pub registered_members: Vec<MemberProfileResponse>,
    pub unregistered_members: Vec<UnregisteredMemberResponse>,
}

impl From<HouseholdDetails> for HouseholdDetailsResponse {
    fn from(value: HouseholdDetails) -> Self {
        Self {
            household: value.household.into(),
            registered_members: value
                .registered_members
                .into_iter()
                .map(MemberProfileResponse::from)
                .collect(),
            unregistered_members: value
                .unregistered_members
                .into_iter()
                .map(UnregisteredMemberResponse::from)
                .collect(),
        }
    }
}

fn parse_create_body(body: CreateHouseholdBody) -> Result<CreateHouseholdRequest, Error> {
    let name = body.name.ok_or_else(|| missing_field_error("name"))?;
    let address = body.address.ok_or_else(|| missing_field_error("address"))?;
    let owner_id = body.owner_id.ok_or_else(|| missing_field_error("ownerId"))?;

    Ok(CreateHouseholdRequest {
        name: parse_household_name(name, "name")?,
        address,
        owner_id: UserId::from_uuid(owner_id),
    })
}

fn parse_edit_body(body: EditHouseholdBody) -> Result<EditHouseholdRequest, Error> {
    let name = body
        .name
        .map(|name| parse_household_name(name, "name"))
        .transpose()?;

    Ok(EditHouseholdRequest {
        name,
        address: body.address,
    })
}

/// Create a household with the given owner as its first member.
#[utoipa::path(
    post,
    path = "/api/v1/households",
    request_body = CreateHouseholdBody,
    responses(
        (status = 201, description = "Household created", body = HouseholdResponse),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 404, description = "Owner not found", body = crate::domain::Error),
        (status = 409, description = "Household name already in use", body = crate::domain::Error),
        (status = 503, description = "Service unavailable", body = crate::domain::Error)
    ),
    tags = ["households"],
    operation_id = "createHousehold"
)]
#[post("/households")]
pub async fn create_household(
    state: web::Data<HttpState>,
    body: web::Json<CreateHouseholdBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_create_body(body.into_inner())?;
    let household = state.households.create_household(request).await?;
    Ok(HttpResponse::Created().json(HouseholdResponse::from(household)))
}

/// Fetch the household a user belongs to, with both member lists.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/household",
    params(("user_id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Household details", body = HouseholdDetailsResponse),
        (status = 404, description = "User or household not found", body = crate::domain::Error)
    ),
    tags = ["households"],
    operation_id = "getHouseholdDetails"
)]
#[get("/users/{user_id}/household")]
pub async fn household_details(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user_id = UserId::from_uuid(path.into_inner());
    let details = state.household_query.household_details(&user_id).await?;
    Ok(HttpResponse::Ok().json(HouseholdDetailsResponse::from(details)))
}

/// Move a user into a household, leaving their current one if any.
#[utoipa::path(
    post,
    path = "/api/v1/households/{household_id}/members/{user_id}",
    params(
        ("household_id" = Uuid, Path, description = "Target household"),
        ("user_id" = Uuid, Path, description = "User to add")
    ),
    responses(
        (status = 204, description = "User added"),
        (status = 404, description = "User or household not found", body = crate::domain::Error),
        (status = 409, description = "User already a member", body = crate::domain::Error)
    ),
    tags = ["households"],
    operation_id = "addUserToHousehold"
)]
#[post("/households/{household_id}/members/{user_id}")]
pub async fn add_user(
    state: web::Data<HttpState>,
    path: web::Path<(Uuid, Uuid)>,
) -> ApiResult<HttpResponse> {
    let (household_id, user_id) = path.into_inner();
    state
        .households
        .add_user_to_household(
            &UserId::from_uuid(user_id),
            &HouseholdId::from_uuid(household_id),
        )
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Remove a user from their current household.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/household",
    params(("user_id" = Uuid, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User removed"),
        (status = 404, description = "User not found", body = crate::domain::Error),
        (status = 409, description = "User has no household", body = crate::domain::Error)
    ),
    tags = ["households"],
    operation_id = "removeUserFromHousehold"
)]
#[delete("/users/{user_id}/household")]
pub async fn remove_user(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let user_id = UserId::from_uuid(path.into_inner());
    state.households.remove_user_from_household(&user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Transfer household ownership to another current member.
#[utoipa::path(
    put,
    path = "/api/v1/households/{household_id}/owner",
    params(("household_id" = Uuid, Path, description = "Household identifier")),
    request_body = ChangeOwnerBody,
    responses(
        (status = 204, description = "Ownership transferred"),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 404, description = "Household or user not found", body = crate::domain::Error),
        (status = 409, description = "Not a member, or already the owner", body = crate::domain::Error)
    ),
    tags = ["households"],
    operation_id = "changeHouseholdOwner"
)]
#[put("/households/{household_id}/owner")]
pub async fn change_owner(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
    body: web::Json<ChangeOwnerBody>,
) -> ApiResult<HttpResponse> {
    let household_id = HouseholdId::from_uuid(path.into_inner());
    let owner_id = body
        .into_inner()
        .owner_id
        .ok_or_else(|| missing_field_error("ownerId"))?;
    state
        .households
        .change_owner(&UserId::from_uuid(owner_id), &household_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Partially update household name and address.
#[utoipa::path(
    patch,
    path = "/api/v1/households/{household_id}",
    params(("household_id" = Uuid, Path, description = "Household identifier")),
    request_body = EditHouseholdBody,
    responses(
        (status = 204, description = "Household updated"),
        (status = 400, description = "Invalid request", body = crate::domain::Error),
        (status = 404, description = "Household not found", body = crate::domain::Error),
        (status = 409, description = "Household name already in use", body = crate::domain::Error)
    ),
    tags = ["households"],
    operation_id = "editHousehold"
)]
#[patch("/households/{household_id}")]
pub async fn edit_household(
    state: web::Data<HttpState>,
    path: web::Path<Uuid>,
    body: web::Json<EditHouseholdBody>,
) -> ApiResult<HttpResponse> {
    let household_id = HouseholdId::from_uuid(path.into_inner());
    let request = parse_edit_body(body.into_inner())?;
    state.households.edit_household(&household_id, request).await?;
    Ok(HttpResponse::NoContent().finish())
}
