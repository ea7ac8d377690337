//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST API: all
//! membership endpoints, the health probes, and the shared error schema.
//! Swagger UI serves the document in debug builds.

use utoipa::OpenApi;

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::households::{
    CreateHouseholdBody, EditHouseholdBody, ChangeOwnerBody, HouseholdDetailsResponse,
    HouseholdResponse, MemberProfileResponse, UnregisteredMemberResponse,
};
use crate::inbound::http::membership_requests::{
    MembershipRequestResponse, SendInvitationBody, SendJoinRequestBody,
};
use crate::inbound::http::unregistered_members::{AddMemberBody, EditMemberBody};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hearth membership API",
        description = "Household membership: households, members, invitations, and join requests."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::households::create_household,
        crate::inbound::http::households::household_details,
        crate::inbound::http::households::add_user,
        crate::inbound::http::households::remove_user,
        crate::inbound::http::households::change_owner,
        crate::inbound::http::households::edit_household,
        crate::inbound::http::unregistered_members::add_member,
        crate::inbound::http::unregistered_members::edit_member,
        crate::inbound::http::unregistered_members::remove_member,
        crate::inbound::http::membership_requests::send_invitation,
        crate::inbound::http::membership_requests::send_join_request,
        crate::inbound::http::membership_requests::accept_request,
        crate::inbound::http::membership_requests::decline_request,
        crate::inbound::http::membership_requests::cancel_request,
        crate::inbound::http::membership_requests::received_invitations,
        crate::inbound::http::membership_requests::sent_requests,
        crate::inbound::http::membership_requests::pending_join_requests,
        crate::inbound::http::membership_requests::accepted_join_requests,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        CreateHouseholdBody,
        EditHouseholdBody,
        ChangeOwnerBody,
        HouseholdResponse,
        MemberProfileResponse,
        UnregisteredMemberResponse,
        HouseholdDetailsResponse,
        AddMemberBody,
        EditMemberBody,
        SendInvitationBody,
        SendJoinRequestBody,
        MembershipRequestResponse,
    )),
    tags(
        (name = "households", description = "Household lifecycle and membership"),
        (name = "unregistered-members", description = "Occupants without accounts"),
        (name = "membership-requests", description = "Invitations and join requests"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_membership_path() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/v1/households",
            "/api/v1/users/{user_id}/household",
            "/api/v1/households/{household_id}/members/{user_id}",
            "/api/v1/households/{household_id}/owner",
            "/api/v1/households/{household_id}/unregistered-members",
            "/api/v1/unregistered-members/{member_id}",
            "/api/v1/membership-requests/invitations",
            "/api/v1/membership-requests/join-requests",
            "/api/v1/membership-requests/{request_id}/accept",
            "/api/v1/users/{user_id}/invitations",
            "/api/v1/households/{household_id}/join-requests",
            "/health/ready",
        ] {
            assert!(paths.contains_key(path), "missing path: {path}");
        }
    }
}
