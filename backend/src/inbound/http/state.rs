//! Shared HTTP adapter state.
//!
//! Handlers receive this state via `actix_web::web::Data` so they depend on
//! domain ports (use-cases), not concrete services, and stay testable
//! without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    HouseholdCommand, HouseholdQuery, MembershipRequestCommand, MembershipRequestQuery,
    UnregisteredMemberCommand,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub households: Arc<dyn HouseholdCommand>,
    pub household_query: Arc<dyn HouseholdQuery>,
    pub members: Arc<dyn UnregisteredMemberCommand>,
    pub requests: Arc<dyn MembershipRequestCommand>,
    pub request_query: Arc<dyn MembershipRequestQuery>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    pub fn new(
        households: Arc<dyn HouseholdCommand>,
        household_query: Arc<dyn HouseholdQuery>,
        members: Arc<dyn UnregisteredMemberCommand>,
        requests: Arc<dyn MembershipRequestCommand>,
        request_query: Arc<dyn MembershipRequestQuery>,
    ) -> Self {
        Self {
            households,
            household_query,
            members,
            requests,
            request_query,
        }
    }
}
