//! Server construction and dependency wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::{HouseholdService, MembershipRequestService, UnregisteredMemberService};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{households, membership_requests, unregistered_members};
use crate::inbound::ws;
use crate::outbound::notify::NotificationHub;
use crate::outbound::persistence::{
    DbPool, DieselHouseholdRepository, DieselMembershipRequestRepository, DieselMembershipStore,
    DieselUnregisteredMemberRepository, DieselUserRepository,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Apply pending database migrations.
///
/// Runs over a dedicated synchronous connection before the async pool is
/// built, so the server never serves traffic against a stale schema.
pub fn run_migrations(database_url: &str) -> std::io::Result<()> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| std::io::Error::other(format!("database connection failed: {err}")))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| std::io::Error::other(format!("migration failed: {err}")))?;
    for migration in applied {
        info!(migration = %migration, "applied database migration");
    }
    Ok(())
}

/// Build the HTTP state with Diesel-backed services sharing one pool and one
/// notification hub.
pub fn build_http_state(pool: &DbPool, hub: Arc<NotificationHub>) -> HttpState {
    let users = Arc::new(DieselUserRepository::new(pool.clone()));
    let households = Arc::new(DieselHouseholdRepository::new(pool.clone()));
    let members = Arc::new(DieselUnregisteredMemberRepository::new(pool.clone()));
    let requests = Arc::new(DieselMembershipRequestRepository::new(pool.clone()));
    let store = Arc::new(DieselMembershipStore::new(pool.clone()));

    let household_service = Arc::new(HouseholdService::new(
        users.clone(),
        households.clone(),
        members.clone(),
        store.clone(),
        hub.clone(),
    ));
    let member_service = Arc::new(UnregisteredMemberService::new(
        households.clone(),
        members,
        store.clone(),
    ));
    let request_service = Arc::new(MembershipRequestService::new(
        users, households, requests, store, hub,
    ));

    HttpState::new(
        household_service.clone(),
        household_service,
        member_service,
        request_service.clone(),
        request_service,
    )
}

/// Assemble the application with all routes mounted.
///
/// Shared between the production entry-point and the HTTP integration tests
/// so both exercise the same routing table.
pub fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    hub: web::Data<NotificationHub>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1")
        .app_data(http_state)
        .service(households::create_household)
        .service(households::household_details)
        .service(households::add_user)
        .service(households::remove_user)
        .service(households::change_owner)
        .service(households::edit_household)
        .service(unregistered_members::add_member)
        .service(unregistered_members::edit_member)
        .service(unregistered_members::remove_member)
        .service(membership_requests::send_invitation)
        .service(membership_requests::send_join_request)
        .service(membership_requests::accept_request)
        .service(membership_requests::decline_request)
        .service(membership_requests::cancel_request)
        .service(membership_requests::received_invitations)
        .service(membership_requests::sent_requests)
        .service(membership_requests::pending_join_requests)
        .service(membership_requests::accepted_join_requests);

    #[cfg_attr(not(debug_assertions), expect(unused_mut, reason = "reassigned only when Swagger UI is mounted"))]
    let mut app = App::new()
        .app_data(health_state)
        .app_data(hub)
        .service(api)
        .service(ws::notifications_ws)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    {
        app = app.service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    app
}

/// Start the HTTP server.
pub fn run(config: ServerConfig) -> std::io::Result<(Server, web::Data<HealthState>)> {
    let hub = web::Data::new(NotificationHub::new());
    let http_state = web::Data::new(build_http_state(&config.db_pool, hub.clone().into_inner()));
    let health_state = web::Data::new(HealthState::new());

    let app_health = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(app_health.clone(), http_state.clone(), hub.clone())
    })
    .bind(config.bind_addr)?
    .run();

    Ok((server, health_state))
}
