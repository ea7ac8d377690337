//! Household membership backend.
//!
//! Hexagonal layout: domain types, ports, and services under [`domain`];
//! HTTP and WebSocket entry points under [`inbound`]; PostgreSQL and
//! notification adapters under [`outbound`]; wiring in [`server`].

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod server;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
