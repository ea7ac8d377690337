//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod health;
pub mod households;
pub mod membership_requests;
pub mod state;
pub mod unregistered_members;
pub mod validation;

pub use error::ApiResult;
