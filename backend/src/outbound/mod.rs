//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories and the transactional
//!   membership store, via Diesel ORM
//! - **notify**: WebSocket fan-out for membership notification events
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod notify;
pub mod persistence;
