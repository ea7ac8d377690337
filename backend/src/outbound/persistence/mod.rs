//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's driven storage ports, backed by
//! PostgreSQL through `diesel-async` with `bb8` connection pooling.
//!
//! The adapters are thin translators: Diesel row structs (`models.rs`) and
//! table definitions (`schema.rs`) stay internal, every database error maps
//! to the owning port's error type, and no business logic lives here. The
//! one structural rule is that multi-step membership mutations belong to
//! [`DieselMembershipStore`], which wraps each one in a single transaction
//! so the member-count bookkeeping cannot drift from the rows it counts.

mod diesel_household_repository;
mod diesel_membership_request_repository;
mod diesel_membership_store;
mod diesel_unregistered_member_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_household_repository::DieselHouseholdRepository;
pub use diesel_membership_request_repository::DieselMembershipRequestRepository;
pub use diesel_membership_store::DieselMembershipStore;
pub use diesel_unregistered_member_repository::DieselUnregisteredMemberRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolError};
