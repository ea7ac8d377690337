//! Inbound adapters translating external requests into domain service calls
//! while keeping framework details at the edge.
//!
//! REST handlers live under [`http`]; the push-only notification socket
//! lives under [`ws`].

pub mod http;
pub mod ws;
