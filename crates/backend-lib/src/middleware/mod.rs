// crates/backend-lib/src/middleware/mod.rs

//! Request-level middleware and extractors shared by every route.

pub mod client_identity;
pub mod rate_limit;

pub use client_identity::ClientIdentity;
pub use rate_limit::global_rate_limit;
