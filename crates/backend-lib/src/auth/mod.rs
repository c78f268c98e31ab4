// ============================
// polifinder-backend-lib/src/auth/mod.rs
// ============================
//! Authentication primitives used by the in-process backend, plus the
//! bearer-token extractor used by the handlers.

pub mod password;
pub mod session;
pub mod token_generator;
mod bearer;

pub use bearer::BearerToken;
pub use password::{hash_password, hash_password_secure, verify_password};
pub use session::SessionManager;
pub use token_generator::generate_secure_token;
