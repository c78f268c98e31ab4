// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
//! Opaque bearer and refresh tokens for the in-process backend.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// 256 bits of entropy per token
const TOKEN_BYTES: usize = 32;

/// Random token, URL-safe base64 without padding
pub fn generate_secure_token() -> String {
    let mut buffer = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer)
}
