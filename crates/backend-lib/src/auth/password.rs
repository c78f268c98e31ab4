// ============================
// polifinder-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use rand::RngCore;
use scrypt::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use zeroize::Zeroize;

const SALT_BYTES: usize = 16;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const HASH_LEN: usize = 32;

/// Hash a password using scrypt with the given cost (log2 N)
pub fn hash_password(plain: &str, log_n: u8) -> anyhow::Result<String> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)?;

    let params = Params::new(log_n, SCRYPT_R, SCRYPT_P, HASH_LEN)?;
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String, log_n: u8) -> anyhow::Result<String> {
    let hash = hash_password(plain, log_n);
    plain.zeroize();
    hash
}
