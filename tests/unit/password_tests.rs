// ============================
// tests/unit/password_tests.rs
// ============================
use polifinder_backend_lib::auth::{hash_password, hash_password_secure, verify_password};
use polifinder_backend_lib::config::PasswordRequirements;
use polifinder_backend_lib::validation::validate_password;

const COST: u8 = 4;

#[test]
fn test_password_hashing_and_verification() {
    let password = "SecureP@ssw0rd";
    let hash = hash_password(password, COST).unwrap();

    assert_ne!(password, hash);
    assert!(hash.starts_with("$scrypt$"));
    assert!(verify_password(&hash, password));
    assert!(!verify_password(&hash, "SecureP@ssw0rD"));
    assert!(!verify_password("not-a-hash", password));
}

#[test]
fn test_hashes_are_salted() {
    let first = hash_password("SecureP@ssw0rd", COST).unwrap();
    let second = hash_password("SecureP@ssw0rd", COST).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_secure_hash_clears_input() {
    let mut password = "SecureP@ssw0rd".to_string();
    let hash = hash_password_secure(&mut password, COST).unwrap();
    assert!(password.is_empty());
    assert!(verify_password(&hash, "SecureP@ssw0rd"));
}

#[test]
fn test_password_strength_validation() {
    let requirements = PasswordRequirements::default();

    assert!(validate_password("SecureP@ssw0rd", &requirements).is_ok());
    assert!(validate_password("Short1!", &requirements).is_err());
    assert!(validate_password("securep@ssw0rd", &requirements).is_err());
    assert!(validate_password("SECUREP@SSW0RD", &requirements).is_err());
    assert!(validate_password("SecureP@ssword", &requirements).is_err());
    assert!(validate_password("SecurePassw0rd", &requirements).is_err());

    let relaxed = PasswordRequirements {
        min_length: 8,
        require_uppercase: false,
        require_lowercase: true,
        require_digit: true,
        require_special: false,
    };
    assert!(validate_password("password1", &relaxed).is_ok());
}
