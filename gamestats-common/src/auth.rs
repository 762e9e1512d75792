//! Password digest helpers
//!
//! Migrated accounts are never given a usable legacy password. Every account
//! receives the same known default, stored as a salted SHA-256 hex digest so
//! operators can force a reset on first login.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a random hex-encoded salt
pub fn generate_salt() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Salted SHA-256 digest of a password, as 64 hex characters
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let result = hasher.finalize();
    format!("{:x}", result)
}
