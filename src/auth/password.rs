use argon2::{
    password_hash::{rand_core::OsRng, Error as HashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with Argon2id and a per-password random salt. Returns a
/// PHC-formatted string suitable for storage.
pub fn hash_password(password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored PHC hash. A mismatch is `Ok(false)`,
/// not an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, HashError> {
    let parsed = PasswordHash::new(password_hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
    }

    #[test]
    fn wrong_password_is_rejected_without_error() {
        let hash = hash_password("first password").unwrap();
        assert!(!verify_password("second password", &hash).unwrap());
    }

    #[test]
    fn surrounding_whitespace_is_significant() {
        // Registration must hash the password exactly as entered or a
        // whitespace-padded password can never log in.
        let hash = hash_password("  padded pw  ").unwrap();
        assert!(verify_password("  padded pw  ", &hash).unwrap());
        assert!(!verify_password("padded pw", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("repeatable").unwrap();
        let b = hash_password("repeatable").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_stored_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
