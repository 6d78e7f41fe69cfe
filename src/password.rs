use derive_more::{Display, Error};

/// bcrypt ignores input past 72 bytes, so longer passwords are refused
/// outright rather than truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Input for the dummy hash verified when a login names an unknown email.
const DUMMY_PASSWORD: &str = "timing-equalizer";

#[derive(Debug, Display, Error)]
pub enum HashError {
    #[display("failed to hash password: {message}")]
    Hashing { message: String },

    #[display("stored password hash is malformed: {message}")]
    Verification { message: String },
}

/// Salted bcrypt hashing with a configurable work factor.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, HashError> {
        let dummy_hash = bcrypt::hash(DUMMY_PASSWORD, cost).map_err(|e| HashError::Hashing {
            message: e.to_string(),
        })?;
        Ok(Self { cost, dummy_hash })
    }

    /// Hash a plaintext password. Every call draws a fresh salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::Hashing {
                message: format!("password exceeds {} bytes", MAX_PASSWORD_BYTES),
            });
        }
        bcrypt::hash(plaintext, self.cost).map_err(|e| HashError::Hashing {
            message: e.to_string(),
        })
    }

    /// Check a plaintext against a stored hash. A mismatch is `Ok(false)`;
    /// only an unparseable stored hash is an error. Over-long input never
    /// matches.
    pub fn verify(&self, plaintext: &str, stored: &str) -> Result<bool, HashError> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            self.verify_dummy(plaintext);
            return Ok(false);
        }
        bcrypt::verify(plaintext, stored).map_err(|e| HashError::Verification {
            message: e.to_string(),
        })
    }

    /// Burn one verification's worth of work so an unknown account costs
    /// the same as a wrong password.
    pub fn verify_dummy(&self, plaintext: &str) {
        let _ = bcrypt::verify(plaintext, &self.dummy_hash);
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(TEST_COST).unwrap()
    }

    #[test]
    fn test_password_hash_and_verify_correct() {
        let hasher = hasher();
        let hash = hasher.hash("pw123").unwrap();
        assert!(hasher.verify("pw123", &hash).unwrap());
    }

    #[test]
    fn test_password_verify_wrong() {
        let hasher = hasher();
        let hash = hasher.hash("correct-password").unwrap();
        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = hasher().hash("pw123").unwrap();
        assert_ne!(hash, "pw123");
        assert!(!hash.contains("pw123"));
    }

    #[test]
    fn test_password_different_salts() {
        let hasher = hasher();
        let hash1 = hasher.hash("same-password").unwrap();
        let hash2 = hasher.hash("same-password").unwrap();
        assert_ne!(hash1, hash2);
        assert!(hasher.verify("same-password", &hash1).unwrap());
        assert!(hasher.verify("same-password", &hash2).unwrap());
    }

    #[test]
    fn test_malformed_stored_hash_is_error() {
        let err = hasher().verify("pw123", "not-a-bcrypt-hash").unwrap_err();
        assert!(matches!(err, HashError::Verification { .. }));
    }

    #[test]
    fn test_overlong_password_is_not_truncated() {
        let hasher = hasher();
        let max = "q".repeat(MAX_PASSWORD_BYTES);
        let hash = hasher.hash(&max).unwrap();
        assert!(hasher.verify(&max, &hash).unwrap());
        assert!(!hasher.verify(&format!("{}zz", max), &hash).unwrap());

        let err = hasher.hash(&"q".repeat(MAX_PASSWORD_BYTES + 8)).unwrap_err();
        assert!(matches!(err, HashError::Hashing { .. }));
    }

    #[test]
    fn test_invalid_cost_is_hashing_error() {
        let err = PasswordHasher::new(99).unwrap_err();
        assert!(matches!(err, HashError::Hashing { .. }));
    }
}
