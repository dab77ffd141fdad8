//! Password hashing utilities

use bcrypt::{hash, verify, DEFAULT_COST};
use tracing::warn;

use crate::application::ports::PasswordEncoder;
use crate::shared::{DomainResult, InfraError};

/// bcrypt-backed [`PasswordEncoder`] with a configurable work factor
#[derive(Debug, Clone)]
pub struct BcryptPasswordEncoder {
    cost: u32,
}

impl BcryptPasswordEncoder {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordEncoder for BcryptPasswordEncoder {
    fn encode(&self, raw: &str) -> DomainResult<String> {
        let hashed = hash(raw, self.cost)
            .map_err(|e| InfraError::Crypto(format!("Failed to hash password: {}", e)))?;
        Ok(hashed)
    }

    fn matches(&self, raw: &str, hash: &str) -> bool {
        match verify(raw, hash) {
            Ok(valid) => valid,
            Err(e) => {
                warn!("Stored password hash could not be verified: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let encoder = BcryptPasswordEncoder::default();
        let hashed = encoder.encode("secure_password_123").unwrap();

        assert!(encoder.matches("secure_password_123", &hashed));
        assert!(!encoder.matches("wrong_password", &hashed));
    }

    #[test]
    fn encoder_never_returns_the_raw_value() {
        let encoder = BcryptPasswordEncoder::new(4);
        let hashed = encoder.encode("hunter22").unwrap();

        assert_ne!(hashed, "hunter22");
        assert!(encoder.matches("hunter22", &hashed));
        assert!(!encoder.matches("hunter23", &hashed));
        assert!(!encoder.matches("hunter22", "not-a-bcrypt-hash"));
    }

    #[test]
    fn invalid_cost_surfaces_as_crypto_failure() {
        let encoder = BcryptPasswordEncoder::new(2);
        match encoder.encode("hunter22") {
            Err(crate::shared::DomainError::Storage(message)) => {
                assert!(message.starts_with("Crypto error:"), "{}", message)
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
