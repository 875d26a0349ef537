use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::Error as HashError;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Algorithm;
use argon2::Argon2;
use argon2::Params;
use argon2::Version;

use super::errors::PasswordError;

/// Password hashing implementation.
///
/// Provides cryptographic password hashing (internally uses Argon2id).
/// The cost factor is the Argon2 time cost; memory and parallelism stay at
/// the library defaults.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    require_letter_and_digit: bool,
}

impl PasswordHasher {
    /// Minimum accepted password length, in characters.
    pub const MIN_LENGTH: usize = 6;

    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with secure defaults
    pub fn new() -> Self {
        Self {
            params: Params::default(),
            require_letter_and_digit: false,
        }
    }

    /// Create a hasher with a custom work factor.
    ///
    /// # Arguments
    /// * `cost` - Argon2 time cost (number of passes, at least 1)
    ///
    /// # Errors
    /// * `InvalidCost` - Argon2 rejected the parameters
    pub fn with_cost(cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| PasswordError::InvalidCost(e.to_string()))?;

        Ok(Self {
            params,
            require_letter_and_digit: false,
        })
    }

    /// Additionally require at least one ASCII letter and one ASCII digit.
    pub fn require_letter_and_digit(mut self, required: bool) -> Self {
        self.require_letter_and_digit = required;
        self
    }

    /// Time cost embedded into newly produced hashes.
    pub fn cost(&self) -> u32 {
        self.params.t_cost()
    }

    /// Check a plaintext password against the strength policy.
    ///
    /// # Errors
    /// * `WeakPassword` - Empty, shorter than `MIN_LENGTH`, or missing a
    ///   letter/digit when that policy is enabled
    pub fn check_strength(&self, password: &str) -> Result<(), PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::WeakPassword(
                "password cannot be empty".to_string(),
            ));
        }

        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            return Err(PasswordError::WeakPassword(format!(
                "minimum {} characters, got {}",
                Self::MIN_LENGTH,
                length
            )));
        }

        if self.require_letter_and_digit {
            let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
            let has_digit = password.chars().any(|c| c.is_ascii_digit());
            if !(has_letter && has_digit) {
                return Err(PasswordError::WeakPassword(
                    "must contain both letters and numbers".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Hash a plaintext password securely.
    ///
    /// Uses Argon2id with random salt generation.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `WeakPassword` - Password fails the strength policy
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        self.check_strength(password)?;

        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The parameters embedded in `hash` are used, so hashes produced with a
    /// different cost still verify.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `CorruptHash` - Stored value is not a usable Argon2 hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::CorruptHash(format!("Invalid password hash: {}", e)))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(HashError::Password) => Ok(false),
            Err(e) => Err(PasswordError::CorruptHash(e.to_string())),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
