use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Session token claims.
///
/// Carries the authenticated subject together with its email and role, plus
/// the RFC 7519 time window. All fields are required when decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account identifier)
    pub sub: String,

    /// Account email at issuance time
    pub email: String,

    /// Account role at issuance time
    pub role: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for user authentication with automatic expiration.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `email` - Account email
    /// * `role` - Account role name
    /// * `ttl` - Time until the token expires
    ///
    /// # Returns
    /// Claims valid from now until now + ttl
    ///
    /// # Errors
    /// * `EncodingFailed` - now + ttl falls outside the representable time range
    pub fn for_user(
        user_id: impl ToString,
        email: impl Into<String>,
        role: impl Into<String>,
        ttl: Duration,
    ) -> Result<Self, JwtError> {
        let now = Utc::now();
        let expiration = now.checked_add_signed(ttl).ok_or_else(|| {
            JwtError::EncodingFailed(format!("token lifetime {ttl} overflows the expiration"))
        })?;

        Ok(Self {
            sub: user_id.to_string(),
            email: email.into(),
            role: role.into(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expiration.timestamp(),
        })
    }

    /// Set expiration (Unix timestamp).
    pub fn with_expiration(mut self, exp: i64) -> Self {
        self.exp = exp;
        self
    }

    /// Set not before (Unix timestamp).
    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = nbf;
        self
    }
}
