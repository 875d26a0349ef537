use std::env;
use std::fmt;
use std::time::Duration;

use auth::Authenticator;
use auth::PasswordHasher;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Upper bound on the token lifetime (100 years).
pub const MAX_JWT_EXPIRATION_HOURS: i64 = 24 * 365 * 100;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub http_port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Postgres connection string. Without one the service keeps users in memory.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: i64,
    /// Argon2 iteration count; the library default when unset.
    pub hash_cost: Option<u32>,
    #[serde(default)]
    pub require_letter_and_digit: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    5
}

fn default_jwt_expiration_hours() -> i64 {
    Authenticator::DEFAULT_TOKEN_TTL_HOURS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// Secret stays out of logs and panic messages
impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("hash_cost", &self.hash_cost)
            .field("require_letter_and_digit", &self.require_letter_and_digit)
            .finish()
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (APP__SECURITY__JWT_SECRET, APP__SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: APP__DATABASE__URL=postgres://... overrides database.url
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values the service cannot start with.
    ///
    /// # Errors
    /// * `Message` - Empty JWT secret, token lifetime outside
    ///   `1..=MAX_JWT_EXPIRATION_HOURS` or zero request timeout
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "security.jwt_secret must not be empty".to_string(),
            ));
        }

        if !(1..=MAX_JWT_EXPIRATION_HOURS).contains(&self.security.jwt_expiration_hours) {
            return Err(ConfigError::Message(format!(
                "security.jwt_expiration_hours must be between 1 and {}, got {}",
                MAX_JWT_EXPIRATION_HOURS, self.security.jwt_expiration_hours
            )));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}

impl SecurityConfig {
    /// Build the shared authenticator from the security settings.
    ///
    /// # Errors
    /// * `Message` - `hash_cost` is outside the accepted range or
    ///   `jwt_expiration_hours` is not a representable duration
    pub fn build_authenticator(&self) -> Result<Authenticator, ConfigError> {
        let token_ttl = chrono::Duration::try_hours(self.jwt_expiration_hours).ok_or_else(|| {
            ConfigError::Message(format!(
                "security.jwt_expiration_hours out of range: {}",
                self.jwt_expiration_hours
            ))
        })?;

        let hasher = match self.hash_cost {
            Some(cost) => PasswordHasher::with_cost(cost)
                .map_err(|e| ConfigError::Message(format!("security.hash_cost: {e}")))?,
            None => PasswordHasher::new(),
        }
        .require_letter_and_digit(self.require_letter_and_digit);

        Ok(Authenticator::new(self.jwt_secret.as_bytes())
            .with_password_hasher(hasher)
            .with_token_ttl(token_ttl))
    }
}
