use std::env;
use std::fmt;
use std::path::PathBuf;

/// Minimum acceptable length for the token signing secret
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default access token lifetime in minutes
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 480;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("{0} must be at least {MIN_SECRET_LENGTH} characters")]
    WeakSecret(&'static str),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Application settings loaded once at startup.
///
/// A missing or weak signing secret aborts the process before it can
/// serve a single request.
#[derive(Clone)]
pub struct AppSettings {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl AppSettings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://fleetops.db?mode=rwc".to_string());

        let bind_address =
            env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::WeakSecret("JWT_SECRET"));
        }

        let token_ttl_minutes = match env::var("TOKEN_TTL_MINUTES") {
            Ok(raw) => {
                let parsed: i64 = raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("TOKEN_TTL_MINUTES", raw.clone()))?;
                if parsed <= 0 {
                    return Err(ConfigError::InvalidValue("TOKEN_TTL_MINUTES", raw));
                }
                parsed
            }
            Err(_) => DEFAULT_TOKEN_TTL_MINUTES,
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string());
        let log_file = env::var("APP_LOG_FILE").ok().map(PathBuf::from);

        Ok(Self {
            database_url,
            bind_address,
            jwt_secret,
            token_ttl_minutes,
            log_level,
            log_file,
        })
    }
}

impl fmt::Debug for AppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSettings")
            .field("database_url", &self.database_url)
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("log_level", &self.log_level)
            .field("log_file", &self.log_file)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_does_not_expose_jwt_secret() {
        let settings = AppSettings {
            database_url: "sqlite::memory:".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            jwt_secret: "super-secret-signing-key-minimum-32-chars".to_string(),
            token_ttl_minutes: 480,
            log_level: "INFO".to_string(),
            log_file: None,
        };

        let debug_output = format!("{:?}", settings);

        assert!(debug_output.contains("<redacted>"));
        assert!(!debug_output.contains("super-secret-signing-key"));
    }
}
