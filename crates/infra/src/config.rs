//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings for the storefront server.
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub jwt_secret: String,
    /// Accounts created with this email get the admin role.
    pub admin_email: String,
    pub token_ttl_days: i64,
    /// Postgres when set, in-memory stores otherwise.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    /// Adds `Secure` to the session cookie.
    pub cookie_secure: bool,
    pub strict_status_transitions: bool,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("admin_email", &self.admin_email)
            .field("token_ttl_days", &self.token_ttl_days)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("bind_addr", &self.bind_addr)
            .field("cookie_secure", &self.cookie_secure)
            .field("strict_status_transitions", &self.strict_status_transitions)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Defaults suitable for tests: in-memory stores, ephemeral port, insecure cookie.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
            token_ttl_days: 7,
            database_url: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cookie_secure: false,
            strict_status_transitions: false,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let admin_email = get("ADMIN_EMAIL")
            .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string())
            .to_ascii_lowercase();

        let token_ttl_days = match get("TOKEN_TTL_DAYS") {
            None => 7,
            Some(raw) => match raw.parse::<i64>() {
                Ok(days) if days > 0 => days,
                Ok(_) => return Err(invalid("TOKEN_TTL_DAYS", raw, "must be a positive number of days")),
                Err(e) => return Err(invalid("TOKEN_TTL_DAYS", raw, e.to_string())),
            },
        };

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("BIND_ADDR", bind_raw.clone(), e.to_string()))?;

        Ok(Self {
            jwt_secret,
            admin_email,
            token_ttl_days,
            database_url: get("DATABASE_URL"),
            bind_addr,
            cookie_secure: parse_flag("COOKIE_SECURE", get("COOKIE_SECURE"), true)?,
            strict_status_transitions: parse_flag(
                "STRICT_STATUS_TRANSITIONS",
                get("STRICT_STATUS_TRANSITIONS"),
                false,
            )?,
        })
    }
}

fn invalid(var: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value,
        reason: reason.into(),
    }
}

fn parse_flag(var: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, raw, "expected true or false")),
    }
}
