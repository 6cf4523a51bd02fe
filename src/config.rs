//! Runtime configuration for the project portal.
//!
//! Everything is read from environment variables. `main` calls
//! `dotenvy::dotenv()` first, so a local `.env` file works during development.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use anyhow::Context;
use tracing::info;

/// Settings shared by every route through `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Postgres connection string. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub fcm: Option<FcmConfig>,
    pub session_max_age_secs: i64,
    pub cookie_secure: bool,
    pub appointment_max_attempts: u32,
}

/// Credentials for Firebase Cloud Messaging (HTTP v1 API).
#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub project_id: String,
    pub access_token: String,
    pub endpoint: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_url: None,
            database_max_connections: 10,
            fcm: None,
            session_max_age_secs: 60 * 60 * 3,
            cookie_secure: true,
            appointment_max_attempts: 5,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let fcm = match (optional("FCM_PROJECT_ID"), optional("FCM_ACCESS_TOKEN")) {
            (Some(project_id), Some(access_token)) => Some(FcmConfig {
                project_id,
                access_token,
                endpoint: optional("FCM_ENDPOINT")
                    .unwrap_or_else(|| "https://fcm.googleapis.com".to_string()),
            }),
            (Some(_), None) => {
                info!("FCM_PROJECT_ID set without FCM_ACCESS_TOKEN, push delivery disabled");
                None
            }
            _ => None,
        };

        let appointment_max_attempts: u32 =
            parse_or("APPOINTMENT_MAX_ATTEMPTS", defaults.appointment_max_attempts)?;

        Ok(Self {
            bind_addr: optional("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: optional("APP_DATABASE_URL"),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            )?,
            fcm,
            session_max_age_secs: parse_or("SESSION_MAX_AGE_SECS", defaults.session_max_age_secs)?,
            cookie_secure: parse_or("COOKIE_SECURE", defaults.cookie_secure)?,
            appointment_max_attempts: appointment_max_attempts.max(1),
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value: {:?}", key, raw)),
        None => {
            info!("{} not set, using default: {}", key, default);
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_cookie_lifetime() {
        let config = AppConfig::default();
        assert_eq!(config.session_max_age_secs, 10_800);
        assert!(config.cookie_secure);
        assert!(config.database_url.is_none());
        assert!(config.fcm.is_none());
    }

    #[test]
    fn parse_or_rejects_garbage() {
        // Unique key so parallel tests never share it.
        std::env::set_var("PORTAL_TEST_PARSE_OR", "not-a-number");
        let parsed: anyhow::Result<u32> = parse_or("PORTAL_TEST_PARSE_OR", 3);
        assert!(parsed.is_err());
        std::env::remove_var("PORTAL_TEST_PARSE_OR");
    }
}
