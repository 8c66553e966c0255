/*
 * Responsibility
 * - Load settings from the environment (.env supported)
 * - Validate them up front (missing/invalid -> startup failure)
 * - The SSO secret is only ever held as SsoSecret (never printed)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::services::sso::SsoSecret;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonceBackend {
    // Single process; expired entries purged every `sweep_interval`.
    Memory { sweep_interval: Duration },
    // Shared across processes.
    Valkey { url: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // Remote site the browser is sent to.
    pub sso_url: String,
    pub sso_secret: SsoSecret,
    pub nonce_ttl: Duration,
    pub nonce_backend: NonceBackend,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, map in tests, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let sso_url = lookup("SSO_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("SSO_URL"))?;
        url::Url::parse(&sso_url).map_err(|_| ConfigError::Invalid("SSO_URL"))?;

        let sso_secret = SsoSecret::new(lookup("SSO_SECRET").ok_or(ConfigError::Missing("SSO_SECRET"))?)
            .map_err(|_| ConfigError::Invalid("SSO_SECRET"))?;

        let nonce_ttl_seconds = seconds(&lookup, "SSO_NONCE_TTL_SECONDS", 600)?; // 10 min
        if nonce_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("SSO_NONCE_TTL_SECONDS"));
        }

        let nonce_backend = match lookup("NONCE_STORE")
            .unwrap_or_else(|| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => NonceBackend::Memory {
                sweep_interval: Duration::from_secs(
                    seconds(&lookup, "NONCE_SWEEP_INTERVAL_SECONDS", 60)?.max(1),
                ),
            },
            "valkey" | "redis" => NonceBackend::Valkey {
                url: lookup("VALKEY_URL").ok_or(ConfigError::Missing("VALKEY_URL"))?,
            },
            _ => return Err(ConfigError::Invalid("NONCE_STORE")),
        };

        Ok(Self {
            addr,
            app_env,
            sso_url,
            sso_secret,
            nonce_ttl: Duration::from_secs(nonce_ttl_seconds),
            nonce_backend,
        })
    }
}

fn seconds<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
