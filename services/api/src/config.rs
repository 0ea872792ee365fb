//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::net::{IpAddr, SocketAddr};
use tracing::Level;

const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_PORT: u16 = 8000;
const MEMORY_URL_SCHEME: &str = "memory:";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the documents live, derived from `DATABASE_URL` and `DATABASE_NAME`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreTarget {
    /// `DATABASE_URL=memory://`: an in-process store, lost on restart.
    Memory,
    Postgres { url: String, database: String },
}

/// The admin password, kept only as an Argon2 hash.
#[derive(Clone)]
pub struct AdminSecret {
    hash: String,
}

impl AdminSecret {
    pub fn new(password: &str) -> Result<Self, ConfigError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ConfigError::InvalidValue("ADMIN_PASSWORD".to_string(), e.to_string()))?
            .to_string();
        Ok(Self { hash })
    }

    pub fn verify(&self, candidate: &str) -> bool {
        PasswordHash::new(&self.hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(..)")
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: Option<String>,
    pub database_name: Option<String>,
    pub admin_secret: AdminSecret,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let host_str = var("BIND_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let host = host_str
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_HOST".to_string(), e.to_string()))?;
        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?,
            None => DEFAULT_PORT,
        };

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Database Settings (both optional; the service degrades without them) ---
        let database_url = var("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let database_name = var("DATABASE_NAME").filter(|v| !v.trim().is_empty());

        let admin_password =
            var("ADMIN_PASSWORD").unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string());
        let admin_secret = AdminSecret::new(&admin_password)?;

        Ok(Self {
            bind_address: SocketAddr::new(host, port),
            database_url,
            database_name,
            admin_secret,
            log_level,
        })
    }

    /// The configured store, or `None` when the service should run without one.
    pub fn store_target(&self) -> Option<StoreTarget> {
        let url = self.database_url.as_deref()?;
        if url.starts_with(MEMORY_URL_SCHEME) {
            return Some(StoreTarget::Memory);
        }
        let database = self.database_name.as_deref()?;
        Some(StoreTarget::Postgres {
            url: url.to_string(),
            database: database.to_string(),
        })
    }
}
