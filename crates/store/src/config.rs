//! Cart store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_BASE_URL` - Base URL of the inventory/catalog service
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token for the inventory/catalog service
//! - `CART_SNAPSHOT_KEY` - Snapshot key (default: `@RocketShoes:cart`)
//! - `CART_SNAPSHOT_DIR` - Directory for file snapshots (default: `.cart`)
//! - `CART_REQUEST_TIMEOUT_SECS` - HTTP timeout in seconds (default: 10, 0 disables)
//! - `CART_CATALOG_CACHE_TTL_SECS` - Product metadata cache TTL (default: 300, 0 disables)
//! - `CART_DATABASE_URL` - `PostgreSQL` connection string for the `postgres` snapshot store
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::snapshot::DEFAULT_SNAPSHOT_KEY;

const DEFAULT_SNAPSHOT_DIR: &str = ".cart";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Base URL for `/stock/{id}` and `/products/{id}` (always ends in `/`)
    pub api_base_url: Url,
    /// Bearer token for the inventory/catalog service
    pub api_token: Option<SecretString>,
    /// Key the cart snapshot is stored under
    pub snapshot_key: String,
    /// Directory used by the file snapshot store
    pub snapshot_dir: PathBuf,
    /// Per-request HTTP timeout (`None` waits indefinitely)
    pub request_timeout: Option<Duration>,
    /// Product metadata cache TTL (`None` disables the cache)
    pub catalog_cache_ttl: Option<Duration>,
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl CartConfig {
    /// Configuration with defaults for everything except the service URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url: with_trailing_slash(api_base_url),
            api_token: None,
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
            request_timeout: Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            catalog_cache_ttl: Some(Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS)),
            database_url: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API token fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`CartConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("CART_API_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("CART_API_BASE_URL".to_string()))?;
        let api_base_url = parse_base_url("CART_API_BASE_URL", &raw_url)?;

        let api_token = match lookup("CART_API_TOKEN") {
            Some(token) => {
                validate_secret_strength(&token, "CART_API_TOKEN")?;
                Some(SecretString::from(token))
            }
            None => None,
        };

        let snapshot_key = lookup("CART_SNAPSHOT_KEY")
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| DEFAULT_SNAPSHOT_KEY.to_string());
        let snapshot_dir = lookup("CART_SNAPSHOT_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR), PathBuf::from);

        let request_timeout = optional_seconds(
            &lookup,
            "CART_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let catalog_cache_ttl = optional_seconds(
            &lookup,
            "CART_CATALOG_CACHE_TTL_SECS",
            DEFAULT_CATALOG_CACHE_TTL_SECS,
        )?;

        let sentry_dsn = lookup("SENTRY_DSN")
            .map(|dsn| parse_sentry_dsn("SENTRY_DSN", dsn))
            .transpose()?;

        // Fallback to generic DATABASE_URL
        let database_url = lookup("CART_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from);

        Ok(Self {
            api_base_url,
            api_token,
            snapshot_key,
            snapshot_dir,
            request_timeout,
            catalog_cache_ttl,
            database_url,
            sentry_dsn,
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// The API token as a plain string, for building request headers.
    #[must_use]
    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_ref().map(|token| token.expose_secret())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the service base URL, requiring an http(s) scheme.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(with_trailing_slash(url))
}

/// Reject DSNs that `sentry::init` would panic on.
fn parse_sentry_dsn(key: &str, raw: String) -> Result<String, ConfigError> {
    raw.parse::<sentry::types::Dsn>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(raw)
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Read a duration in seconds, where `0` means "disabled".
fn optional_seconds<F>(lookup: &F, key: &str, default: u64) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = match lookup(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?,
        None => default,
    };
    Ok((secs > 0).then_some(Duration::from_secs(secs)))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
