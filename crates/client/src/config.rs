//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_GRAPHQL_URL` - GraphQL endpoint of the catalog service
//! - `STOREFRONT_ADMIN_PROFILE_ID` - Profile id granted the admin role
//!
//! ## Optional
//! - `STOREFRONT_STATE_PATH` - Durable state file (default: green-mango-state.json)
//! - `STOREFRONT_REQUEST_TIMEOUT_SECS` - Remote call timeout (default: 30)
//! - `STOREFRONT_PAGE_SIZE` - Initial catalog page size (default: 8)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use green_mango_core::{PageSize, ProfileId};

const DEFAULT_STATE_PATH: &str = "green-mango-state.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL endpoint of the catalog service.
    pub graphql_url: String,
    /// Profile id granted the admin role.
    pub admin_profile_id: ProfileId,
    /// Path of the durable state file.
    pub storage_path: PathBuf,
    /// Timeout applied to every remote call.
    pub request_timeout: Duration,
    /// Catalog page size used until the user picks another.
    pub default_page_size: PageSize,
}

impl ClientConfig {
    /// Create a configuration with defaults for the optional fields.
    #[must_use]
    pub fn new(graphql_url: impl Into<String>, admin_profile_id: ProfileId) -> Self {
        Self {
            graphql_url: graphql_url.into(),
            admin_profile_id,
            storage_path: PathBuf::from(DEFAULT_STATE_PATH),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_page_size: PageSize::default(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let graphql_url = parse_endpoint(
            "STOREFRONT_GRAPHQL_URL",
            &get_required_env("STOREFRONT_GRAPHQL_URL")?,
        )?;
        let admin_profile_id =
            ProfileId::new(get_required_env("STOREFRONT_ADMIN_PROFILE_ID")?);
        let storage_path =
            PathBuf::from(get_env_or_default("STOREFRONT_STATE_PATH", DEFAULT_STATE_PATH));
        let request_timeout = parse_timeout(
            "STOREFRONT_REQUEST_TIMEOUT_SECS",
            &get_env_or_default(
                "STOREFRONT_REQUEST_TIMEOUT_SECS",
                &DEFAULT_TIMEOUT_SECS.to_string(),
            ),
        )?;
        let default_page_size = parse_page_size(
            "STOREFRONT_PAGE_SIZE",
            &get_env_or_default("STOREFRONT_PAGE_SIZE", "8"),
        )?;

        Ok(Self {
            graphql_url,
            admin_profile_id,
            storage_path,
            request_timeout,
            default_page_size,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Validate that the endpoint is an absolute http(s) URL.
fn parse_endpoint(var: &str, value: &str) -> Result<String, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }
    Ok(url.to_string())
}

fn parse_timeout(var: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs = value
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            var.to_string(),
            "timeout must be positive".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_page_size(var: &str, value: &str) -> Result<PageSize, ConfigError> {
    let n = value
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))?;
    PageSize::try_from(n).map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))
}
