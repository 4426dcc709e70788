//! GraphQL catalog service client.
//!
//! # Architecture
//!
//! - Queries are issued as raw GraphQL documents over `reqwest`; the remote
//!   schema is owned by the catalog service, not vendored here.
//! - The service is the source of truth - no local sync, direct API calls.
//! - Read-side responses (product pages, product details) are cached in
//!   memory via `moka` with a short TTL; mutations are never cached.
//!
//! # Example
//!
//! ```rust,ignore
//! use green_mango_client::api::CatalogClient;
//!
//! let client = CatalogClient::new(&config);
//!
//! // Fetch one catalog page
//! let page = client.products_page(&query).await?;
//!
//! // Place an order from cart lines
//! let order_id = client.create_order(&lines).await?;
//! ```

mod client;
mod queries;
mod types;

pub use client::CatalogClient;

use thiserror::Error;

/// Errors that can occur when talking to the catalog service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was rejected for lacking credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the service.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

/// A GraphQL error returned by the catalog service.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

impl GraphQLError {
    /// An error with a message and no path.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .map(|e| {
            let path = e
                .path
                .iter()
                .map(|p| match p {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".");

            match (e.message.is_empty(), path.is_empty()) {
                (false, false) => format!("{} (path: {path})", e.message),
                (false, true) => e.message.clone(),
                (true, false) => format!("(path: {path})"),
                (true, true) => "(no details)".to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
