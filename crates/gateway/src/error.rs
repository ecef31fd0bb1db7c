//! Client construction errors

use thiserror::Error;

/// Failure to set up a gateway client
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid base URL '{0}': expected http:// or https://")]
    InvalidUrl(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
