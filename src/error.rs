//! Error types for journal-harvest.
//!
//! Every fallible library function returns `Result<T, HarvestError>`. The
//! distinction that matters at runtime is transient vs. permanent: see
//! [`HarvestError::is_transient`].

use thiserror::Error;

/// Main error type for harvesting operations.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Network/HTTP transport error (timeouts, refused connections, bad bodies)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// OpenAlex answered with a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message
        message: String,
    },

    /// OpenAlex answered 429
    #[error("Rate limited by OpenAlex")]
    RateLimited,

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl HarvestError {
    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts, connection failures (including a body cut off mid-read), 5xx
    /// and 429 are transient. Client errors, bodies that arrive whole but do
    /// not parse, and local failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            HarvestError::Network(e) => {
                if e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.is_body()
                    || e.is_decode()
                {
                    return true;
                }
                e.status().map(|s| s.is_server_error()).unwrap_or(false)
            }
            HarvestError::Api { code, .. } => *code >= 500,
            HarvestError::RateLimited => true,
            _ => false,
        }
    }
}

/// Result type alias using `HarvestError`
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HarvestError::RateLimited.is_transient());
        assert!(HarvestError::Api {
            code: 503,
            message: "unavailable".to_string()
        }
        .is_transient());
        assert!(!HarvestError::Api {
            code: 404,
            message: "missing".to_string()
        }
        .is_transient());
        assert!(!HarvestError::Parse("bad body".to_string()).is_transient());
        assert!(!HarvestError::Config("x".to_string()).is_transient());
    }
}
