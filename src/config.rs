//! Run configuration.
//!
//! All tunables live in immutable structs built once at startup and shared by
//! `Arc`. Nothing in the crate reads global mutable state.

use crate::error::{HarvestError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// OpenAlex API base URL
pub const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// Maximum results per page (OpenAlex limit)
pub const MAX_PER_PAGE: u32 = 200;

/// Number of ranked candidates requested when resolving a journal name
pub const SEARCH_CANDIDATES: u32 = 10;

/// Default contact address for the polite pool
pub const DEFAULT_CONTACT_EMAIL: &str = "harvest@example.org";

/// Exponential backoff policy applied to every HTTP call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// A policy that never waits, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

/// Settings shared by every OpenAlex request.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// API root, overridable for tests and mirrors
    pub api_base: String,
    /// Contact address sent as `mailto`
    pub contact_email: String,
    /// Add a random `+suffix` to the contact address on every request
    pub randomize_contact: bool,
    /// Pause taken by a worker before each request
    pub request_delay: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Works per listing page
    pub per_page: u32,
    /// Candidates requested from the name search
    pub search_candidates: u32,
    /// Retry behaviour for transient failures
    pub retry: RetryPolicy,
}

impl HarvestConfig {
    /// Preset for long batch runs: randomized contact tokens, 0.5s between requests.
    pub fn batch() -> Self {
        Self {
            api_base: OPENALEX_API_BASE.to_string(),
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
            randomize_contact: true,
            request_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
            per_page: MAX_PER_PAGE,
            search_candidates: SEARCH_CANDIDATES,
            retry: RetryPolicy::default(),
        }
    }

    /// Preset for downloading a single journal interactively.
    pub fn single() -> Self {
        Self {
            randomize_contact: false,
            request_delay: Duration::ZERO,
            ..Self::batch()
        }
    }

    /// Override the contact address.
    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = email.into();
        self
    }

    /// Override the API root.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Reject settings OpenAlex would refuse or that make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(HarvestError::Config(format!(
                "per_page must be between 1 and {}, got {}",
                MAX_PER_PAGE, self.per_page
            )));
        }
        if self.search_candidates == 0 {
            return Err(HarvestError::Config(
                "search_candidates must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(HarvestError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.contact_email.trim().is_empty() {
            return Err(HarvestError::Config(
                "contact email must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self::batch()
    }
}

/// Settings for a batch run over an input list.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory receiving `<line>.json` files
    pub output_dir: PathBuf,
    /// Progress log path
    pub log_path: PathBuf,
    /// First line to process (1-indexed)
    pub start: usize,
    /// Last line to process (inclusive); `None` means end of list
    pub end: Option<usize>,
    /// Concurrent page requests per journal
    pub workers: usize,
    /// Rewrite the progress log after this many completed jobs
    pub checkpoint_every: usize,
    /// Pause after a job that actually downloaded
    pub success_pause: Duration,
    /// Pause after skipped, not-found or failed jobs
    pub idle_pause: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            log_path: PathBuf::from("batch_log.json"),
            start: 1,
            end: None,
            workers: 2,
            checkpoint_every: 10,
            success_pause: Duration::from_secs(2),
            idle_pause: Duration::from_millis(500),
        }
    }
}
