//! # journal-harvest
//!
//! Resumable bulk download of every work published in a list of journals,
//! using the OpenAlex API.
//!
//! ## Modules
//!
//! - [`openalex`] - HTTP transport, contact tokens, URL building
//! - [`resolver`] - Journal name to OpenAlex source id
//! - [`fetcher`] - Work counts and concurrent paged download
//! - [`record`] - Raw work to [`WorkRecord`] normalization
//! - [`abstract_text`] - Inverted-index abstract reconstruction
//! - [`job`] - One journal: resolve, count, fetch, save, resume
//! - [`batch`] - Input lists, progress log, pacing, summary
//! - [`output`] - JSON/CSV files
//! - [`retry`] - Exponential backoff
//! - [`config`] - Run configuration
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use journal_harvest::{HarvestConfig, JobRunner, OpenAlexClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = OpenAlexClient::new(Arc::new(HarvestConfig::batch()))?;
//!     let runner = JobRunner::new(client, "output", 2);
//!     let result = runner.run(1, "Nature").await;
//!     println!("{:?}: {}", result.status, result.message);
//!     Ok(())
//! }
//! ```

pub mod abstract_text;
pub mod batch;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod job;
pub mod openalex;
pub mod output;
pub mod record;
pub mod resolver;
pub mod retry;

pub use batch::{BatchRunner, BatchSummary, ProgressLog};
pub use config::{BatchConfig, HarvestConfig, RetryPolicy};
pub use error::{HarvestError, Result};
pub use fetcher::PageFetch;
pub use job::{JobResult, JobRunner, JobStatus, JournalDownload};
pub use openalex::OpenAlexClient;
pub use record::WorkRecord;
pub use resolver::ResolvedSource;
