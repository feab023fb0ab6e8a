//! One input line, start to finish.
//!
//! ```text
//! START -> resume check -> SKIPPED
//!                       -> RESOLVING -> NOT_FOUND | FAILED
//!                                    -> COUNTING -> FAILED
//!                                                -> SUCCESS (count 0, empty file)
//!                                                -> FETCHING -> SAVING -> SUCCESS | FAILED
//! ```
//!
//! Every path ends in a [`JobResult`]; errors never escape [`JobRunner::run`].

use crate::error::{HarvestError, Result};
use crate::openalex::OpenAlexClient;
use crate::output::{existing_record_count, line_output_path, save_json};
use crate::record::{normalize_all, WorkRecord};
use crate::resolver::ResolvedSource;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Terminal state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Success,
    Skipped,
    NotFound,
    Failed,
}

impl JobStatus {
    /// Whether the job ended with a usable output file.
    pub fn has_output(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Skipped)
    }
}

/// Progress log entry for one input line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// 1-indexed position among non-blank input lines
    pub line_number: usize,
    /// Name as it appears in the input file
    pub input_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub status: JobStatus,
    /// Records in the output file; present for success and skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_count: Option<usize>,
    /// Some pages were dropped after retries
    #[serde(default)]
    pub partial: bool,
    pub message: String,
}

impl JobResult {
    fn new(line_number: usize, input_name: &str, status: JobStatus, message: impl Into<String>) -> Self {
        Self {
            line_number,
            input_name: input_name.to_string(),
            journal_display_name: None,
            source_id: None,
            status,
            article_count: None,
            partial: false,
            message: message.into(),
        }
    }

    fn with_source(mut self, source: &ResolvedSource) -> Self {
        self.journal_display_name = Some(source.display_name.clone());
        self.source_id = Some(source.identifier.clone());
        self
    }

    fn with_count(mut self, count: usize) -> Self {
        self.article_count = Some(count);
        self
    }
}

/// Runs jobs against one output directory.
#[derive(Debug, Clone)]
pub struct JobRunner {
    client: OpenAlexClient,
    output_dir: PathBuf,
    workers: usize,
}

impl JobRunner {
    /// `workers` bounds concurrent page requests inside a journal.
    pub fn new(client: OpenAlexClient, output_dir: impl Into<PathBuf>, workers: usize) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            workers: workers.max(1),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process one journal. Never fails: every outcome is a [`JobResult`].
    pub async fn run(&self, line_number: usize, input_name: &str) -> JobResult {
        let output_file = line_output_path(&self.output_dir, line_number);

        if let Some(count) = existing_record_count(&output_file) {
            info!(
                line = line_number,
                journal = input_name,
                articles = count,
                "Already processed, skipping"
            );
            return JobResult::new(
                line_number,
                input_name,
                JobStatus::Skipped,
                "File already exists and is valid",
            )
            .with_count(count);
        }

        info!(line = line_number, journal = input_name, "Processing");

        let source = match self.client.resolve_source(input_name).await {
            Ok(Some(source)) => source,
            Ok(None) => {
                warn!(line = line_number, journal = input_name, "Not found in OpenAlex");
                return JobResult::new(
                    line_number,
                    input_name,
                    JobStatus::NotFound,
                    "Journal not found in OpenAlex database",
                );
            }
            Err(e) => {
                error!(line = line_number, journal = input_name, error = %e, "Search failed");
                return JobResult::new(
                    line_number,
                    input_name,
                    JobStatus::Failed,
                    format!("Search failed: {}", e),
                );
            }
        };

        let total_count = match self.client.count_works(&source.identifier).await {
            Ok(count) => count,
            Err(e) => {
                error!(
                    line = line_number,
                    journal = %source.display_name,
                    error = %e,
                    "Failed to get article count"
                );
                return JobResult::new(
                    line_number,
                    input_name,
                    JobStatus::Failed,
                    format!("Failed to get article count: {}", e),
                )
                .with_source(&source);
            }
        };

        info!(
            line = line_number,
            journal = %source.display_name,
            total = total_count,
            "Counted articles"
        );

        if total_count == 0 {
            return match save_json(&output_file, &[]) {
                Ok(()) => JobResult::new(line_number, input_name, JobStatus::Success, "No articles")
                    .with_source(&source)
                    .with_count(0),
                Err(e) => self.save_failed(line_number, input_name, &source, e),
            };
        }

        let fetched = self
            .client
            .fetch_all(&source.identifier, total_count, self.workers)
            .await;
        let records: Vec<WorkRecord> = normalize_all(&fetched.works);

        if let Err(e) = save_json(&output_file, &records) {
            return self.save_failed(line_number, input_name, &source, e);
        }

        info!(
            line = line_number,
            journal = %source.display_name,
            saved = records.len(),
            file = %output_file.display(),
            "Saved articles"
        );

        let mut result = if fetched.is_partial() {
            JobResult::new(
                line_number,
                input_name,
                JobStatus::Success,
                format!(
                    "Success ({} of {} pages dropped after retries)",
                    fetched.failed_pages.len(),
                    fetched.pages_requested
                ),
            )
        } else {
            JobResult::new(line_number, input_name, JobStatus::Success, "Success")
        };
        result.partial = fetched.is_partial();
        result.with_source(&source).with_count(records.len())
    }

    fn save_failed(
        &self,
        line_number: usize,
        input_name: &str,
        source: &ResolvedSource,
        e: HarvestError,
    ) -> JobResult {
        error!(line = line_number, journal = input_name, error = %e, "Failed to save output");
        JobResult::new(
            line_number,
            input_name,
            JobStatus::Failed,
            format!("Download failed: {}", e),
        )
        .with_source(source)
    }
}

/// Everything downloaded for one journal in single-journal mode
#[derive(Debug, Clone)]
pub struct JournalDownload {
    pub source: ResolvedSource,
    pub records: Vec<WorkRecord>,
    pub pages_requested: u32,
    /// Pages dropped after exhausting retries, ascending
    pub failed_pages: Vec<u32>,
}

impl JournalDownload {
    pub fn is_partial(&self) -> bool {
        !self.failed_pages.is_empty()
    }
}

/// Fetch and normalize every work of a journal without touching the disk.
///
/// Used by single-journal mode. `Ok(None)` means the name did not resolve.
pub async fn download_journal(
    client: &OpenAlexClient,
    input_name: &str,
    workers: usize,
) -> Result<Option<JournalDownload>> {
    let Some(source) = client.resolve_source(input_name).await? else {
        return Ok(None);
    };

    let total_count = client.count_works(&source.identifier).await?;
    if total_count == 0 {
        return Ok(Some(JournalDownload {
            source,
            records: Vec::new(),
            pages_requested: 0,
            failed_pages: Vec::new(),
        }));
    }

    let fetched = client
        .fetch_all(&source.identifier, total_count, workers)
        .await;
    Ok(Some(JournalDownload {
        source,
        records: normalize_all(&fetched.works),
        pages_requested: fetched.pages_requested,
        failed_pages: fetched.failed_pages,
    }))
}
