//! Batch runs over a journal list.
//!
//! Journals are processed strictly one after another, in input order. The
//! progress log is rewritten every `checkpoint_every` jobs and once more at the
//! end, so on disk it is always a prefix of the real progress.

use crate::config::BatchConfig;
use crate::error::Result;
use crate::job::{JobResult, JobRunner, JobStatus};
use crate::output::write_json_atomic;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Read journal names, one per line. Blank lines are dropped.
pub fn read_journal_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_journal_list(&content))
}

/// Trimmed, non-blank lines of `content`.
pub fn parse_journal_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// `(line_number, name)` pairs for the inclusive 1-indexed range `[start, end]`.
///
/// `start` is clamped to 1 and `end` to the list length; an inverted range is empty.
pub fn select_range(journals: &[String], start: usize, end: Option<usize>) -> Vec<(usize, &str)> {
    let start = start.max(1);
    let end = end.unwrap_or(journals.len()).min(journals.len());
    if start > end {
        return Vec::new();
    }

    journals[start - 1..end]
        .iter()
        .enumerate()
        .map(|(idx, name)| (start + idx, name.as_str()))
        .collect()
}

/// Append-only job results with periodic whole-file checkpoints.
#[derive(Debug)]
pub struct ProgressLog {
    path: PathBuf,
    checkpoint_every: usize,
    results: Vec<JobResult>,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>, checkpoint_every: usize) -> Self {
        Self {
            path: path.into(),
            checkpoint_every: checkpoint_every.max(1),
            results: Vec::new(),
        }
    }

    /// Append a result; returns `true` when this triggered a checkpoint.
    pub fn record(&mut self, result: JobResult) -> Result<bool> {
        self.results.push(result);
        if self.results.len() % self.checkpoint_every == 0 {
            self.save()?;
            debug!(entries = self.results.len(), "Progress checkpoint");
            return Ok(true);
        }
        Ok(false)
    }

    /// Write the complete log and hand back the results.
    pub fn finish(self) -> Result<Vec<JobResult>> {
        self.save()?;
        Ok(self.results)
    }

    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(&self.path, &self.results)
    }
}

/// Aggregate counts over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub failed: usize,
    /// Successful jobs that dropped pages
    pub partial: usize,
    /// Articles across success and skipped jobs
    pub articles: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn from_results(results: &[JobResult], elapsed: Duration) -> Self {
        let mut summary = Self {
            total: results.len(),
            elapsed,
            ..Default::default()
        };

        for result in results {
            match result.status {
                JobStatus::Success => summary.success += 1,
                JobStatus::Skipped => summary.skipped += 1,
                JobStatus::NotFound => summary.not_found += 1,
                JobStatus::Failed => summary.failed += 1,
            }
            if result.partial {
                summary.partial += 1;
            }
            if result.status.has_output() {
                summary.articles += result.article_count.unwrap_or(0);
            }
        }

        summary
    }

    /// Mean wall time per journal.
    pub fn average_per_journal(&self) -> Duration {
        match u32::try_from(self.total) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.elapsed / n,
        }
    }
}

/// Drives a [`JobRunner`] over a range of the input list.
pub struct BatchRunner {
    runner: JobRunner,
    config: BatchConfig,
}

impl BatchRunner {
    pub fn new(runner: JobRunner, config: BatchConfig) -> Self {
        Self { runner, config }
    }

    /// Pause to take after a job with this outcome.
    pub fn pause_after(&self, status: JobStatus) -> Duration {
        match status {
            JobStatus::Success => self.config.success_pause,
            _ => self.config.idle_pause,
        }
    }

    /// Process every selected journal and write the final log.
    ///
    /// Individual journal failures and failed checkpoints never abort the run;
    /// only failing to write the final log does.
    pub async fn run(&self, journals: &[String]) -> Result<BatchSummary> {
        fs::create_dir_all(self.runner.output_dir())?;

        let selected = select_range(journals, self.config.start, self.config.end);
        info!(
            total_in_file = journals.len(),
            to_process = selected.len(),
            start = self.config.start,
            output_dir = %self.runner.output_dir().display(),
            log = %self.config.log_path.display(),
            "Starting batch"
        );

        let started = Instant::now();
        let mut log = ProgressLog::new(&self.config.log_path, self.config.checkpoint_every);

        for (line_number, name) in selected {
            let result = self.runner.run(line_number, name).await;
            let pause = self.pause_after(result.status);
            if let Err(e) = log.record(result) {
                warn!(
                    line = line_number,
                    log = %self.config.log_path.display(),
                    error = %e,
                    "Progress checkpoint failed"
                );
            }

            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        let results = log.finish()?;
        let summary = BatchSummary::from_results(&results, started.elapsed());
        info!(
            total = summary.total,
            success = summary.success,
            skipped = summary.skipped,
            not_found = summary.not_found,
            failed = summary.failed,
            articles = summary.articles,
            "Batch complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HarvestConfig;
    use crate::openalex::OpenAlexClient;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn result(line: usize, status: JobStatus, count: Option<usize>) -> JobResult {
        JobResult {
            line_number: line,
            input_name: format!("Journal {}", line),
            journal_display_name: None,
            source_id: None,
            status,
            article_count: count,
            partial: false,
            message: String::new(),
        }
    }

    fn read_log(path: &Path) -> Vec<JobResult> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_journal_list_skips_blanks() {
        let list = parse_journal_list("Nature\n\n  \nFake Journal Name Zzzyx  \r\nScience\n");
        assert_eq!(list, vec!["Nature", "Fake Journal Name Zzzyx", "Science"]);
    }

    #[test]
    fn test_select_range() {
        let list: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            select_range(&list, 1, None),
            vec![(1, "a"), (2, "b"), (3, "c"), (4, "d")]
        );
        assert_eq!(select_range(&list, 2, Some(3)), vec![(2, "b"), (3, "c")]);
        assert_eq!(select_range(&list, 0, Some(1)), vec![(1, "a")]);
        assert_eq!(select_range(&list, 3, Some(99)), vec![(3, "c"), (4, "d")]);
        assert!(select_range(&list, 4, Some(2)).is_empty());
        assert!(select_range(&list, 9, None).is_empty());
    }

    #[test]
    fn test_checkpoints_every_ten() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("batch_log.json");
        let mut log = ProgressLog::new(&path, 10);

        let mut checkpoints = Vec::new();
        for line in 1..=25 {
            if log.record(result(line, JobStatus::Success, Some(1)))? {
                checkpoints.push(line);
                assert_eq!(read_log(&path).len(), line);
            }
        }
        assert_eq!(checkpoints, vec![10, 20]);
        assert_eq!(read_log(&path).len(), 20);

        let results = log.finish()?;
        assert_eq!(results.len(), 25);
        assert_eq!(read_log(&path).len(), 25);
        Ok(())
    }

    #[test]
    fn test_crash_leaves_last_checkpoint() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("batch_log.json");
        {
            let mut log = ProgressLog::new(&path, 10);
            for line in 1..=12 {
                log.record(result(line, JobStatus::Skipped, Some(3)))?;
            }
            // dropped without finish()
        }

        let on_disk = read_log(&path);
        assert_eq!(on_disk.len(), 10);
        let lines: Vec<usize> = on_disk.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, (1..=10).collect::<Vec<_>>());
        Ok(())
    }

    fn runner_with_pauses(success_pause: Duration, idle_pause: Duration) -> BatchRunner {
        let client = OpenAlexClient::new(Arc::new(HarvestConfig::single())).unwrap();
        let config = BatchConfig {
            success_pause,
            idle_pause,
            ..Default::default()
        };
        BatchRunner::new(JobRunner::new(client, "output", 1), config)
    }

    #[test]
    fn test_pause_after_success_is_longer() {
        let runner = runner_with_pauses(Duration::from_secs(2), Duration::from_millis(500));
        assert_eq!(runner.pause_after(JobStatus::Success), Duration::from_secs(2));
        for status in [JobStatus::Skipped, JobStatus::NotFound, JobStatus::Failed] {
            assert_eq!(runner.pause_after(status), Duration::from_millis(500));
        }
    }

    #[test]
    fn test_default_pauses() {
        let config = BatchConfig::default();
        assert!(config.success_pause > config.idle_pause);
    }

    #[test]
    fn test_log_in_missing_directory() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("logs").join("batch_log.json");
        let mut log = ProgressLog::new(&path, 2);
        log.record(result(1, JobStatus::Skipped, Some(1)))?;
        assert!(log.record(result(2, JobStatus::Skipped, Some(1)))?);
        log.record(result(3, JobStatus::Skipped, Some(1)))?;
        log.finish()?;
        assert_eq!(read_log(&path).len(), 3);
        Ok(())
    }

    #[test]
    fn test_summary_counts() {
        let mut partial = result(5, JobStatus::Success, Some(7));
        partial.partial = true;
        let results = vec![
            result(1, JobStatus::Success, Some(100)),
            result(2, JobStatus::Skipped, Some(50)),
            result(3, JobStatus::NotFound, None),
            result(4, JobStatus::Failed, None),
            partial,
        ];
        let summary = BatchSummary::from_results(&results, Duration::from_secs(10));
        assert_eq!(summary.total, 5);
        assert_eq!(summary.success, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.partial, 1);
        assert_eq!(summary.articles, 157);
        assert_eq!(summary.average_per_journal(), Duration::from_secs(2));
    }

    #[test]
    fn test_empty_summary_average() {
        let summary = BatchSummary::from_results(&[], Duration::from_secs(3));
        assert_eq!(summary.average_per_journal(), Duration::ZERO);
    }
}
