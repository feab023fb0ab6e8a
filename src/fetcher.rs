//! Paged works download.
//!
//! `count_works` asks for a single-item page to read `meta.count`;
//! `fetch_all` then requests every page concurrently. Pages come back in
//! completion order and are concatenated without re-sorting.

use crate::error::Result;
use crate::openalex::{works_filter, OpenAlexClient};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Number of pages needed for `total` works at `per_page` works per page.
pub fn page_count(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(per_page));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Outcome of downloading every page of one source
#[derive(Debug, Default)]
pub struct PageFetch {
    /// Raw work objects, in page completion order
    pub works: Vec<Value>,
    /// Pages requested
    pub pages_requested: u32,
    /// Pages dropped after exhausting retries, ascending
    pub failed_pages: Vec<u32>,
}

impl PageFetch {
    /// Whether some pages were dropped.
    pub fn is_partial(&self) -> bool {
        !self.failed_pages.is_empty()
    }
}

impl OpenAlexClient {
    /// Total works OpenAlex reports for a source (0 when `meta.count` is absent).
    pub async fn count_works(&self, source_id: &str) -> Result<u64> {
        let params = [
            ("filter", works_filter(source_id)),
            ("per-page", "1".to_string()),
        ];
        let response = self.get_list("count works", "works", &params).await?;
        let count = response.meta.and_then(|m| m.count).unwrap_or(0);

        debug!(source = source_id, count, "Counted works");
        Ok(count)
    }

    /// Fetch one page (1-indexed) of a source's works.
    pub async fn fetch_page(&self, source_id: &str, page: u32) -> Result<Vec<Value>> {
        let params = [
            ("filter", works_filter(source_id)),
            ("per-page", self.config().per_page.to_string()),
            ("page", page.to_string()),
        ];
        let response = self.get_list("fetch works page", "works", &params).await?;
        Ok(response.results)
    }

    /// Download every page of a source with at most `workers` requests in flight.
    ///
    /// A page that still fails after its retries is logged and dropped; the
    /// download carries on, so fewer than `total_count` works may come back.
    pub async fn fetch_all(&self, source_id: &str, total_count: u64, workers: usize) -> PageFetch {
        let num_pages = page_count(total_count, self.config().per_page);
        info!(
            source = source_id,
            total = total_count,
            pages = num_pages,
            workers,
            "Downloading works"
        );

        let mut completed = stream::iter(1..=num_pages)
            .map(|page| async move { (page, self.fetch_page(source_id, page).await) })
            .buffer_unordered(workers.max(1));

        let mut outcome = PageFetch {
            pages_requested: num_pages,
            ..Default::default()
        };

        while let Some((page, result)) = completed.next().await {
            match result {
                Ok(works) => {
                    debug!(page, count = works.len(), "Downloaded page {}/{}", page, num_pages);
                    outcome.works.extend(works);
                }
                Err(e) => {
                    warn!(source = source_id, page, error = %e, "Dropping page");
                    outcome.failed_pages.push(page);
                }
            }
        }

        outcome.failed_pages.sort_unstable();
        info!(
            source = source_id,
            works = outcome.works.len(),
            failed_pages = outcome.failed_pages.len(),
            "Download finished"
        );
        outcome
    }
}
