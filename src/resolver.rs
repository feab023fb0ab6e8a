//! Journal name resolution.
//!
//! Ranking is left entirely to OpenAlex: the top search hit is the match.

use crate::error::Result;
use crate::openalex::{short_id, OpenAlexClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// A journal (OpenAlex source) matched from a free-text name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    /// Short OpenAlex id, e.g. `S137773608`
    pub identifier: String,
    pub display_name: String,
}

impl ResolvedSource {
    /// Build from a search candidate. Returns `None` when the candidate has no id.
    fn from_candidate(candidate: &Value, fallback_name: &str) -> Option<Self> {
        let id = candidate.get("id").and_then(Value::as_str)?;
        let display_name = candidate
            .get("display_name")
            .and_then(Value::as_str)
            .unwrap_or(fallback_name);

        Some(Self {
            identifier: short_id(id).to_string(),
            display_name: display_name.to_string(),
        })
    }
}

impl OpenAlexClient {
    /// Resolve a journal name to its best-ranked OpenAlex source.
    ///
    /// `Ok(None)` means the search came back empty, which is not an error and
    /// is not retried.
    pub async fn resolve_source(&self, name: &str) -> Result<Option<ResolvedSource>> {
        let params = [
            ("search", name.to_string()),
            ("per-page", self.config().search_candidates.to_string()),
        ];
        let response = self.get_list("search sources", "sources", &params).await?;

        debug!(journal = name, candidates = response.results.len(), "Source search done");

        let resolved = response
            .results
            .first()
            .and_then(|c| ResolvedSource::from_candidate(c, name));

        if let Some(source) = &resolved {
            info!(
                journal = name,
                id = %source.identifier,
                display_name = %source.display_name,
                "Resolved journal"
            );
        }

        Ok(resolved)
    }
}
