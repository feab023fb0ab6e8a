//! Normalized work records.
//!
//! [`WorkRecord::from_raw`] maps one OpenAlex work object onto the flat shape
//! written to output files. It is total: any missing or mistyped field falls
//! back to its default instead of failing.

use crate::abstract_text::reconstruct_abstract;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for authorships without a display name
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Separator used when joining author names
pub const AUTHOR_SEPARATOR: &str = "; ";

/// CSV/JSON column order of a [`WorkRecord`]
pub const WORK_COLUMNS: &[&str] = &[
    "title",
    "doi",
    "publication_date",
    "publication_year",
    "authors",
    "corresponding_authors",
    "abstract",
    "cited_by_count",
    "openalex_id",
    "type",
];

/// One publication as persisted to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub title: String,
    pub doi: String,
    pub publication_date: String,
    pub publication_year: i64,
    /// All authors in authorship order, `"; "`-joined
    pub authors: String,
    /// Authors flagged `is_corresponding`, `"; "`-joined
    pub corresponding_authors: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub cited_by_count: u64,
    /// The work's own OpenAlex id
    #[serde(rename = "openalex_id")]
    pub source_identifier: String,
    #[serde(rename = "type")]
    pub work_type: String,
}

impl WorkRecord {
    /// Normalize one raw work object.
    pub fn from_raw(work: &Value) -> Self {
        let authorships = work
            .get("authorships")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let title = str_field(work, "title")
            .or_else(|| str_field(work, "display_name"))
            .unwrap_or_default();

        Self {
            title,
            doi: str_field(work, "doi").unwrap_or_default(),
            publication_date: str_field(work, "publication_date").unwrap_or_default(),
            publication_year: work
                .get("publication_year")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            authors: all_authors(authorships).join(AUTHOR_SEPARATOR),
            corresponding_authors: corresponding_authors(authorships).join(AUTHOR_SEPARATOR),
            abstract_text: extract_abstract(work),
            cited_by_count: work
                .get("cited_by_count")
                .and_then(Value::as_u64)
                .unwrap_or(0),
            source_identifier: str_field(work, "id").unwrap_or_default(),
            work_type: str_field(work, "type").unwrap_or_default(),
        }
    }
}

/// Normalize every work of a download.
pub fn normalize_all(works: &[Value]) -> Vec<WorkRecord> {
    works.iter().map(WorkRecord::from_raw).collect()
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn author_name(authorship: &Value) -> String {
    authorship
        .get("author")
        .and_then(|a| a.get("display_name"))
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string()
}

/// Every author, in authorship order.
fn all_authors(authorships: &[Value]) -> Vec<String> {
    authorships.iter().map(author_name).collect()
}

/// Authors whose `is_corresponding` flag is true, in authorship order.
fn corresponding_authors(authorships: &[Value]) -> Vec<String> {
    authorships
        .iter()
        .filter(|a| {
            a.get("is_corresponding")
                .and_then(Value::as_bool)
                .unwrap_or(false)
        })
        .map(author_name)
        .collect()
}

/// Plain `abstract` text wins; otherwise rebuild from the inverted index.
fn extract_abstract(work: &Value) -> String {
    if let Some(text) = work.get("abstract").and_then(Value::as_str) {
        if !text.is_empty() {
            return text.to_string();
        }
    }
    work.get("abstract_inverted_index")
        .map(reconstruct_abstract)
        .unwrap_or_default()
}
