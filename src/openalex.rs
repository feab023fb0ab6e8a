//! OpenAlex API client
//!
//! Thin transport layer shared by the source resolver and the works fetcher.
//!
//! API Best Practices (per OpenAlex docs):
//! - Use `mailto:email` parameter for polite pool (10 req/s vs 1 req/s)
//! - Use `per-page=200` for maximum results per page
//! - Implement exponential backoff for retries

use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::retry::with_retry;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Prefix of every OpenAlex entity id
const OPENALEX_ID_PREFIX: &str = "https://openalex.org/";

/// Listing response shared by `/sources` and `/works`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub meta: Option<ListMeta>,
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListMeta {
    #[serde(default)]
    pub count: Option<u64>,
}

/// Contact address for one request.
///
/// With `randomize`, `user@domain` becomes `user+abc123@domain` so that load is
/// spread over several polite-pool identities.
pub fn contact_token(base: &str, randomize: bool) -> String {
    if !randomize {
        return base.to_string();
    }

    let (user, domain) = base.split_once('@').unwrap_or((base, "outlook.com"));
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(|b| (b as char).to_ascii_lowercase())
        .take(6)
        .collect();

    format!("{}+{}@{}", user, suffix, domain)
}

/// Strip the `https://openalex.org/` prefix from an entity id.
pub fn short_id(id: &str) -> &str {
    id.strip_prefix(OPENALEX_ID_PREFIX).unwrap_or(id)
}

/// Filter expression selecting the works of one source.
pub fn works_filter(source_id: &str) -> String {
    format!("primary_location.source.id:{}", short_id(source_id))
}

/// Shared HTTP client with retry and pacing.
#[derive(Debug, Clone)]
pub struct OpenAlexClient {
    http: Client,
    config: Arc<HarvestConfig>,
}

impl OpenAlexClient {
    /// Build a client from a validated configuration.
    pub fn new(config: Arc<HarvestConfig>) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!(
                "journal-harvest/{} (mailto:{})",
                env!("CARGO_PKG_VERSION"),
                config.contact_email
            ))
            .build()
            .map_err(|e| HarvestError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Build an endpoint URL; a fresh `mailto` token is appended.
    pub(crate) fn endpoint_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let base = format!("{}/{}", self.config.api_base, path.trim_start_matches('/'));
        let mailto = contact_token(&self.config.contact_email, self.config.randomize_contact);

        let pairs = params
            .iter()
            .map(|(k, v)| (*k, v.as_str()))
            .chain(std::iter::once(("mailto", mailto.as_str())));

        Url::parse_with_params(&base, pairs)
            .map_err(|e| HarvestError::Config(format!("Invalid API URL {}: {}", base, e)))
    }

    /// GET a listing endpoint, retrying transient failures.
    ///
    /// Each attempt waits `request_delay` first and carries its own contact token.
    pub(crate) async fn get_list(
        &self,
        label: &str,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<ListResponse> {
        let client = self;
        with_retry(self.config.retry, label, move || async move {
            if !client.config.request_delay.is_zero() {
                tokio::time::sleep(client.config.request_delay).await;
            }
            let url = client.endpoint_url(path, params)?;
            client.fetch_once(url).await
        })
        .await
    }

    async fn fetch_once(&self, url: Url) -> Result<ListResponse> {
        debug!(url = %url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(HarvestError::RateLimited);
        }

        if !status.is_success() {
            return Err(HarvestError::Api {
                code: status.as_u16(),
                message: format!("OpenAlex API error: {}", status),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| HarvestError::Parse(format!("Failed to parse OpenAlex response: {}", e)))
    }
}
