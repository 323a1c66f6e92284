//! Cursor-paginated client for the OpenAlex `/works` endpoint.

use crate::core::ConfigProvider;
use crate::domain::model::RawWork;
use crate::utils::error::{EtlError, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const OPENALEX_BASE: &str = "https://api.openalex.org";
pub const USER_AGENT: &str = concat!("portfolio-metrics/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_PER_PAGE: usize = 200;
pub const MAX_PER_PAGE: usize = 200;

/// Fields requested for every work; everything the normalizer and the
/// deduplicator read has to be listed here.
pub const SELECT_FIELDS: &[&str] = &[
    "id",
    "doi",
    "ids",
    "title",
    "display_name",
    "publication_year",
    "publication_date",
    "type",
    "type_crossref",
    "cited_by_count",
    "counts_by_year",
    "fwci",
    "citation_normalized_percentile",
    "cited_by_percentile_year",
    "primary_location",
    "locations",
    "best_oa_location",
    "open_access",
    "primary_topic",
    "topics",
    "keywords",
    "concepts",
    "authorships",
    "apc_list",
    "apc_paid",
    "funders",
    "awards",
    "sustainable_development_goals",
    "updated_date",
];

#[derive(Debug, Deserialize)]
struct WorksPage {
    #[serde(default)]
    results: Vec<RawWork>,
    #[serde(default)]
    meta: PageMeta,
}

#[derive(Debug, Default, Deserialize)]
struct PageMeta {
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAlexClient {
    client: Client,
    base_url: String,
    mailto: Option<String>,
    per_page: usize,
    page_delay: Duration,
}

impl OpenAlexClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            mailto: None,
            per_page: DEFAULT_PER_PAGE,
            page_delay: Duration::from_millis(150),
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Ok(Self::new(config.api_base(), config.request_timeout())?
            .with_mailto(config.mailto().map(str::to_string))
            .with_per_page(config.per_page())
            .with_page_delay(config.request_delay()))
    }

    /// Joins the OpenAlex "polite pool" when an address is given.
    pub fn with_mailto(mut self, mailto: Option<String>) -> Self {
        self.mailto = mailto.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page.clamp(1, MAX_PER_PAGE);
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    async fn fetch_page(&self, author_id: &str, cursor: &str) -> Result<WorksPage> {
        let url = format!("{}/works", self.base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("filter", format!("authorships.author.id:{}", author_id)),
            ("per-page", self.per_page.to_string()),
            ("cursor", cursor.to_string()),
            ("select", SELECT_FIELDS.join(",")),
        ];
        if let Some(mailto) = &self.mailto {
            params.push(("mailto", mailto.clone()));
        }

        tracing::debug!("GET {} (cursor={})", url, cursor);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("OpenAlex error: {}", status);
            tracing::error!("{}", body);
            return Err(EtlError::HttpStatusError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<WorksPage>().await?)
    }

    /// Every work attributed to `author_id`, following `meta.next_cursor`
    /// until the API stops returning one.
    pub async fn fetch_all_works(&self, author_id: &str) -> Result<Vec<RawWork>> {
        let mut works: Vec<RawWork> = Vec::new();
        let mut cursor = "*".to_string();
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            let page = self.fetch_page(author_id, &cursor).await?;
            let batch_len = page.results.len();

            if page_number == 1 {
                if let Some(count) = page.meta.count {
                    tracing::info!("📚 OpenAlex reports {} works for {}", count, author_id);
                }
            }
            tracing::debug!("Page {}: {} works", page_number, batch_len);
            works.extend(page.results);

            match page.meta.next_cursor.filter(|c| !c.is_empty()) {
                Some(next) if batch_len > 0 => cursor = next,
                _ => break,
            }

            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        tracing::info!("Fetched {} works in {} page(s)", works.len(), page_number);
        Ok(works)
    }
}
