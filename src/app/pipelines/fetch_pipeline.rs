use crate::adapters::OpenAlexClient;
use crate::config::{join_path, METRICS_FILE};
use crate::core::aggregate::citations_by_year;
use crate::core::dedupe::dedupe_works;
use crate::core::normalize::{normalize_author_id, normalize_work, sort_works};
use crate::core::{ConfigProvider, MetricsReport, Pipeline, RawWork, Storage};
use crate::utils::error::Result;
use chrono::{SecondsFormat, Utc};

/// OpenAlex → dedupe → normalize → `metrics.json`.
pub struct FetchPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) client: OpenAlexClient,
}

impl<S: Storage, C: ConfigProvider> FetchPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let client = OpenAlexClient::from_config(&config)?;
        Ok(Self {
            storage,
            config,
            client,
        })
    }

    pub fn metrics_path(&self) -> String {
        join_path(self.config.data_dir(), METRICS_FILE)
    }

    /// Builds the metrics file contents from already-fetched works.
    pub fn build_report(&self, works: Vec<RawWork>) -> Result<MetricsReport> {
        let author_id = normalize_author_id(self.config.author_id())?;

        let deduped = dedupe_works(works);
        let mut papers: Vec<_> = deduped
            .iter()
            .map(|work| normalize_work(work, &author_id))
            .collect();
        sort_works(&mut papers);

        let total_citations: u64 = papers.iter().map(|p| p.citations).sum();
        let by_year = citations_by_year(&papers);

        Ok(MetricsReport {
            updated_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)),
            author_openalex_id: Some(author_id),
            papers_tracked: Some(papers.len() as u64),
            total_citations: Some(total_citations),
            citations_by_year: by_year,
            works: papers,
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for FetchPipeline<S, C> {
    type Extracted = Vec<RawWork>;
    type Transformed = MetricsReport;

    async fn extract(&self) -> Result<Vec<RawWork>> {
        let author_id = normalize_author_id(self.config.author_id())?;
        tracing::info!("🚀 Fetching works for {} from {}", author_id, self.config.api_base());
        self.client.fetch_all_works(&author_id).await
    }

    async fn transform(&self, data: Vec<RawWork>) -> Result<MetricsReport> {
        self.build_report(data)
    }

    async fn load(&self, report: MetricsReport) -> Result<String> {
        let path = self.metrics_path();
        let json = serde_json::to_vec_pretty(&report)?;
        self.storage.write_file(&path, &json).await?;

        tracing::info!(
            "[OK] Fetched {} works for {}, total citations={}",
            report.papers_tracked.unwrap_or(0),
            report.author_openalex_id.as_deref().unwrap_or("?"),
            report.total_citations.unwrap_or(0)
        );
        Ok(path)
    }
}
