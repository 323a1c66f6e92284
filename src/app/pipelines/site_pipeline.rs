use crate::config::{join_path, BUNDLE_FILE, INDEX_FILE, METRICS_FILE, NEWS_FILE, WORKS_CSV_FILE};
use crate::core::{ConfigProvider, MetricsReport, Pipeline, Storage};
use crate::domain::model::{NewsFile, NewsItem, SiteArtifacts, SiteInputs};
use crate::render::{render_page, works_csv, PageInput};
use crate::utils::error::{EtlError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// `metrics.json` + `news.json` → `index.html`, `works.csv`, optional `site.zip`.
pub struct SitePipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

fn is_not_found(err: &EtlError) -> bool {
    matches!(err, EtlError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
}

impl<S: Storage, C: ConfigProvider> SitePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn output_file(&self, file: &str) -> String {
        join_path(self.config.output_dir(), file)
    }

    /// The parsed report together with the bytes it was parsed from.
    async fn read_metrics(&self) -> std::result::Result<(MetricsReport, Vec<u8>), String> {
        let path = join_path(self.config.data_dir(), METRICS_FILE);
        let bytes = self
            .storage
            .read_file(&path)
            .await
            .map_err(|e| format!("cannot read {}: {}", path, e))?;
        let report = serde_json::from_slice(&bytes)
            .map_err(|e| format!("cannot parse {}: {}", path, e))?;
        Ok((report, bytes))
    }

    /// A missing news file just means there is no news yet.
    async fn read_news(&self) -> std::result::Result<Vec<NewsItem>, String> {
        let path = join_path(self.config.data_dir(), NEWS_FILE);
        let bytes = match self.storage.read_file(&path).await {
            Ok(bytes) => bytes,
            Err(e) if is_not_found(&e) => {
                tracing::debug!("No news file at {}", path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(format!("cannot read {}: {}", path, e)),
        };
        serde_json::from_slice::<NewsFile>(&bytes)
            .map(NewsFile::into_items)
            .map_err(|e| format!("cannot parse {}: {}", path, e))
    }

    fn build_bundle(&self, artifacts: &SiteArtifacts) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>(INDEX_FILE, FileOptions::default())?;
        zip.write_all(artifacts.index_html.as_bytes())?;

        if let Some(csv) = &artifacts.works_csv {
            zip.start_file::<_, ()>(WORKS_CSV_FILE, FileOptions::default())?;
            zip.write_all(csv.as_bytes())?;
        }

        if let Some(json) = &artifacts.metrics_json {
            zip.start_file::<_, ()>(METRICS_FILE, FileOptions::default())?;
            zip.write_all(json)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SitePipeline<S, C> {
    type Extracted = SiteInputs;
    type Transformed = SiteArtifacts;

    async fn extract(&self) -> Result<SiteInputs> {
        let (metrics, metrics_source) = match self.read_metrics().await {
            Ok((report, bytes)) => (Ok(report), Some(bytes)),
            Err(reason) => {
                tracing::warn!("⚠️ Metrics unavailable: {}", reason);
                (Err(reason), None)
            }
        };

        let news = self.read_news().await;
        if let Err(reason) = &news {
            tracing::warn!("⚠️ News unavailable: {}", reason);
        }

        Ok(SiteInputs {
            metrics,
            metrics_source,
            news,
        })
    }

    async fn transform(&self, inputs: SiteInputs) -> Result<SiteArtifacts> {
        let index_html = render_page(&PageInput {
            title: self.config.site_title(),
            metrics: inputs.metrics.as_ref().map_err(String::as_str),
            news: inputs
                .news
                .as_ref()
                .map(Vec::as_slice)
                .map_err(String::as_str),
            top_n: self.config.top_n(),
        });

        let works_csv = match &inputs.metrics {
            Ok(report) => Some(works_csv(&report.works)?),
            Err(_) => None,
        };

        Ok(SiteArtifacts {
            index_html,
            works_csv,
            metrics_json: inputs.metrics_source,
        })
    }

    async fn load(&self, artifacts: SiteArtifacts) -> Result<String> {
        let index_path = self.output_file(INDEX_FILE);
        self.storage
            .write_file(&index_path, artifacts.index_html.as_bytes())
            .await?;

        if let Some(csv) = &artifacts.works_csv {
            self.storage
                .write_file(&self.output_file(WORKS_CSV_FILE), csv.as_bytes())
                .await?;
        }

        if self.config.bundle() {
            let bundle = self.build_bundle(&artifacts)?;
            tracing::debug!("Writing bundle ({} bytes)", bundle.len());
            self.storage
                .write_file(&self.output_file(BUNDLE_FILE), &bundle)
                .await?;
        }

        Ok(index_path)
    }
}
