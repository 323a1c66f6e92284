use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn author_id(&self) -> &str;
    fn mailto(&self) -> Option<&str>;
    fn per_page(&self) -> usize;
    fn request_delay(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
    fn data_dir(&self) -> &str;
    fn output_dir(&self) -> &str;
    fn top_n(&self) -> usize;
    fn site_title(&self) -> &str;
    fn bundle(&self) -> bool;
}

/// Phase counts reported by the engine after each step.
pub trait Summarize {
    fn summary(&self) -> String;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Summarize + Send;
    type Transformed: Summarize + Send;

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<String>;
}
