pub mod fetch_pipeline;
pub mod site_pipeline;

pub use fetch_pipeline::FetchPipeline;
pub use site_pipeline::SitePipeline;
