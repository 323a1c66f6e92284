pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::{LocalStorage, OpenAlexClient};
pub use app::pipelines::{FetchPipeline, SitePipeline};
pub use config::Settings;
pub use core::etl::EtlEngine;
pub use utils::error::{EtlError, Result};
