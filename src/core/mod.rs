pub mod aggregate;
pub mod dedupe;
pub mod etl;
pub mod normalize;
pub mod sanitize;

pub use crate::domain::model::{MetricsReport, RawWork, Tally, Work, YearCount};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, Summarize};
pub use crate::utils::error::Result;
