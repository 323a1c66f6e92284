#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::openalex::{MAX_PER_PAGE, OPENALEX_BASE};
use crate::core::normalize::normalize_author_id;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_author_id, validate_email, validate_non_empty_string, validate_path,
    validate_positive_number, validate_range, validate_url, Validate,
};
use std::time::Duration;
use toml_config::TomlConfig;

pub const DEFAULT_AUTHOR_ID: &str = "A5042578790";
pub const METRICS_FILE: &str = "metrics.json";
pub const NEWS_FILE: &str = "news.json";
pub const INDEX_FILE: &str = "index.html";
pub const WORKS_CSV_FILE: &str = "works.csv";
pub const BUNDLE_FILE: &str = "site.zip";

/// Fully resolved settings: defaults, then the TOML file, then CLI/env.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub author_id: String,
    pub mailto: Option<String>,
    pub per_page: usize,
    pub request_delay_ms: u64,
    pub timeout_seconds: u64,
    pub data_dir: String,
    pub output_dir: String,
    pub top_n: usize,
    pub site_title: String,
    pub bundle: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: OPENALEX_BASE.to_string(),
            author_id: DEFAULT_AUTHOR_ID.to_string(),
            mailto: None,
            per_page: 200,
            request_delay_ms: 150,
            timeout_seconds: 30,
            data_dir: "data".to_string(),
            output_dir: "site".to_string(),
            top_n: 10,
            site_title: "Publications & Metrics".to_string(),
            bundle: false,
        }
    }
}

/// Joins a storage key; an empty directory means the storage root.
pub fn join_path(dir: &str, file: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", dir, file)
    }
}

impl Settings {
    pub fn apply_toml(&mut self, config: &TomlConfig) {
        if let Some(id) = &config.author.openalex_id {
            self.author_id = id.clone();
        }
        if let Some(email) = &config.author.email {
            self.mailto = Some(email.clone());
        }
        if let Some(api_base) = &config.openalex.api_base {
            self.api_base = api_base.clone();
        }
        if let Some(per_page) = config.openalex.per_page {
            self.per_page = per_page;
        }
        if let Some(delay) = config.openalex.request_delay_ms {
            self.request_delay_ms = delay;
        }
        if let Some(timeout) = config.openalex.timeout_seconds {
            self.timeout_seconds = timeout;
        }
        if let Some(title) = &config.site.title {
            self.site_title = title.clone();
        }
        if let Some(top_n) = config.site.top_n {
            self.top_n = top_n;
        }
        if let Some(bundle) = config.site.bundle {
            self.bundle = bundle;
        }
        if let Some(data_dir) = &config.paths.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(output_dir) = &config.paths.output_dir {
            self.output_dir = output_dir.clone();
        }
    }

    /// Canonicalizes the author id; call once all layers are applied.
    pub fn finalize(mut self) -> Result<Self> {
        self.author_id = normalize_author_id(&self.author_id)?;
        self.mailto = self.mailto.filter(|m| !m.trim().is_empty());
        Ok(self)
    }
}

impl ConfigProvider for Settings {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn author_id(&self) -> &str {
        &self.author_id
    }

    fn mailto(&self) -> Option<&str> {
        self.mailto.as_deref()
    }

    fn per_page(&self) -> usize {
        self.per_page
    }

    fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn data_dir(&self) -> &str {
        &self.data_dir
    }

    fn output_dir(&self) -> &str {
        &self.output_dir
    }

    fn top_n(&self) -> usize {
        self.top_n
    }

    fn site_title(&self) -> &str {
        &self.site_title
    }

    fn bundle(&self) -> bool {
        self.bundle
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("api_base", &self.api_base)?;
        validate_author_id("author_id", &self.author_id)?;
        if let Some(mailto) = &self.mailto {
            validate_email("mailto", mailto)?;
        }
        validate_range("per_page", self.per_page, 1, MAX_PER_PAGE)?;
        validate_positive_number("timeout_seconds", self.timeout_seconds as usize, 1)?;
        validate_positive_number("top_n", self.top_n, 1)?;
        validate_path("data_dir", &self.data_dir)?;
        validate_path("output_dir", &self.output_dir)?;
        validate_non_empty_string("site_title", &self.site_title)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default().finalize().unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(join_path(&settings.data_dir, METRICS_FILE), "data/metrics.json");
        assert_eq!(join_path(&settings.output_dir, INDEX_FILE), "site/index.html");
    }

    #[test]
    fn test_toml_layer_overrides_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[author]
openalex_id = "https://openalex.org/a42"

[paths]
data_dir = "public/data/"

[site]
top_n = 3
"#,
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.apply_toml(&config);
        let settings = settings.finalize().unwrap();

        assert_eq!(settings.author_id, "A42");
        assert_eq!(join_path(&settings.data_dir, NEWS_FILE), "public/data/news.json");
        assert_eq!(settings.top_n, 3);
        assert_eq!(settings.per_page, 200);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.per_page = 500;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.api_base = "not a url".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.author_id = "A${OPENALEX_AUTHOR_ID}".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unresolved_email_placeholder_is_rejected() {
        let config = TomlConfig::from_toml_str(
            "[author]\nemail = \"${PORTFOLIO_TEST_NEVER_SET_EMAIL}\"\n",
        )
        .unwrap();
        let mut settings = Settings::default();
        settings.apply_toml(&config);
        let settings = settings.finalize().unwrap();

        assert_eq!(settings.mailto.as_deref(), Some("${PORTFOLIO_TEST_NEVER_SET_EMAIL}"));
        assert!(settings.validate().is_err());

        let settings = Settings {
            mailto: Some("me@example.org".to_string()),
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("data/", METRICS_FILE), "data/metrics.json");
        assert_eq!(join_path("", INDEX_FILE), "index.html");
    }

    #[test]
    fn test_blank_email_is_dropped() {
        let settings = Settings {
            mailto: Some("  ".to_string()),
            ..Settings::default()
        }
        .finalize()
        .unwrap();
        assert!(settings.mailto.is_none());
    }
}
