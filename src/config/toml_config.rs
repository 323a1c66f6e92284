use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

/// On-disk configuration (`portfolio.toml`). Every section and key is
/// optional; unset values fall back to CLI flags or built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub author: AuthorSection,
    #[serde(default)]
    pub openalex: OpenAlexSection,
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub paths: PathsSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorSection {
    pub openalex_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAlexSection {
    pub api_base: Option<String>,
    pub per_page: Option<usize>,
    pub request_delay_ms: Option<u64>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    pub title: Option<String>,
    pub top_n: Option<usize>,
    pub bundle: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    pub data_dir: Option<String>,
    pub output_dir: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses TOML after replacing `${VAR}` with environment values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Unset variables are left as written so validation can point at them.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[author]
openalex_id = "A123"
email = "me@example.org"

[openalex]
api_base = "https://api.openalex.org"
per_page = 100
request_delay_ms = 0

[site]
title = "Jane Doe"
top_n = 5
bundle = true

[paths]
data_dir = "public/data"
output_dir = "public"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.author.openalex_id.as_deref(), Some("A123"));
        assert_eq!(config.openalex.per_page, Some(100));
        assert_eq!(config.site.top_n, Some(5));
        assert_eq!(config.site.bundle, Some(true));
        assert_eq!(config.paths.output_dir.as_deref(), Some("public"));
        assert!(config.openalex.timeout_seconds.is_none());
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.author.openalex_id.is_none());
        assert!(config.site.title.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PORTFOLIO_TEST_AUTHOR", "A999");

        let toml_content = r#"
[author]
openalex_id = "${PORTFOLIO_TEST_AUTHOR}"
email = "${PORTFOLIO_TEST_UNSET_EMAIL}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.author.openalex_id.as_deref(), Some("A999"));
        assert_eq!(
            config.author.email.as_deref(),
            Some("${PORTFOLIO_TEST_UNSET_EMAIL}")
        );

        std::env::remove_var("PORTFOLIO_TEST_AUTHOR");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = TomlConfig::from_toml_str("[site]\ntitel = \"typo\"\n").unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[site]\ntitle = \"From file\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.site.title.as_deref(), Some("From file"));
    }
}
