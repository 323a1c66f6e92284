use crate::domain::ports::Summarize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder used for missing venue / type values.
pub const MISSING: &str = "—";

/// One work object exactly as the OpenAlex API returned it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawWork {
    pub data: Value,
}

impl RawWork {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key).filter(|v| !v.is_null())
    }

    /// Nested object, treating `null` and non-objects as absent.
    pub fn object(&self, key: &str) -> Option<&Map<String, Value>> {
        self.field(key).and_then(Value::as_object)
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    pub fn array(&self, key: &str) -> &[Value] {
        self.field(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Normalized publication record, one entry of `works` in the metrics file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default = "default_title", deserialize_with = "lenient::title")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub year: Option<i32>,
    #[serde(default = "default_missing", deserialize_with = "lenient::string_or_missing")]
    pub venue: String,
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub citations: u64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub doi: Option<String>,
    #[serde(default = "default_url", deserialize_with = "lenient::url")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub hal_url: Option<String>,
    #[serde(
        rename = "type",
        default = "default_missing",
        deserialize_with = "lenient::string_or_missing"
    )]
    pub work_type: String,
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    pub is_oa: bool,
    #[serde(default = "default_oa_status", deserialize_with = "lenient::oa_status")]
    pub oa_status: String,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub fwci: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub citation_norm_percentile: Option<f64>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub topics: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub coauthors: Vec<String>,
    #[serde(default = "default_source", deserialize_with = "lenient::source")]
    pub source: String,
}

fn default_title() -> String {
    "Untitled".to_string()
}

fn default_missing() -> String {
    MISSING.to_string()
}

fn default_url() -> String {
    "#".to_string()
}

fn default_oa_status() -> String {
    "unknown".to_string()
}

fn default_source() -> String {
    "OpenAlex".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    #[serde(deserialize_with = "lenient::i32_required")]
    pub year: i32,
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    pub citations: u64,
}

/// The metrics file (`data/metrics.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub author_openalex_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub papers_tracked: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub total_citations: Option<u64>,
    #[serde(default, deserialize_with = "lenient::year_counts")]
    pub citations_by_year: Vec<YearCount>,
    #[serde(default, deserialize_with = "lenient::works")]
    pub works: Vec<Work>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "body",
        alias = "text",
        deserialize_with = "lenient::string_or_empty"
    )]
    pub html: String,
    #[serde(default, alias = "link", deserialize_with = "lenient::opt_string")]
    pub url: Option<String>,
}

/// `news.json` is either a bare list or `{"items": [...]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NewsFile {
    List(#[serde(deserialize_with = "lenient::news_array")] Vec<NewsItem>),
    Wrapped {
        #[serde(default, deserialize_with = "lenient::news_items")]
        items: Vec<NewsItem>,
    },
}

impl NewsFile {
    pub fn into_items(self) -> Vec<NewsItem> {
        match self {
            NewsFile::List(items) | NewsFile::Wrapped { items } => items,
        }
    }
}

/// Occurrence count of one label (venue, coauthor, topic...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub label: String,
    pub count: usize,
}

impl Tally {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Everything the site pipeline managed to read from the data directory.
#[derive(Debug, Clone)]
pub struct SiteInputs {
    pub metrics: Result<MetricsReport, String>,
    /// The metrics file exactly as read, kept only when it parsed.
    pub metrics_source: Option<Vec<u8>>,
    pub news: Result<Vec<NewsItem>, String>,
}

/// Files produced by the site pipeline, ready to be written.
#[derive(Debug, Clone)]
pub struct SiteArtifacts {
    pub index_html: String,
    pub works_csv: Option<String>,
    pub metrics_json: Option<Vec<u8>>,
}

impl Summarize for Vec<RawWork> {
    fn summary(&self) -> String {
        format!("{} raw works", self.len())
    }
}

impl Summarize for MetricsReport {
    fn summary(&self) -> String {
        format!(
            "{} works, {} citations",
            self.works.len(),
            self.total_citations.unwrap_or(0)
        )
    }
}

impl Summarize for SiteInputs {
    fn summary(&self) -> String {
        let metrics = match &self.metrics {
            Ok(report) => format!("{} works", report.works.len()),
            Err(_) => "metrics unavailable".to_string(),
        };
        let news = match &self.news {
            Ok(items) => format!("{} news items", items.len()),
            Err(_) => "news unavailable".to_string(),
        };
        format!("{}, {}", metrics, news)
    }
}

impl Summarize for SiteArtifacts {
    fn summary(&self) -> String {
        format!(
            "index.html ({} bytes){}",
            self.index_html.len(),
            if self.works_csv.is_some() { " + works.csv" } else { "" }
        )
    }
}

/// Type coercion for the loosely-typed JSON files. Anything malformed
/// degrades to the field default instead of failing the whole document.
pub(crate) mod lenient {
    use super::{NewsItem, Work, YearCount, MISSING};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(crate) fn as_string(v: &Value) -> Option<String> {
        match v {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub(crate) fn as_f64(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite())
    }

    pub(crate) fn as_i64(v: &Value) -> Option<i64> {
        match v {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    pub(crate) fn as_u64(v: &Value) -> Option<u64> {
        as_i64(v).and_then(|n| u64::try_from(n).ok())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(as_string(&Value::deserialize(d)?))
    }

    pub fn string_or_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(as_string(&Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn string_or_missing<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(as_string(&Value::deserialize(d)?).unwrap_or_else(|| MISSING.to_string()))
    }

    pub fn title<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(as_string(&Value::deserialize(d)?).unwrap_or_else(super::default_title))
    }

    pub fn url<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(as_string(&Value::deserialize(d)?).unwrap_or_else(super::default_url))
    }

    pub fn oa_status<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(as_string(&Value::deserialize(d)?)
            .map(|s| s.to_lowercase())
            .unwrap_or_else(super::default_oa_status))
    }

    pub fn source<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(as_string(&Value::deserialize(d)?).unwrap_or_else(super::default_source))
    }

    pub fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        Ok(as_i64(&Value::deserialize(d)?).and_then(|n| i32::try_from(n).ok()))
    }

    pub fn i32_required<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
        as_i64(&Value::deserialize(d)?)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| serde::de::Error::custom("year is not an integer"))
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        Ok(as_u64(&Value::deserialize(d)?))
    }

    pub fn u64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        Ok(as_u64(&Value::deserialize(d)?).unwrap_or(0))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(as_f64(&Value::deserialize(d)?))
    }

    pub fn bool_or_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(matches!(Value::deserialize(d)?, Value::Bool(true)))
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.iter().filter_map(as_string).collect(),
            _ => Vec::new(),
        })
    }

    pub fn year_counts<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<YearCount>, D::Error> {
        Ok(list_of(Value::deserialize(d)?))
    }

    pub fn works<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Work>, D::Error> {
        Ok(list_of(Value::deserialize(d)?))
    }

    /// Only matches an actual array, so `{"items": [...]}` falls through to
    /// the wrapped shape.
    pub fn news_array<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<NewsItem>, D::Error> {
        let items = Vec::<Value>::deserialize(d)?;
        Ok(list_of(Value::Array(items)))
    }

    pub fn news_items<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<NewsItem>, D::Error> {
        Ok(list_of(Value::deserialize(d)?))
    }

    /// Keeps the elements that parse, skipping the rest.
    fn list_of<T: serde::de::DeserializeOwned>(value: Value) -> Vec<T> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_work_defaults_for_sparse_record() {
        let work: Work = serde_json::from_value(json!({"title": "  "})).unwrap();
        assert_eq!(work.title, "Untitled");
        assert_eq!(work.venue, MISSING);
        assert_eq!(work.citations, 0);
        assert_eq!(work.url, "#");
        assert_eq!(work.oa_status, "unknown");
        assert!(work.topics.is_empty());
        assert!(work.year.is_none());
    }

    #[test]
    fn test_work_coerces_stringly_typed_fields() {
        let work: Work = serde_json::from_value(json!({
            "year": "2021",
            "citations": "17",
            "fwci": "1.5",
            "topics": ["NLP", 3, null],
            "is_oa": "yes",
            "type": null
        }))
        .unwrap();
        assert_eq!(work.year, Some(2021));
        assert_eq!(work.citations, 17);
        assert_eq!(work.fwci, Some(1.5));
        assert_eq!(work.topics, vec!["NLP".to_string(), "3".to_string()]);
        assert!(!work.is_oa);
        assert_eq!(work.work_type, MISSING);
    }

    #[test]
    fn test_metrics_report_skips_malformed_entries() {
        let report: MetricsReport = serde_json::from_value(json!({
            "papers_tracked": "3",
            "citations_by_year": [{"year": 2020, "citations": 4}, {"year": "n/a"}],
            "works": "oops"
        }))
        .unwrap();
        assert_eq!(report.papers_tracked, Some(3));
        assert_eq!(report.total_citations, None);
        assert_eq!(report.citations_by_year.len(), 1);
        assert!(report.works.is_empty());
    }

    #[test]
    fn test_news_file_shapes() {
        let bare: NewsFile =
            serde_json::from_value(json!([{"date": "2024-01-01", "body": "<b>hi</b>"}])).unwrap();
        let items = bare.into_items();
        assert_eq!(items[0].html, "<b>hi</b>");

        let wrapped: NewsFile =
            serde_json::from_value(json!({"items": [{"title": "Talk", "link": "https://x.org"}]}))
                .unwrap();
        let items = wrapped.into_items();
        assert_eq!(items[0].url.as_deref(), Some("https://x.org"));
        assert_eq!(items[0].html, "");
    }

    #[test]
    fn test_news_file_skips_malformed_items() {
        let bare: NewsFile =
            serde_json::from_value(json!([{"title": "ok"}, "oops", 3, null, {"html": "<b>x</b>"}]))
                .unwrap();
        let items = bare.into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("ok"));
        assert_eq!(items[1].html, "<b>x</b>");

        let wrapped: NewsFile =
            serde_json::from_value(json!({"items": ["oops", {"date": "2024-01-01"}]})).unwrap();
        let items = wrapped.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_raw_work_treats_null_as_absent() {
        let raw = RawWork::new(json!({"ids": null, "topics": [1, 2]}));
        assert!(raw.object("ids").is_none());
        assert_eq!(raw.array("topics").len(), 2);
        assert!(raw.array("keywords").is_empty());
    }
}
