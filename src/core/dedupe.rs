//! Collapses duplicate OpenAlex records of the same paper (preprint plus
//! published version, repository copies, chapter reprints).

use crate::domain::model::{lenient, RawWork};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

const HAL_PMH_PREFIX: &str = "pmh:oai:HAL:";

static LEADING_CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*[.\-:)]\s*").expect("chapter pattern is valid"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupeKey {
    Doi(String),
    Hal(String),
    Fuzzy(String),
}

pub fn normalize_doi(doi: &str) -> Option<String> {
    let d = doi
        .trim()
        .to_lowercase()
        .replace("https://doi.org/", "")
        .replace("http://doi.org/", "")
        .replace("doi:", "");
    (!d.is_empty()).then_some(d)
}

pub fn work_doi(work: &RawWork) -> Option<String> {
    work.str_field("doi")
        .and_then(normalize_doi)
        .or_else(|| {
            work.object("ids")
                .and_then(|ids| ids.get("doi"))
                .and_then(Value::as_str)
                .and_then(normalize_doi)
        })
}

/// HAL OAI-PMH identifier from any location of the work.
pub fn work_hal_id(work: &RawWork) -> Option<String> {
    let location_id = |loc: &Value| {
        loc.get("id")
            .and_then(Value::as_str)
            .filter(|id| id.starts_with(HAL_PMH_PREFIX))
            .map(str::to_string)
    };

    work.array("locations")
        .iter()
        .find_map(location_id)
        .or_else(|| work.field("primary_location").and_then(location_id))
}

pub fn normalize_title(title: &str) -> String {
    let t = title.trim().to_lowercase();
    let t = LEADING_CHAPTER_RE.replace(&t, "");
    let t = WHITESPACE_RE.replace_all(&t, " ");
    let t = PUNCTUATION_RE.replace_all(&t, "");
    t.trim().to_string()
}

fn first_author(work: &RawWork) -> String {
    work.array("authorships")
        .first()
        .and_then(|a| a.get("author"))
        .and_then(|author| author.get("display_name"))
        .and_then(Value::as_str)
        .map(|name| name.trim().to_lowercase())
        .unwrap_or_default()
}

pub fn dedupe_key(work: &RawWork) -> DedupeKey {
    if let Some(doi) = work_doi(work) {
        return DedupeKey::Doi(doi);
    }
    if let Some(hal) = work_hal_id(work) {
        return DedupeKey::Hal(hal);
    }

    let title = work
        .str_field("title")
        .filter(|t| !t.trim().is_empty())
        .or_else(|| work.str_field("display_name"))
        .unwrap_or("");
    let year = work
        .field("publication_year")
        .and_then(lenient::as_i64)
        .map(|y| y.to_string())
        .unwrap_or_else(|| "None".to_string());

    DedupeKey::Fuzzy(format!(
        "{}|{}|{}",
        normalize_title(title),
        year,
        first_author(work)
    ))
}

/// Higher is better: has a DOI, then citations, then a non-repository source.
fn score(work: &RawWork) -> (bool, u64, bool) {
    let has_doi = work_doi(work).is_some();
    let cites = work
        .field("cited_by_count")
        .and_then(lenient::as_u64)
        .unwrap_or(0);

    let source_type = work
        .object("best_oa_location")
        .or_else(|| work.object("primary_location"))
        .and_then(|loc| loc.get("source"))
        .and_then(|src| src.get("type"))
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .unwrap_or_default();

    (has_doi, cites, source_type != "repository")
}

/// Keeps one work per key, in first-seen key order.
pub fn dedupe_works(works: Vec<RawWork>) -> Vec<RawWork> {
    let mut order: Vec<DedupeKey> = Vec::new();
    let mut buckets: HashMap<DedupeKey, Vec<RawWork>> = HashMap::new();

    for work in works {
        let key = dedupe_key(&work);
        let bucket = buckets.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        bucket.push(work);
    }

    let total: usize = buckets.values().map(Vec::len).sum();
    let deduped: Vec<RawWork> = order
        .into_iter()
        .filter_map(|key| buckets.remove(&key))
        .filter_map(|group| {
            if group.len() > 1 {
                tracing::debug!("Merging {} duplicate records", group.len());
            }
            // first of the equally-scored works wins
            group
                .into_iter()
                .rev()
                .max_by_key(score)
        })
        .collect();

    if deduped.len() < total {
        tracing::info!("🧹 Deduplicated {} works down to {}", total, deduped.len());
    }

    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn work(value: Value) -> RawWork {
        RawWork::new(value)
    }

    #[test]
    fn test_normalize_doi() {
        assert_eq!(normalize_doi("https://doi.org/10.1/ABC").as_deref(), Some("10.1/abc"));
        assert_eq!(normalize_doi("doi:10.1/x").as_deref(), Some("10.1/x"));
        assert_eq!(normalize_doi("   "), None);
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("17. Deep   Learning: A Survey!"), "deep learning a survey");
        assert_eq!(normalize_title("3) Intro"), "intro");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_key_prefers_doi_then_hal_then_title() {
        let by_doi = work(json!({"ids": {"doi": "https://doi.org/10.1/X"}}));
        assert_eq!(dedupe_key(&by_doi), DedupeKey::Doi("10.1/x".to_string()));

        let by_hal = work(json!({
            "locations": [{"id": "pmh:oai:arXiv.org:1"}, {"id": "pmh:oai:HAL:hal-1"}]
        }));
        assert_eq!(dedupe_key(&by_hal), DedupeKey::Hal("pmh:oai:HAL:hal-1".to_string()));

        let fuzzy = work(json!({
            "display_name": "1 - Graphs.",
            "publication_year": 2020,
            "authorships": [{"author": {"display_name": "Ada Lovelace"}}]
        }));
        assert_eq!(
            dedupe_key(&fuzzy),
            DedupeKey::Fuzzy("graphs|2020|ada lovelace".to_string())
        );
    }

    #[test]
    fn test_blank_fields_fall_through_to_alternatives() {
        let blank_doi = work(json!({"doi": "", "ids": {"doi": "https://doi.org/10.1/Y"}}));
        assert_eq!(dedupe_key(&blank_doi), DedupeKey::Doi("10.1/y".to_string()));

        let blank_title = work(json!({
            "title": "  ",
            "display_name": "Graphs",
            "publication_year": 2021
        }));
        assert_eq!(
            dedupe_key(&blank_title),
            DedupeKey::Fuzzy("graphs|2021|".to_string())
        );
    }

    #[test]
    fn test_dedupe_prefers_doi_then_citations_then_publisher() {
        let works = vec![
            work(json!({"id": "W1", "title": "Same Paper", "publication_year": 2021, "cited_by_count": 50})),
            work(json!({"id": "W2", "title": "Same  paper!", "publication_year": 2021, "cited_by_count": 3})),
            work(json!({"id": "W3", "doi": "10.1/a", "cited_by_count": 1,
                "primary_location": {"source": {"type": "repository"}}})),
            work(json!({"id": "W4", "doi": "https://doi.org/10.1/A", "cited_by_count": 1,
                "primary_location": {"source": {"type": "journal"}}})),
            work(json!({"id": "W5", "doi": "10.2/b", "cited_by_count": 2})),
        ];

        let deduped = dedupe_works(works);
        let ids: Vec<_> = deduped.iter().filter_map(|w| w.str_field("id")).collect();
        assert_eq!(ids, vec!["W1", "W4", "W5"]);
    }

    #[test]
    fn test_dedupe_ties_keep_first_seen() {
        let works = vec![
            work(json!({"id": "W1", "doi": "10.1/a", "cited_by_count": 4})),
            work(json!({"id": "W2", "doi": "10.1/a", "cited_by_count": 4})),
        ];
        let deduped = dedupe_works(works);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].str_field("id"), Some("W1"));
    }
}
