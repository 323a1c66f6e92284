//! Turns raw OpenAlex work objects into the flat [`Work`] records stored in
//! the metrics file.

use crate::domain::model::{lenient, RawWork, Work, MISSING};
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::cmp::Reverse;
use std::sync::LazyLock;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

pub const OPENALEX_PREFIX: &str = "https://openalex.org/";
const DOI_PREFIX: &str = "https://doi.org/";
const TOPICS_PER_WORK: usize = 3;
const KEYWORDS_PER_WORK: usize = 10;

static HAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhal\.science\b|\bhal\.\w+\b").expect("HAL pattern is valid")
});

/// Accepts `A504...`, `a504...`, `504...` or a full OpenAlex URL.
pub fn normalize_author_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix(OPENALEX_PREFIX)
        .or_else(|| trimmed.strip_prefix("http://openalex.org/"))
        .unwrap_or(trimmed);
    let id = stripped.trim().to_uppercase();

    if id.is_empty() {
        return Err(EtlError::MissingConfigError {
            field: "author_id".to_string(),
        });
    }

    if id.starts_with('A') {
        Ok(id)
    } else {
        Ok(format!("A{}", id))
    }
}

/// NFKD, accents dropped, whitespace collapsed, every word capitalized.
pub fn normalize_person_name(name: &str) -> String {
    let unaccented: String = name.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let collapsed = unaccented.split_whitespace().collect::<Vec<_>>().join(" ");
    title_case(&collapsed)
}

/// Capitalizes the first letter of every run of letters, lowercasing the
/// rest, so `o'neil` becomes `O'Neil` and `jean-luc` becomes `Jean-Luc`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn str_in<'a>(obj: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    obj.and_then(|o| o.get(key)).and_then(Value::as_str)
}

fn obj_in<'a>(obj: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a Map<String, Value>> {
    obj.and_then(|o| o.get(key)).and_then(Value::as_object)
}

fn strip_openalex(id: &str) -> &str {
    id.strip_prefix(OPENALEX_PREFIX).unwrap_or(id)
}

/// DOI URL, then landing page, then the OpenAlex page, then `#`.
pub fn pick_best_url(work: &RawWork) -> String {
    if let Some(doi_url) = str_in(work.object("ids"), "doi") {
        if doi_url.starts_with("http") {
            return doi_url.to_string();
        }
    }

    if let Some(landing) = str_in(work.object("primary_location"), "landing_page_url") {
        if landing.starts_with("http") {
            return landing.to_string();
        }
    }

    match work.str_field("id") {
        Some(id) if id.starts_with("http") => id.to_string(),
        Some(id) => format!("{}{}", OPENALEX_PREFIX, strip_openalex(id)),
        None => "#".to_string(),
    }
}

pub fn extract_venue(work: &RawWork) -> String {
    ["primary_location", "best_oa_location"]
        .iter()
        .filter_map(|loc| str_in(obj_in(work.object(loc), "source"), "display_name"))
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(MISSING)
        .to_string()
}

/// Best-effort scan of the URL-ish fields for a HAL link.
pub fn try_find_hal_url(work: &RawWork) -> Option<String> {
    let ids = work.object("ids");
    let location = work.object("primary_location");
    let host_venue = work.object("host_venue");

    let candidates = ["openalex", "doi", "pmid", "pmcid", "mag"]
        .iter()
        .filter_map(|k| str_in(ids, k))
        .chain(
            ["landing_page_url", "pdf_url"]
                .iter()
                .filter_map(|k| str_in(location, k)),
        )
        .chain(str_in(host_venue, "url"));

    candidates
        .filter(|u| !u.is_empty())
        .find(|u| HAL_RE.is_match(u))
        .map(str::to_string)
}

pub fn extract_oa_status(work: &RawWork) -> String {
    str_in(work.object("open_access"), "oa_status")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn extract_is_oa(work: &RawWork) -> bool {
    work.object("open_access")
        .and_then(|oa| oa.get("is_oa"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Display names of the `top_k` highest-scored entries of a scored list
/// (`topics`, `keywords`).
fn top_scored_names(entries: &[Value], top_k: usize) -> Vec<String> {
    let score = |v: &Value| v.get("score").and_then(lenient::as_f64).unwrap_or(0.0);

    let mut ranked: Vec<&Value> = entries.iter().collect();
    ranked.sort_by(|a, b| score(b).total_cmp(&score(a)));

    ranked
        .into_iter()
        .take(top_k)
        .filter_map(|entry| entry.get("display_name").and_then(Value::as_str))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn extract_topics(work: &RawWork, top_k: usize) -> Vec<String> {
    top_scored_names(work.array("topics"), top_k)
}

pub fn extract_keywords(work: &RawWork, top_k: usize) -> Vec<String> {
    top_scored_names(work.array("keywords"), top_k)
}

/// Every author on the work except `self_author_id`, canonicalized.
pub fn extract_coauthors(work: &RawWork, self_author_id: &str) -> Vec<String> {
    work.array("authorships")
        .iter()
        .filter_map(|authorship| authorship.get("author").and_then(Value::as_object))
        .filter(|author| {
            author
                .get("id")
                .and_then(Value::as_str)
                .map(|id| strip_openalex(id) != self_author_id)
                .unwrap_or(true)
        })
        .filter_map(|author| author.get("display_name").and_then(Value::as_str))
        .filter(|name| !name.trim().is_empty())
        .map(normalize_person_name)
        .collect()
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

pub fn normalize_work(work: &RawWork, self_author_id: &str) -> Work {
    let doi = non_empty(work.str_field("doi"))
        .or_else(|| non_empty(str_in(work.object("ids"), "doi")))
        .map(|d| d.replace(DOI_PREFIX, ""))
        .filter(|d| !d.is_empty());

    let work_type = non_empty(work.str_field("type"))
        .or_else(|| non_empty(work.str_field("type_crossref")))
        .unwrap_or(MISSING)
        .to_string();

    Work {
        id: work.str_field("id").map(|id| strip_openalex(id).to_string()),
        title: non_empty(work.str_field("title"))
            .unwrap_or("Untitled")
            .to_string(),
        year: work
            .field("publication_year")
            .and_then(lenient::as_i64)
            .and_then(|y| i32::try_from(y).ok()),
        venue: extract_venue(work),
        citations: work
            .field("cited_by_count")
            .and_then(lenient::as_u64)
            .unwrap_or(0),
        doi,
        url: pick_best_url(work),
        hal_url: try_find_hal_url(work),
        work_type,
        is_oa: extract_is_oa(work),
        oa_status: extract_oa_status(work),
        fwci: work.field("fwci").and_then(lenient::as_f64),
        citation_norm_percentile: work
            .object("citation_normalized_percentile")
            .and_then(|p| p.get("value"))
            .and_then(lenient::as_f64),
        topics: extract_topics(work, TOPICS_PER_WORK),
        keywords: extract_keywords(work, KEYWORDS_PER_WORK),
        coauthors: extract_coauthors(work, self_author_id),
        source: "OpenAlex".to_string(),
    }
}

/// Newest first, then most cited; works without a year sort as year 0.
pub fn sort_works(works: &mut [Work]) {
    works.sort_by_key(|w| Reverse((w.year.unwrap_or(0), w.citations)));
}
