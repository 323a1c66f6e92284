//! Counting helpers behind the stats bar, charts and top-N tables.

use crate::domain::model::{MetricsReport, Tally, Work, YearCount, MISSING};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

/// Occurrences of each distinct label, most frequent first, ties broken by
/// label. Blank labels and the missing-value placeholder are ignored.
pub fn count_by<I, S>(values: I) -> Vec<Tally>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for value in values {
        let label = value.as_ref().trim();
        if label.is_empty() || label == MISSING {
            continue;
        }
        *counts.entry(label.to_string()).or_insert(0) += 1;
    }

    let mut tallies: Vec<Tally> = counts
        .into_iter()
        .map(|(label, count)| Tally { label, count })
        .collect();
    tallies.sort_by(|a, b| {
        Reverse(a.count)
            .cmp(&Reverse(b.count))
            .then_with(|| a.label.cmp(&b.label))
    });
    tallies
}

pub fn top_n(mut tallies: Vec<Tally>, n: usize) -> Vec<Tally> {
    tallies.truncate(n);
    tallies
}

/// Total citations of the works published each year, oldest year first.
pub fn citations_by_year(works: &[Work]) -> Vec<YearCount> {
    let mut by_year: BTreeMap<i32, u64> = BTreeMap::new();
    for work in works {
        if let Some(year) = work.year {
            *by_year.entry(year).or_insert(0) += work.citations;
        }
    }
    by_year
        .into_iter()
        .map(|(year, citations)| YearCount { year, citations })
        .collect()
}

/// Number of works published each year, oldest year first.
pub fn works_by_year(works: &[Work]) -> Vec<(i32, usize)> {
    let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
    for year in works.iter().filter_map(|w| w.year) {
        *by_year.entry(year).or_insert(0) += 1;
    }
    by_year.into_iter().collect()
}

pub fn top_venues(works: &[Work], n: usize) -> Vec<Tally> {
    top_n(count_by(works.iter().map(|w| w.venue.as_str())), n)
}

pub fn top_coauthors(works: &[Work], n: usize) -> Vec<Tally> {
    top_n(count_by(works.iter().flat_map(|w| w.coauthors.iter())), n)
}

pub fn top_topics(works: &[Work], n: usize) -> Vec<Tally> {
    top_n(count_by(works.iter().flat_map(|w| w.topics.iter())), n)
}

pub fn top_keywords(works: &[Work], n: usize) -> Vec<Tally> {
    top_n(count_by(works.iter().flat_map(|w| w.keywords.iter())), n)
}

pub fn oa_breakdown(works: &[Work]) -> Vec<Tally> {
    count_by(works.iter().map(|w| w.oa_status.as_str()))
}

/// Largest h such that h works have at least h citations each.
pub fn h_index(works: &[Work]) -> usize {
    let mut citations: Vec<u64> = works.iter().map(|w| w.citations).collect();
    citations.sort_unstable_by(|a, b| b.cmp(a));
    citations
        .iter()
        .enumerate()
        .take_while(|&(i, &c)| c > i as u64)
        .count()
}

pub fn i10_index(works: &[Work]) -> usize {
    works.iter().filter(|w| w.citations >= 10).count()
}

/// Headline numbers shown in the stats bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub author_id: Option<String>,
    pub updated_at: Option<String>,
    pub papers: u64,
    pub total_citations: u64,
    pub h_index: usize,
    pub i10_index: usize,
    pub open_access_share: Option<f64>,
    pub year_span: Option<(i32, i32)>,
}

pub fn summarize(report: &MetricsReport) -> Summary {
    let works = &report.works;
    let open_access_share = (!works.is_empty())
        .then(|| works.iter().filter(|w| w.is_oa).count() as f64 / works.len() as f64);

    let years = works.iter().filter_map(|w| w.year);
    let year_span = years
        .clone()
        .min()
        .zip(years.max());

    Summary {
        author_id: report.author_openalex_id.clone(),
        updated_at: report.updated_at.clone(),
        papers: report.papers_tracked.unwrap_or(works.len() as u64),
        total_citations: report
            .total_citations
            .unwrap_or_else(|| works.iter().map(|w| w.citations).sum()),
        h_index: h_index(works),
        i10_index: i10_index(works),
        open_access_share,
        year_span,
    }
}

/// Every aggregate the page needs, computed once.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summary: Summary,
    pub citations_by_year: Vec<YearCount>,
    pub works_by_year: Vec<(i32, usize)>,
    pub venues: Vec<Tally>,
    pub coauthors: Vec<Tally>,
    pub topics: Vec<Tally>,
    pub keywords: Vec<Tally>,
    pub open_access: Vec<Tally>,
}

impl Dashboard {
    pub fn from_report(report: &MetricsReport, n: usize) -> Self {
        let works = &report.works;
        // the file's own series wins; older files may not carry one
        let citations = if report.citations_by_year.is_empty() {
            citations_by_year(works)
        } else {
            let mut series = report.citations_by_year.clone();
            series.sort_by_key(|yc| yc.year);
            series
        };

        Self {
            summary: summarize(report),
            citations_by_year: citations,
            works_by_year: works_by_year(works),
            venues: top_venues(works, n),
            coauthors: top_coauthors(works, n),
            topics: top_topics(works, n),
            keywords: top_keywords(works, n),
            open_access: oa_breakdown(works),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(year: Option<i32>, citations: u64) -> Work {
        serde_json::from_value(serde_json::json!({
            "year": year,
            "citations": citations
        }))
        .unwrap()
    }

    #[test]
    fn test_count_by_counts_duplicates_and_breaks_ties() {
        let tallies = count_by(["nlp", "graphs", "nlp", " nlp ", "ai", "graphs", "", MISSING]);
        assert_eq!(
            tallies,
            vec![Tally::new("nlp", 3), Tally::new("graphs", 2), Tally::new("ai", 1)]
        );
    }

    #[test]
    fn test_top_n_truncates() {
        let tallies = count_by(["a", "b", "b", "c"]);
        assert_eq!(top_n(tallies.clone(), 2), vec![Tally::new("b", 2), Tally::new("a", 1)]);
        assert_eq!(top_n(tallies, 10).len(), 3);
        assert!(top_n(Vec::new(), 3).is_empty());
    }

    #[test]
    fn test_citations_by_year_sums_and_sorts() {
        let works = vec![work(Some(2021), 5), work(Some(2019), 2), work(Some(2021), 1), work(None, 40)];
        assert_eq!(
            citations_by_year(&works),
            vec![
                YearCount { year: 2019, citations: 2 },
                YearCount { year: 2021, citations: 6 }
            ]
        );
        assert_eq!(works_by_year(&works), vec![(2019, 1), (2021, 2)]);
    }

    #[test]
    fn test_h_index_and_i10() {
        let works: Vec<Work> = [10, 8, 5, 4, 3, 0].iter().map(|&c| work(Some(2020), c)).collect();
        assert_eq!(h_index(&works), 4);
        assert_eq!(i10_index(&works), 1);
        assert_eq!(h_index(&[]), 0);
    }

    #[test]
    fn test_top_lists_flatten_work_fields() {
        let mut a = work(Some(2020), 1);
        a.coauthors = vec!["Bob".into(), "Alice".into()];
        a.venue = "NeurIPS".into();
        let mut b = work(Some(2021), 1);
        b.coauthors = vec!["Alice".into()];
        b.venue = MISSING.into();

        let works = vec![a, b];
        assert_eq!(
            top_coauthors(&works, 5),
            vec![Tally::new("Alice", 2), Tally::new("Bob", 1)]
        );
        assert_eq!(top_venues(&works, 5), vec![Tally::new("NeurIPS", 1)]);
    }

    #[test]
    fn test_summary_falls_back_to_works() {
        let mut oa = work(Some(2018), 3);
        oa.is_oa = true;
        let report = MetricsReport {
            updated_at: None,
            author_openalex_id: None,
            papers_tracked: None,
            total_citations: None,
            citations_by_year: vec![],
            works: vec![oa, work(Some(2022), 4)],
        };

        let summary = summarize(&report);
        assert_eq!(summary.papers, 2);
        assert_eq!(summary.total_citations, 7);
        assert_eq!(summary.h_index, 2);
        assert_eq!(summary.open_access_share, Some(0.5));
        assert_eq!(summary.year_span, Some((2018, 2022)));

        let dashboard = Dashboard::from_report(&report, 3);
        assert_eq!(dashboard.citations_by_year.len(), 2);
        assert_eq!(dashboard.open_access, vec![Tally::new("unknown", 2)]);
    }

    #[test]
    fn test_summary_prefers_file_counters() {
        let report = MetricsReport {
            updated_at: Some("2024-01-01T00:00:00+00:00".into()),
            author_openalex_id: Some("A1".into()),
            papers_tracked: Some(9),
            total_citations: Some(120),
            citations_by_year: vec![],
            works: vec![],
        };
        let summary = summarize(&report);
        assert_eq!(summary.papers, 9);
        assert_eq!(summary.total_citations, 120);
        assert_eq!(summary.open_access_share, None);
        assert_eq!(summary.year_span, None);
    }
}
