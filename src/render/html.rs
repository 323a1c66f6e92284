//! Static portfolio page: stats bar, charts, top-N tables, works and news.

use crate::core::aggregate::{Dashboard, Summary};
use crate::core::sanitize::{escape_html, safe_href, sanitize_news_html};
use crate::domain::model::{MetricsReport, NewsItem, Tally, Work, MISSING};
use crate::render::chart::{bar_cell, bar_chart, Bar};
use chrono::DateTime;

pub const METRICS_FAILED: &str = "Failed to load metrics.";
pub const NEWS_FAILED: &str = "Failed to load news.";

/// What the page is built from. Each input may have failed independently.
pub struct PageInput<'a> {
    pub title: &'a str,
    pub metrics: Result<&'a MetricsReport, &'a str>,
    pub news: Result<&'a [NewsItem], &'a str>,
    pub top_n: usize,
}

pub fn render_page(input: &PageInput<'_>) -> String {
    let body = match input.metrics {
        Ok(report) => {
            let dashboard = Dashboard::from_report(report, input.top_n);
            render_metrics_sections(&dashboard, &report.works)
        }
        Err(reason) => {
            tracing::warn!("Rendering without metrics: {}", reason);
            render_failure("metrics", METRICS_FAILED)
        }
    };

    let news = match input.news {
        Ok(items) => render_news(items),
        Err(reason) => {
            tracing::warn!("Rendering without news: {}", reason);
            render_failure("news", NEWS_FAILED)
        }
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
    <main class="container">
        <header><h1>{title}</h1></header>
        {body}
        <section id="news"><h2>News</h2>{news}</section>
        <footer>Generated by portfolio-metrics from OpenAlex data.</footer>
    </main>
</body>
</html>
"#,
        title = escape_html(input.title),
        css = inline_css(),
        body = body,
        news = news,
    )
}

fn render_failure(section: &str, message: &str) -> String {
    format!(
        r#"<p class="load-error" data-section="{}">{}</p>"#,
        section,
        escape_html(message)
    )
}

fn render_metrics_sections(dashboard: &Dashboard, works: &[Work]) -> String {
    let citation_bars: Vec<Bar> = dashboard
        .citations_by_year
        .iter()
        .map(|yc| Bar::new(yc.year.to_string(), yc.citations))
        .collect();
    let work_bars: Vec<Bar> = dashboard
        .works_by_year
        .iter()
        .map(|(year, count)| Bar::new(year.to_string(), *count as u64))
        .collect();

    [
        render_stats_bar(&dashboard.summary),
        format!(
            r#"<section id="citations-by-year"><h2>Citations by publication year</h2>{}</section>"#,
            bar_chart("Citations by publication year", &citation_bars)
        ),
        format!(
            r#"<section id="works-by-year"><h2>Publications per year</h2>{}</section>"#,
            bar_chart("Publications per year", &work_bars)
        ),
        r#"<div class="grid">"#.to_string(),
        render_tally_table("top-venues", "Top venues", &dashboard.venues),
        render_tally_table("top-coauthors", "Frequent coauthors", &dashboard.coauthors),
        render_tally_table("top-topics", "Topics", &dashboard.topics),
        render_tally_table("top-keywords", "Keywords", &dashboard.keywords),
        render_tally_table("open-access", "Open access", &dashboard.open_access),
        "</div>".to_string(),
        render_works_table(works),
    ]
    .join("\n")
}

pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `2024-05-01T10:00:00+00:00` becomes `2024-05-01`; anything else is shown as is.
pub fn format_updated_at(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn stat(label: &str, value: &str) -> String {
    format!(
        r#"<div class="stat"><span class="stat-value">{}</span><span class="stat-label">{}</span></div>"#,
        escape_html(value),
        escape_html(label)
    )
}

pub fn render_stats_bar(summary: &Summary) -> String {
    let oa = summary
        .open_access_share
        .map(|share| format!("{:.0}%", share * 100.0))
        .unwrap_or_else(|| MISSING.to_string());
    let span = summary
        .year_span
        .map(|(first, last)| {
            if first == last {
                first.to_string()
            } else {
                format!("{}–{}", first, last)
            }
        })
        .unwrap_or_else(|| MISSING.to_string());
    let updated = summary
        .updated_at
        .as_deref()
        .map(format_updated_at)
        .unwrap_or_else(|| MISSING.to_string());

    let stats = [
        stat("Papers", &format_count(summary.papers)),
        stat("Citations", &format_count(summary.total_citations)),
        stat("h-index", &summary.h_index.to_string()),
        stat("i10-index", &summary.i10_index.to_string()),
        stat("Open access", &oa),
        stat("Years", &span),
        stat("Updated", &updated),
    ];

    format!(r#"<section id="stats" class="stats">{}</section>"#, stats.concat())
}

pub fn render_tally_table(id: &str, heading: &str, tallies: &[Tally]) -> String {
    let max = tallies.iter().map(|t| t.count).max().unwrap_or(0);
    let rows: String = if tallies.is_empty() {
        r#"<tr><td colspan="2" class="empty">No data.</td></tr>"#.to_string()
    } else {
        tallies
            .iter()
            .map(|t| {
                format!(
                    r#"<tr><td>{label}</td><td class="count">{bar}<span>{count}</span></td></tr>"#,
                    label = escape_html(&t.label),
                    bar = bar_cell(t.count, max),
                    count = t.count,
                )
            })
            .collect()
    };

    format!(
        r#"<section id="{id}" class="tally"><h2>{heading}</h2><table><tbody>{rows}</tbody></table></section>"#,
        id = id,
        heading = escape_html(heading),
        rows = rows,
    )
}

fn link(href: &str, text: &str) -> String {
    match safe_href(href).filter(|h| h != "#") {
        Some(url) => format!(
            r#"<a href="{}" rel="noopener noreferrer" target="_blank">{}</a>"#,
            escape_html(&url),
            escape_html(text)
        ),
        None => escape_html(text),
    }
}

fn render_work_row(work: &Work) -> String {
    let mut extras: Vec<String> = Vec::new();
    if let Some(doi) = &work.doi {
        extras.push(link(&format!("https://doi.org/{}", doi), "DOI"));
    }
    if let Some(hal) = &work.hal_url {
        extras.push(link(hal, "HAL"));
    }
    let badge = if work.is_oa {
        format!(
            r#"<span class="badge oa-{status}">{status}</span>"#,
            status = escape_html(&work.oa_status)
        )
    } else {
        String::new()
    };

    format!(
        r#"<tr><td class="title">{title} {badge}<div class="links">{extras}</div></td><td>{year}</td><td>{venue}</td><td class="count">{citations}</td></tr>"#,
        title = link(&work.url, &work.title),
        badge = badge,
        extras = extras.join(" · "),
        year = work
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| MISSING.to_string()),
        venue = escape_html(&work.venue),
        citations = format_count(work.citations),
    )
}

pub fn render_works_table(works: &[Work]) -> String {
    let rows: String = if works.is_empty() {
        r#"<tr><td colspan="4" class="empty">No data.</td></tr>"#.to_string()
    } else {
        works.iter().map(render_work_row).collect()
    };

    format!(
        r#"<section id="works"><h2>Publications</h2><table class="works"><thead><tr><th>Title</th><th>Year</th><th>Venue</th><th>Citations</th></tr></thead><tbody>{}</tbody></table></section>"#,
        rows
    )
}

pub fn render_news(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return r#"<p class="empty">No news yet.</p>"#.to_string();
    }

    let entries: String = items
        .iter()
        .map(|item| {
            let date = item
                .date
                .as_deref()
                .map(|d| format!(r#"<time>{}</time> "#, escape_html(d)))
                .unwrap_or_default();
            let title = match (&item.title, &item.url) {
                (Some(title), Some(url)) => format!("<strong>{}</strong> ", link(url, title)),
                (Some(title), None) => format!("<strong>{}</strong> ", escape_html(title)),
                (None, _) => String::new(),
            };
            format!(
                r#"<li>{}{}<span class="news-body">{}</span></li>"#,
                date,
                title,
                sanitize_news_html(&item.html)
            )
        })
        .collect();

    format!(r#"<ul class="news">{}</ul>"#, entries)
}

fn inline_css() -> &'static str {
    r#"
body { font-family: system-ui, -apple-system, sans-serif; margin: 0; color: #1f2933; background: #f7f8fa; }
.container { max-width: 960px; margin: 0 auto; padding: 24px; }
h1 { margin-bottom: 8px; }
h2 { font-size: 1.1rem; margin: 24px 0 8px; }
.stats { display: flex; flex-wrap: wrap; gap: 12px; }
.stat { background: #fff; border-radius: 8px; padding: 10px 14px; min-width: 90px; box-shadow: 0 1px 2px rgba(0,0,0,.08); }
.stat-value { display: block; font-size: 1.4rem; font-weight: 600; }
.stat-label { font-size: .8rem; color: #616e7c; }
.chart { width: 100%; height: auto; background: #fff; border-radius: 8px; }
.chart rect { fill: #3b82f6; }
.chart text { font-size: 10px; fill: #52606d; }
.chart .baseline { stroke: #cbd2d9; }
.grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 0 24px; }
table { width: 100%; border-collapse: collapse; background: #fff; }
td, th { padding: 6px 8px; border-bottom: 1px solid #e4e7eb; text-align: left; vertical-align: top; }
td.count { text-align: right; white-space: nowrap; }
.bar { display: inline-block; height: 8px; background: #93c5fd; margin-right: 6px; border-radius: 4px; }
.badge { font-size: .7rem; padding: 1px 6px; border-radius: 8px; background: #d1fae5; color: #065f46; }
.links { font-size: .8rem; }
.empty { color: #9aa5b1; font-style: italic; }
.load-error { color: #b91c1c; background: #fee2e2; padding: 10px 14px; border-radius: 8px; }
.news li { margin-bottom: 8px; }
time { color: #616e7c; font-variant-numeric: tabular-nums; }
footer { margin-top: 32px; font-size: .8rem; color: #9aa5b1; }
"#
}
