//! Inline SVG charts, so the page renders without a charting library.

use crate::core::sanitize::escape_html;

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 220.0;
const AXIS_GAP: f64 = 24.0;
const TOP_GAP: f64 = 18.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: u64,
}

impl Bar {
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Vertical bar chart with a value label above each bar.
pub fn bar_chart(caption: &str, bars: &[Bar]) -> String {
    if bars.is_empty() {
        return r#"<p class="empty">No data.</p>"#.to_string();
    }

    let max = bars.iter().map(|b| b.value).max().unwrap_or(0).max(1) as f64;
    let plot_height = CHART_HEIGHT - AXIS_GAP - TOP_GAP;
    let slot = CHART_WIDTH / bars.len() as f64;
    let bar_width = (slot * 0.7).max(1.0);
    // thin out x labels when there are many bars
    let label_every = (bars.len() / 16).max(1);

    let mut svg = format!(
        r#"<svg class="chart" viewBox="0 0 {w} {h}" role="img" aria-label="{caption}" xmlns="http://www.w3.org/2000/svg">"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        caption = escape_html(caption),
    );

    for (i, bar) in bars.iter().enumerate() {
        let height = (bar.value as f64 / max) * plot_height;
        let x = i as f64 * slot + (slot - bar_width) / 2.0;
        let y = TOP_GAP + plot_height - height;
        let center = x + bar_width / 2.0;
        let label = escape_html(&bar.label);

        svg.push_str(&format!(
            r#"<g><title>{label}: {value}</title><rect x="{x:.1}" y="{y:.1}" width="{bw:.1}" height="{height:.1}" rx="2"></rect>"#,
            value = bar.value,
            bw = bar_width,
        ));
        svg.push_str(&format!(
            r#"<text class="value" x="{center:.1}" y="{ty:.1}" text-anchor="middle">{value}</text>"#,
            ty = (y - 4.0).max(10.0),
            value = bar.value,
        ));
        if i % label_every == 0 {
            svg.push_str(&format!(
                r#"<text class="axis" x="{center:.1}" y="{ly:.1}" text-anchor="middle">{label}</text>"#,
                ly = CHART_HEIGHT - 6.0,
            ));
        }
        svg.push_str("</g>");
    }

    svg.push_str(&format!(
        r#"<line class="baseline" x1="0" y1="{y:.1}" x2="{w}" y2="{y:.1}"></line></svg>"#,
        y = TOP_GAP + plot_height,
        w = CHART_WIDTH,
    ));
    svg
}

/// Horizontal bar used inside top-N table rows, as a percentage of `max`.
pub fn bar_cell(value: usize, max: usize) -> String {
    let pct = if max == 0 {
        0.0
    } else {
        (value as f64 / max as f64 * 100.0).clamp(0.0, 100.0)
    };
    format!(r#"<span class="bar" style="width:{:.0}%"></span>"#, pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chart_says_no_data() {
        assert!(bar_chart("Citations", &[]).contains("No data."));
    }

    #[test]
    fn test_chart_has_one_rect_per_bar() {
        let bars = vec![Bar::new("2020", 4), Bar::new("2021", 0), Bar::new("<b>", 8)];
        let svg = bar_chart("Citations by year", &bars);
        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("<title>2020: 4</title>"));
        assert!(svg.contains("&lt;b&gt;"));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_tallest_bar_fills_plot() {
        let svg = bar_chart("c", &[Bar::new("a", 10), Bar::new("b", 5)]);
        let plot = CHART_HEIGHT - AXIS_GAP - TOP_GAP;
        assert!(svg.contains(&format!("height=\"{:.1}\"", plot)));
        assert!(svg.contains(&format!("height=\"{:.1}\"", plot / 2.0)));
    }

    #[test]
    fn test_bar_cell_percentages() {
        assert_eq!(bar_cell(5, 10), r#"<span class="bar" style="width:50%"></span>"#);
        assert_eq!(bar_cell(3, 0), r#"<span class="bar" style="width:0%"></span>"#);
    }
}
