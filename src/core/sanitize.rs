//! Allowlist sanitizer for the HTML snippets in `news.json`.

use regex::Regex;
use std::sync::LazyLock;

const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "strong", "i", "em", "u", "br", "p", "ul", "ol", "li", "code", "small", "span",
];
const VOID_TAGS: &[&str] = &["br"];
/// Removed together with everything inside them.
const DROPPED_WITH_CONTENT: &[&str] = &["script", "style", "iframe", "object", "embed", "template"];
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<\s*(/)?\s*([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>").expect("tag pattern is valid")
});
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
        .expect("href pattern is valid")
});
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{1,31});")
        .expect("entity pattern is valid")
});
static CHAR_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7});?|#[xX]([0-9a-fA-F]{1,6});?|(amp|quot|apos|lt|gt);)")
        .expect("character reference pattern is valid")
});

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Returns the cleaned URL when it is relative or uses an allowed scheme.
pub fn safe_href(raw: &str) -> Option<String> {
    // browsers ignore embedded whitespace and control characters in URLs
    let cleaned: String = raw.chars().filter(|c| *c > ' ' && *c != '\u{7f}').collect();
    if cleaned.is_empty() {
        return None;
    }

    let scheme_end = cleaned.find(':');
    let path_start = cleaned.find(['/', '?', '#']);
    match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => Some(cleaned),
        (Some(colon), _) => {
            let scheme = cleaned[..colon].to_ascii_lowercase();
            ALLOWED_SCHEMES.contains(&scheme.as_str()).then_some(cleaned)
        }
        (None, _) => Some(cleaned),
    }
}

/// Resolves the character references an attribute value may carry, so the
/// URL is checked and escaped exactly once.
fn decode_attr(value: &str) -> String {
    CHAR_REF_RE
        .replace_all(value, |caps: &regex::Captures| {
            let code = caps
                .get(1)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .or_else(|| caps.get(2).and_then(|m| u32::from_str_radix(m.as_str(), 16).ok()));
            match (code, caps.get(3).map(|m| m.as_str())) {
                (Some(code), _) => char::from_u32(code)
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
                    .to_string(),
                (None, Some("amp")) => "&".to_string(),
                (None, Some("quot")) => "\"".to_string(),
                (None, Some("apos")) => "'".to_string(),
                (None, Some("lt")) => "<".to_string(),
                (None, Some("gt")) => ">".to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn render_open_tag(name: &str, attrs: &str) -> String {
    if name != "a" {
        return format!("<{}>", name);
    }

    let href = HREF_RE.captures(attrs).and_then(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
    });

    match href.map(decode_attr).and_then(|h| safe_href(&h)) {
        Some(url) => format!(
            r#"<a href="{}" rel="noopener noreferrer" target="_blank">"#,
            escape_html(&url)
        ),
        None => "<a>".to_string(),
    }
}

/// Byte offset just past `</name ...>` in `rest`, if the element is closed.
fn end_of_element(rest: &str, name: &str) -> Option<usize> {
    let lowered = rest.to_ascii_lowercase();
    let close = lowered.find(&format!("</{}", name))?;
    let gt = lowered[close..].find('>')?;
    Some(close + gt + 1)
}

/// Keeps allowlisted formatting tags and safe links, escapes all text, and
/// drops everything else. Output is always well nested.
pub fn sanitize_news_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut open: Vec<String> = Vec::new();
    let mut i = 0;

    while i < input.len() {
        let rest = &input[i..];
        let Some(next) = rest.find(['<', '&']) else {
            out.push_str(&escape_html(rest));
            break;
        };
        out.push_str(&escape_html(&rest[..next]));
        i += next;
        let rest = &input[i..];

        if rest.starts_with('&') {
            match ENTITY_RE.find(rest) {
                Some(entity) => {
                    out.push_str(entity.as_str());
                    i += entity.end();
                }
                None => {
                    out.push_str("&amp;");
                    i += 1;
                }
            }
            continue;
        }

        if rest.starts_with("<!--") {
            i += rest.find("-->").map(|end| end + 3).unwrap_or(rest.len());
            continue;
        }

        let Some(caps) = TAG_RE.captures(rest) else {
            out.push_str("&lt;");
            i += 1;
            continue;
        };

        let tag_len = caps[0].len();
        let closing = caps.get(1).is_some();
        let name = caps[2].to_ascii_lowercase();
        let attrs = caps.get(3).map(|m| m.as_str()).unwrap_or("");

        if !closing && DROPPED_WITH_CONTENT.contains(&name.as_str()) {
            i += end_of_element(rest, &name).unwrap_or(rest.len());
            continue;
        }
        i += tag_len;

        if !ALLOWED_TAGS.contains(&name.as_str()) {
            continue;
        }

        if VOID_TAGS.contains(&name.as_str()) {
            if !closing {
                out.push_str(&format!("<{}>", name));
            }
        } else if closing {
            if let Some(pos) = open.iter().rposition(|t| *t == name) {
                for tag in open.drain(pos..).rev() {
                    out.push_str(&format!("</{}>", tag));
                }
            }
        } else {
            out.push_str(&render_open_tag(&name, attrs));
            open.push(name);
        }
    }

    for tag in open.into_iter().rev() {
        out.push_str(&format!("</{}>", tag));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_allowed_markup() {
        let html = "<p>Hello <strong>world</strong>, see <em>this</em><br/></p>";
        assert_eq!(
            sanitize_news_html(html),
            "<p>Hello <strong>world</strong>, see <em>this</em><br></p>"
        );
    }

    #[test]
    fn test_drops_script_and_style_with_content() {
        assert_eq!(sanitize_news_html("ok<script>alert(1)</script>done"), "okdone");
        assert_eq!(sanitize_news_html("<STYLE>p{}</STYLE >ok"), "ok");
        assert_eq!(sanitize_news_html("a<script>never closed"), "a");
    }

    #[test]
    fn test_strips_attributes_and_unsafe_links() {
        assert_eq!(sanitize_news_html(r#"<b onclick="x()">hi</b>"#), "<b>hi</b>");
        assert_eq!(
            sanitize_news_html(r#"<a href="javascript:alert(1)">x</a>"#),
            "<a>x</a>"
        );
        assert_eq!(
            sanitize_news_html("<a href=' jav\tascript:alert(1)'>x</a>"),
            "<a>x</a>"
        );
    }

    #[test]
    fn test_safe_links_get_rel_and_target() {
        assert_eq!(
            sanitize_news_html(r#"<a href="https://ex.org/?a=1&b=2" class="x">paper</a>"#),
            r#"<a href="https://ex.org/?a=1&amp;b=2" rel="noopener noreferrer" target="_blank">paper</a>"#
        );
        assert!(sanitize_news_html("<a href=mailto:me@ex.org>mail</a>").contains("href=\"mailto:me@ex.org\""));
        assert!(sanitize_news_html("<a href=\"/talks#2024\">talk</a>").contains("href=\"/talks#2024\""));
    }

    #[test]
    fn test_href_entities_are_decoded_before_escaping() {
        assert_eq!(
            sanitize_news_html(r#"<a href="https://ex.org/?a=1&amp;b=2">x</a>"#),
            r#"<a href="https://ex.org/?a=1&amp;b=2" rel="noopener noreferrer" target="_blank">x</a>"#
        );
        assert_eq!(
            sanitize_news_html(r#"<a href="https://ex.org/&#x41;&#66;">x</a>"#),
            r#"<a href="https://ex.org/AB" rel="noopener noreferrer" target="_blank">x</a>"#
        );
        assert_eq!(sanitize_news_html(r#"<a href="javascript&#58;alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(sanitize_news_html(r#"<a href="javascript&#x3A;alert(1)">x</a>"#), "<a>x</a>");
    }

    #[test]
    fn test_disallowed_tags_keep_text() {
        assert_eq!(
            sanitize_news_html("<div><img src=x onerror=y>text</div>"),
            "text"
        );
    }

    #[test]
    fn test_escapes_text_and_keeps_entities() {
        assert_eq!(
            sanitize_news_html("Fish &amp; chips & more <3 &#8212; \"quoted\""),
            "Fish &amp; chips &amp; more &lt;3 &#8212; &quot;quoted&quot;"
        );
    }

    #[test]
    fn test_balances_tags_and_removes_comments() {
        assert_eq!(sanitize_news_html("<em>open"), "<em>open</em>");
        assert_eq!(sanitize_news_html("text</b>"), "text");
        assert_eq!(sanitize_news_html("<b><i>x</b>y"), "<b><i>x</i></b>y");
        assert_eq!(sanitize_news_html("a<!-- hidden -->b<!-- open"), "ab");
    }

    #[test]
    fn test_safe_href() {
        assert_eq!(safe_href("https://ex.org").as_deref(), Some("https://ex.org"));
        assert_eq!(safe_href("page.html?x=a:b").as_deref(), Some("page.html?x=a:b"));
        assert!(safe_href("data:text/html,hi").is_none());
        assert!(safe_href("VBScript:x").is_none());
        assert!(safe_href("   ").is_none());
    }
}
