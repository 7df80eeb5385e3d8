//! Raw HTML to visible text, plus link and title extraction.
//!
//! Onion pages are frequently hand-written, truncated, or otherwise broken,
//! so everything here degrades instead of failing: the transform falls back
//! to bare tag stripping, and missing titles fall back to headings and then
//! to a host-derived label.

use std::sync::LazyLock;

use regex::Regex;
use spider_transformations::transformation::content::{
    transform_content_input, ReturnFormat, TransformConfig, TransformInput,
};

/// Matches `href` attributes — the only semantic "link" in HTML.
static HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid regex"));

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("valid regex"));

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

/// Extract the visible text of a page.
///
/// Readability and main-content pruning stay off on purpose: identifier
/// mentions routinely sit in search-result listings, sidebars, and footers
/// that a readability pass would throw away.
pub fn visible_text(html: &str, url: &str) -> String {
    let parsed_url = url::Url::parse(url).ok();
    let config = TransformConfig {
        readability: false,
        main_content: false,
        return_format: ReturnFormat::Markdown,
        filter_images: true,
        filter_svg: true,
        clean_html: true,
    };
    let input = TransformInput {
        url: parsed_url.as_ref(),
        content: html.as_bytes(),
        screenshot_bytes: None,
        encoding: None,
        selector_config: None,
        ignore_tags: None,
    };

    let text = transform_content_input(input, &config);
    if text.trim().is_empty() {
        strip_tags(html)
    } else {
        text
    }
}

/// Bare-bones tag stripper used when the full transform yields nothing.
pub fn strip_tags(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, " ");
    let without_styles = STYLE_RE.replace_all(&without_scripts, " ");
    let text = TAG_RE.replace_all(&without_styles, " ");
    collapse_whitespace(&decode_entities(&text))
}

/// Extract all links from raw HTML. Only `href` attributes count; URLs in
/// `src`, data attributes, JS, and plain text are ignored. Resolves relative
/// hrefs against `base_url`, strips fragments, deduplicates.
pub fn extract_all_links(html: &str, base_url: &str) -> Vec<String> {
    let base = url::Url::parse(base_url).ok();
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for cap in HREF_RE.captures_iter(html) {
        let raw = &cap[1];
        if let Some(resolved) = resolve_href(raw, base.as_ref()) {
            if seen.insert(resolved.clone()) {
                links.push(resolved);
            }
        }
    }

    links
}

/// Links whose resolved target lives on the onion network.
pub fn extract_onion_links(html: &str, base_url: &str) -> Vec<String> {
    extract_all_links(html, base_url)
        .into_iter()
        .filter(|url| url.contains(".onion"))
        .collect()
}

/// Resolve a raw href against a base URL, returning an absolute URL with
/// fragment stripped.
fn resolve_href(raw: &str, base: Option<&url::Url>) -> Option<String> {
    let mut parsed = if raw.starts_with("http://") || raw.starts_with("https://") {
        url::Url::parse(raw).ok()?
    } else {
        base?.join(raw).ok()?
    };
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

/// The page's `<title>` text, if present and non-empty.
pub fn page_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .map(|cap| inner_text(&cap[1]))
        .filter(|t| !t.is_empty())
}

/// The first `<h1>` text, if present and non-empty.
pub fn first_heading(html: &str) -> Option<String> {
    H1_RE
        .captures(html)
        .map(|cap| inner_text(&cap[1]))
        .filter(|t| !t.is_empty())
}

/// Best available title for a page: `<title>`, else the first `<h1>`, else
/// a label derived from the host. Clipped to `max_len` characters.
pub fn derived_title(html: &str, url: &str, max_len: usize) -> String {
    let title = page_title(html)
        .or_else(|| first_heading(html))
        .unwrap_or_else(|| format!("Onion Site: {}", host_of(url)));
    truncate_title(&title, max_len)
}

fn host_of(url: &str) -> String {
    if let Some(host) = url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        return host;
    }
    // Not parseable; take whatever sits between the scheme and the first slash.
    url.split("//")
        .last()
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or(url)
        .to_string()
}

/// Clip to `max_len` characters, marking the cut with an ellipsis.
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        return title.to_string();
    }
    let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}

fn inner_text(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, " ");
    collapse_whitespace(&decode_entities(&text))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- link extraction ---

    #[test]
    fn href_links_are_extracted() {
        let html = r#"<a href="http://abc123.onion/page">leak</a>"#;
        let links = extract_all_links(html, "http://base.onion");
        assert_eq!(links, vec!["http://abc123.onion/page"]);
    }

    #[test]
    fn onion_filter_drops_clearnet_links() {
        let html = r#"
            <a href="http://abc123.onion/dump">onion</a>
            <a href="https://example.com/page">clearnet</a>
        "#;
        let links = extract_onion_links(html, "http://base.onion");
        assert_eq!(links, vec!["http://abc123.onion/dump"]);
    }

    #[test]
    fn relative_hrefs_resolve_against_onion_base() {
        let html = r#"<a href="/posts/42">post</a>"#;
        let links = extract_onion_links(html, "http://abc123.onion");
        assert_eq!(links, vec!["http://abc123.onion/posts/42"]);
    }

    #[test]
    fn fragments_are_stripped_and_deduplicated() {
        let html = r#"
            <a href="http://abc123.onion/page#top">one</a>
            <a href="http://abc123.onion/page#bottom">two</a>
        "#;
        let links = extract_all_links(html, "http://base.onion");
        assert_eq!(links, vec!["http://abc123.onion/page"]);
    }

    #[test]
    fn image_src_is_not_extracted() {
        let html = r#"<img src="http://abc123.onion/logo.png">"#;
        let links = extract_all_links(html, "http://base.onion");
        assert!(links.is_empty());
    }

    #[test]
    fn plain_text_urls_are_not_extracted() {
        let html = "Mirror at http://abc123.onion/mirror if main is down";
        let links = extract_all_links(html, "http://base.onion");
        assert!(links.is_empty());
    }

    // --- titles ---

    #[test]
    fn title_tag_wins_over_heading() {
        let html = "<title>Leak Archive</title><h1>Latest dumps</h1>";
        assert_eq!(
            derived_title(html, "http://abc123.onion", 50),
            "Leak Archive"
        );
    }

    #[test]
    fn heading_used_when_title_missing() {
        let html = "<h1>Latest dumps</h1><p>content</p>";
        assert_eq!(
            derived_title(html, "http://abc123.onion", 50),
            "Latest dumps"
        );
    }

    #[test]
    fn host_label_when_markup_has_neither() {
        let html = "<p>nothing here</p>";
        assert_eq!(
            derived_title(html, "http://abc123.onion/path", 50),
            "Onion Site: abc123.onion"
        );
    }

    #[test]
    fn long_titles_are_clipped_with_ellipsis() {
        let long = "A".repeat(80);
        let html = format!("<title>{long}</title>");
        let title = derived_title(&html, "http://abc123.onion", 50);
        assert_eq!(title.chars().count(), 50);
        assert!(title.ends_with("..."));
        assert!(title.starts_with("AAAA"));
    }

    #[test]
    fn title_inner_markup_and_entities_are_cleaned() {
        let html = "<title>  Dumps &amp; <b>Leaks</b>  </title>";
        assert_eq!(page_title(html).as_deref(), Some("Dumps & Leaks"));
    }

    #[test]
    fn empty_title_falls_through() {
        let html = "<title>   </title><h1>Fallback</h1>";
        assert_eq!(page_title(html), None);
        assert_eq!(first_heading(html).as_deref(), Some("Fallback"));
    }

    // --- text extraction ---

    #[test]
    fn strip_tags_drops_script_and_style_bodies() {
        let html = r#"
            <script>var secret = "never-shown";</script>
            <style>.x { color: red; }</style>
            <p>victim@example.com appears in a data breach</p>
        "#;
        let text = strip_tags(html);
        assert!(text.contains("victim@example.com"));
        assert!(!text.contains("never-shown"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn visible_text_finds_body_content() {
        let html = "<html><body><p>found victim@example.com here</p></body></html>";
        let text = visible_text(html, "http://abc123.onion");
        assert!(text.contains("victim@example.com"));
    }

    #[test]
    fn truncate_keeps_short_titles_untouched() {
        assert_eq!(truncate_title("short", 50), "short");
        assert_eq!(truncate_title("", 50), "");
    }
}
