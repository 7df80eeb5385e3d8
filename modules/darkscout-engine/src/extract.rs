//! Evidence extraction: find the identifier in fetched text, classify risk,
//! cut a context window, and pull structured details out of leak posts.

use std::sync::LazyLock;

use regex::Regex;

use darkscout_common::{LeakMetadata, RiskLevel, ScanConfig, TargetCategory};

use crate::fetch::FetchOutcome;
use crate::html;

/// Indicator patterns scanned in order; the first hit is the one recorded.
/// The single-word patterns shadow the compound ones on most pages, which
/// keeps the recorded indicator short and stable.
static BREACH_INDICATORS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        "breach",
        "leak",
        "dump",
        "hack",
        "pwn",
        "compromise",
        r"data\s*breach",
        r"account\s*breach",
        r"password\s*breach",
        "credential",
    ]
    .into_iter()
    .map(|pattern| {
        let re = Regex::new(&format!("(?i){pattern}")).expect("valid regex");
        (pattern, re)
    })
    .collect()
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}[/-]\d{1,2}[/-]\d{1,2}|(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]* \d{1,2},? \d{4}",
    )
    .expect("valid regex")
});

static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+(?:\.\d+)?\s*(?:GB|MB|TB|KB)").expect("valid regex"));

static ORG_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)(?:company|organization|victim|target):\s*([A-Za-z0-9\s.]+)")
            .expect("valid regex"),
        Regex::new(r"(?i)([A-Za-z0-9\s.]+)(?:\s+was\s+hacked|\s+breach|\s+leak)")
            .expect("valid regex"),
    ]
});

/// First breach indicator matching the text, if any.
pub fn match_breach_indicator(text: &str) -> Option<&'static str> {
    BREACH_INDICATORS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(pattern, _)| *pattern)
}

/// Heuristic scrape of leak-post details: publication date, data size,
/// victim organization. Returns `None` when nothing at all matched.
pub fn leak_metadata(text: &str) -> Option<LeakMetadata> {
    let metadata = LeakMetadata {
        date: DATE_RE.find(text).map(|m| m.as_str().to_string()),
        data_size: SIZE_RE.find(text).map(|m| m.as_str().to_string()),
        organization: ORG_RES
            .iter()
            .find_map(|re| re.captures(text))
            .map(|cap| cap[1].trim().to_string()),
    };
    (!metadata.is_empty()).then_some(metadata)
}

/// Case-insensitive substring check.
pub fn contains_identifier(text: &str, identifier: &str) -> bool {
    text.to_lowercase().contains(&identifier.to_lowercase())
}

/// Cut a window of `window` word tokens on each side of the first token
/// containing the identifier. `None` when no single token contains it
/// (identifiers with internal whitespace can match the page but span tokens).
pub fn context_window(text: &str, identifier: &str, window: usize) -> Option<String> {
    let needle = identifier.to_lowercase();
    let words: Vec<&str> = text.split_whitespace().collect();
    let hit = words
        .iter()
        .position(|word| word.to_lowercase().contains(&needle))?;

    let start = hit.saturating_sub(window);
    let end = (hit + window + 1).min(words.len());
    Some(words[start..end].join(" "))
}

/// What one fetch-and-extract pass concluded about one page.
#[derive(Debug, Clone)]
pub struct ExtractResult {
    pub found: bool,
    pub risk: RiskLevel,
    pub context: Option<String>,
    pub indicator: Option<&'static str>,
    pub metadata: Option<LeakMetadata>,
    pub outbound_links: Vec<String>,
}

impl ExtractResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            risk: RiskLevel::Low,
            context: None,
            indicator: None,
            metadata: None,
            outbound_links: Vec::new(),
        }
    }
}

/// Inspect one fetched page for the identifier.
///
/// Risk starts at the category baseline and is escalated (never lowered)
/// when a breach indicator appears in the context window. Ransomware pages
/// additionally get the leak-detail scrape over the full page text. Outbound
/// onion links come from the raw markup, not the flattened text.
pub fn extract(
    outcome: &FetchOutcome,
    query: &str,
    category: TargetCategory,
    page_url: &str,
    config: &ScanConfig,
) -> ExtractResult {
    if !outcome.http_ok {
        return ExtractResult::not_found();
    }

    let text = html::visible_text(&outcome.body, page_url);
    if !contains_identifier(&text, query) {
        return ExtractResult::not_found();
    }

    let mut risk = category.baseline_risk();
    let context = context_window(&text, query, config.context_window_words);

    let indicator = context.as_deref().and_then(match_breach_indicator);
    if indicator.is_some() {
        risk = risk.escalate(category.indicator_risk());
    }

    let metadata = if category == TargetCategory::Ransomware {
        leak_metadata(&text)
    } else {
        None
    };

    ExtractResult {
        found: true,
        risk,
        context,
        indicator,
        metadata,
        outbound_links: html::extract_onion_links(&outcome.body, page_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScanConfig {
        ScanConfig::default()
    }

    // --- indicators ---

    #[test]
    fn first_indicator_in_order_wins() {
        // "data leak" matches the bare "leak" pattern before the compounds.
        assert_eq!(match_breach_indicator("huge data leak posted"), Some("leak"));
        assert_eq!(match_breach_indicator("accounts pwned here"), Some("pwn"));
        assert_eq!(match_breach_indicator("stolen credentials"), Some("credential"));
        assert_eq!(match_breach_indicator("nothing suspicious"), None);
    }

    #[test]
    fn indicator_match_is_case_insensitive() {
        assert_eq!(match_breach_indicator("MASSIVE BREACH"), Some("breach"));
    }

    // --- context window ---

    #[test]
    fn window_is_symmetric_around_the_hit() {
        let text = "a b c d victim@example.com e f g h";
        let ctx = context_window(text, "victim@example.com", 2).unwrap();
        assert_eq!(ctx, "c d victim@example.com e f");
    }

    #[test]
    fn window_clamps_at_text_boundaries() {
        let text = "victim@example.com right after start";
        let ctx = context_window(text, "victim@example.com", 5).unwrap();
        assert_eq!(ctx, text);

        let text = "mention at the very end victim@example.com";
        let ctx = context_window(text, "victim@example.com", 3).unwrap();
        assert_eq!(ctx, "the very end victim@example.com");
    }

    #[test]
    fn window_find_is_case_insensitive_and_token_embedded() {
        let text = "header mailto:VICTIM@EXAMPLE.COM trailer";
        let ctx = context_window(text, "victim@example.com", 1).unwrap();
        assert_eq!(ctx, "header mailto:VICTIM@EXAMPLE.COM trailer");
    }

    #[test]
    fn window_none_when_identifier_spans_tokens() {
        assert!(context_window("john doe seen here", "john doe", 5).is_none());
    }

    // --- leak metadata ---

    #[test]
    fn leak_metadata_picks_up_date_size_org() {
        let text = "Company: Acme Corp was published 03/14/2024 with 12 GB of data";
        let meta = leak_metadata(text).unwrap();
        assert_eq!(meta.date.as_deref(), Some("03/14/2024"));
        assert_eq!(meta.data_size.as_deref(), Some("12 GB"));
        assert_eq!(meta.organization.as_deref(), Some("Acme Corp was published 03"));
    }

    #[test]
    fn leak_metadata_matches_named_months() {
        let meta = leak_metadata("posted January 5, 2024 by the group").unwrap();
        assert_eq!(meta.date.as_deref(), Some("January 5, 2024"));
    }

    #[test]
    fn leak_metadata_size_units_any_case() {
        let meta = leak_metadata("dump weighs 3.5tb total").unwrap();
        assert_eq!(meta.data_size.as_deref(), Some("3.5tb"));
    }

    #[test]
    fn leak_metadata_org_fallback_pattern() {
        let meta = leak_metadata("MegaBank was hacked last week").unwrap();
        assert_eq!(meta.organization.as_deref(), Some("MegaBank"));
    }

    #[test]
    fn leak_metadata_none_when_nothing_matches() {
        assert!(leak_metadata("no structured details at all").is_none());
    }

    // --- extract ---

    #[test]
    fn failed_fetch_yields_not_found() {
        let outcome = FetchOutcome::failure("connection refused");
        let result = extract(
            &outcome,
            "victim@example.com",
            TargetCategory::General,
            "http://t.onion",
            &config(),
        );
        assert!(!result.found);
    }

    #[test]
    fn page_without_identifier_yields_not_found() {
        let outcome = FetchOutcome::success("<p>unrelated content</p>".to_string());
        let result = extract(
            &outcome,
            "victim@example.com",
            TargetCategory::Breach,
            "http://t.onion",
            &config(),
        );
        assert!(!result.found);
    }

    #[test]
    fn general_hit_with_leak_keyword_escalates_to_high() {
        let outcome =
            FetchOutcome::success("<p>victim@example.com appeared in a data leak</p>".to_string());
        let result = extract(
            &outcome,
            "victim@example.com",
            TargetCategory::General,
            "http://t.onion",
            &config(),
        );
        assert!(result.found);
        assert_eq!(result.risk, RiskLevel::High);
        assert_eq!(result.indicator, Some("leak"));
        assert!(result.context.unwrap().contains("victim@example.com"));
    }

    #[test]
    fn breach_hit_without_indicator_keeps_baseline() {
        let outcome =
            FetchOutcome::success("<p>victim@example.com listed among entries</p>".to_string());
        let result = extract(
            &outcome,
            "victim@example.com",
            TargetCategory::Breach,
            "http://t.onion",
            &config(),
        );
        assert!(result.found);
        assert_eq!(result.risk, RiskLevel::High);
        assert_eq!(result.indicator, None);
    }

    #[test]
    fn ransomware_hit_carries_metadata_and_stays_critical() {
        let outcome = FetchOutcome::success(
            "<p>victim@example.com leaked 03/14/2024, 12 GB archive</p>".to_string(),
        );
        let result = extract(
            &outcome,
            "victim@example.com",
            TargetCategory::Ransomware,
            "http://t.onion",
            &config(),
        );
        assert!(result.found);
        assert_eq!(result.risk, RiskLevel::Critical);
        let meta = result.metadata.unwrap();
        assert_eq!(meta.date.as_deref(), Some("03/14/2024"));
        assert_eq!(meta.data_size.as_deref(), Some("12 GB"));
    }

    #[test]
    fn non_ransomware_categories_skip_metadata() {
        let outcome = FetchOutcome::success(
            "<p>victim@example.com dump from 03/14/2024, 12 GB</p>".to_string(),
        );
        let result = extract(
            &outcome,
            "victim@example.com",
            TargetCategory::Paste,
            "http://t.onion",
            &config(),
        );
        assert!(result.found);
        assert!(result.metadata.is_none());
    }

    #[test]
    fn onion_links_harvested_from_raw_markup() {
        let outcome = FetchOutcome::success(
            r#"<p>victim@example.com</p>
               <a href="http://mirror1.onion/dump">mirror</a>
               <a href="https://clearnet.example.com/x">ignore</a>"#
                .to_string(),
        );
        let result = extract(
            &outcome,
            "victim@example.com",
            TargetCategory::Forum,
            "http://t.onion",
            &config(),
        );
        assert_eq!(result.outbound_links, vec!["http://mirror1.onion/dump"]);
    }
}
