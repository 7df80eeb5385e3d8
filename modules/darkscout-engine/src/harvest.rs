//! Secondary pass over onion links discovered during the primary scan.
//!
//! Links accumulated on findings are normalized, deduplicated, capped, and
//! then fetched with the same bounded fan-out as the primary pass. Pages
//! that mention the identifier become synthetic findings keyed by a title
//! derived from the page itself.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};
use url::Url;

use darkscout_common::{RiskLevel, ScanConfig};

use crate::extract::{contains_identifier, context_window, match_breach_indicator};
use crate::fetch::Fetcher;
use crate::html;
use crate::session::SessionHandle;

/// Canonical form of a harvested link: scheme + host + path, query and
/// fragment dropped. Bare hosts get an `http://` prefix first. Anything
/// that is not an onion host is rejected.
pub fn normalize_link(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&candidate).ok()?;
    let host = url.host_str()?;
    if !host.ends_with(".onion") {
        return None;
    }
    Some(format!("{}://{}{}", url.scheme(), host, url.path()))
}

/// Drain the session's pending links and assess the survivors.
pub async fn run(
    fetcher: &Arc<dyn Fetcher>,
    handle: &Arc<SessionHandle>,
    query: &str,
    config: &ScanConfig,
) {
    let raw_links = handle.take_pending_links().await;
    if raw_links.is_empty() {
        return;
    }

    // Order-preserving dedup on the normalized form, then cap and drop
    // anything a previous harvest already claimed.
    let mut seen = HashSet::new();
    let candidates: Vec<String> = raw_links
        .iter()
        .filter_map(|raw| normalize_link(raw))
        .filter(|link| seen.insert(link.clone()))
        .collect();

    let claimed = handle
        .claim_unvisited(candidates, config.max_harvest_links)
        .await;
    if claimed.is_empty() {
        return;
    }

    info!(count = claimed.len(), "Assessing extracted onion sites");
    handle.set_message("Assessing extracted onion sites...").await;

    let _: Vec<()> = stream::iter(claimed.into_iter().map(|link| {
        let fetcher = Arc::clone(fetcher);
        let handle = Arc::clone(handle);
        let query = query.to_string();
        let config = config.clone();
        async move {
            assess(fetcher.as_ref(), &handle, &query, &link, &config).await;
        }
    }))
    .buffer_unordered(config.max_concurrent_fetches)
    .collect()
    .await;
}

async fn assess(
    fetcher: &dyn Fetcher,
    handle: &SessionHandle,
    query: &str,
    link: &str,
    config: &ScanConfig,
) {
    let outcome = fetcher.fetch(link, config.harvest_timeout).await;
    if !outcome.http_ok {
        debug!(url = link, "Skipping unreachable onion site");
        return;
    }

    let text = html::visible_text(&outcome.body, link);
    if !contains_identifier(&text, query) {
        return;
    }

    let title = html::derived_title(&outcome.body, link, config.max_title_len);
    let snippet = context_window(&text, query, config.context_window_words);
    let indicator = snippet.as_deref().and_then(match_breach_indicator);
    let risk = if indicator.is_some() {
        RiskLevel::Critical
    } else {
        RiskLevel::High
    };
    let context = match &snippet {
        Some(snippet) => format!("Found on onion site: {link}\n{snippet}"),
        None => format!("Found on onion site: {link}"),
    };

    info!(url = link, title, risk = %risk, "Identifier found on harvested onion site");
    handle
        .upsert_harvest_finding(&title, risk, indicator, context)
        .await;
}
