//! One anonymized HTTP GET per target/query pair.
//!
//! All traffic leaves through a SOCKS proxy speaking `socks5h`, so even DNS
//! for onion hosts resolves on the proxy side. Requests rotate through a
//! small pool of realistic browser identities.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

/// Browser identities rotated per request so consecutive probes don't
/// present an identical fingerprint.
const BROWSER_IDENTITIES: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.107 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:90.0) Gecko/20100101 Firefox/90.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:89.0) Gecko/20100101 Firefox/89.0",
];

/// What one fetch produced. Never an `Err`: unreachable sites are an
/// expected outcome on this network, captured in `error` and folded into
/// progress as a soft failure.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub http_ok: bool,
    pub body: String,
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn success(body: String) -> Self {
        Self {
            http_ok: true,
            body,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            http_ok: false,
            body: String::new(),
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch one URL with the given per-request timeout. Always returns an
    /// outcome; failures are data, not errors.
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome;
}

/// Fetcher routing every request through an onion-capable SOCKS proxy.
pub struct TorFetcher {
    client: reqwest::Client,
}

impl TorFetcher {
    pub fn new(socks_proxy: &str) -> Result<Self> {
        let proxy = reqwest::Proxy::all(socks_proxy)
            .with_context(|| format!("Invalid SOCKS proxy address: {socks_proxy}"))?;
        let client = reqwest::Client::builder()
            .proxy(proxy)
            .build()
            .context("Failed to build HTTP client")?;

        info!(proxy = socks_proxy, "TorFetcher initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for TorFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> FetchOutcome {
        let identity = BROWSER_IDENTITIES
            .choose(&mut rand::rng())
            .copied()
            .unwrap_or(BROWSER_IDENTITIES[0]);

        debug!(url, "Fetching page");

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header("User-Agent", identity)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Connection", "keep-alive")
            .header("Upgrade-Insecure-Requests", "1")
            .header("Cache-Control", "max-age=0")
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    warn!(url, status = %status, "Site returned non-success status");
                    return FetchOutcome::failure(format!(
                        "Site returned status code {}",
                        status.as_u16()
                    ));
                }
                match response.text().await {
                    Ok(body) => {
                        debug!(url, bytes = body.len(), "Fetched successfully");
                        FetchOutcome::success(body)
                    }
                    Err(e) => {
                        warn!(url, error = %e, "Failed to read response body");
                        FetchOutcome::failure(format!("Failed to read response body: {e}"))
                    }
                }
            }
            Err(e) => {
                warn!(url, error = %e, "Fetch failed");
                FetchOutcome::failure(e.to_string())
            }
        }
    }
}
