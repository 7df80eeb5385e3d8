use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables.
/// Everything has a sensible default; nothing is required.
#[derive(Debug, Clone)]
pub struct Config {
    /// SOCKS endpoint all fetches are routed through. The `socks5h` scheme
    /// matters: DNS resolution must happen on the proxy side, never locally.
    pub socks_proxy: String,

    /// Directory completed scan records are written into.
    pub results_dir: String,

    pub scan: ScanConfig,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if a var is present but malformed.
    pub fn from_env() -> Self {
        Self {
            socks_proxy: env::var("DARKSCOUT_SOCKS_PROXY")
                .unwrap_or_else(|_| "socks5h://127.0.0.1:9050".to_string()),
            results_dir: env::var("DARKSCOUT_RESULTS_DIR").unwrap_or_else(|_| "results".to_string()),
            scan: ScanConfig::from_env(),
        }
    }
}

/// Tunables for a single scan run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Word tokens kept on each side of the identifier in a context window.
    pub context_window_words: usize,
    /// Upper bound on harvested onion links followed after the primary pass.
    pub max_harvest_links: usize,
    /// In-flight fetch ceiling within one category (and within the harvest).
    pub max_concurrent_fetches: usize,
    /// Per-request timeout against catalogue targets.
    pub primary_timeout: Duration,
    /// Per-request timeout against harvested links. Shorter: these pages are
    /// speculative and there can be up to `max_harvest_links` of them.
    pub harvest_timeout: Duration,
    /// Derived titles for harvested pages are clipped to this many characters.
    pub max_title_len: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            context_window_words: 75,
            max_harvest_links: 20,
            max_concurrent_fetches: 8,
            primary_timeout: Duration::from_secs(30),
            harvest_timeout: Duration::from_secs(20),
            max_title_len: 50,
        }
    }
}

impl ScanConfig {
    pub fn from_env() -> Self {
        let defaults = ScanConfig::default();
        Self {
            context_window_words: env_usize(
                "DARKSCOUT_CONTEXT_WINDOW_WORDS",
                defaults.context_window_words,
            ),
            max_harvest_links: env_usize("DARKSCOUT_MAX_HARVEST_LINKS", defaults.max_harvest_links),
            max_concurrent_fetches: env_usize(
                "DARKSCOUT_MAX_CONCURRENT_FETCHES",
                defaults.max_concurrent_fetches,
            ),
            primary_timeout: Duration::from_secs(env_u64(
                "DARKSCOUT_PRIMARY_TIMEOUT_SECS",
                defaults.primary_timeout.as_secs(),
            )),
            harvest_timeout: Duration::from_secs(env_u64(
                "DARKSCOUT_HARVEST_TIMEOUT_SECS",
                defaults.harvest_timeout.as_secs(),
            )),
            max_title_len: env_usize("DARKSCOUT_MAX_TITLE_LEN", defaults.max_title_len),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}
