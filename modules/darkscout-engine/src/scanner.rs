//! Scan orchestration.
//!
//! Categories run in catalogue order, one at a time, so the progress
//! message tracks what the scan is currently looking at. Within a category
//! every target is probed concurrently under a shared fan-out bound. After
//! the last category the link harvester runs, then the session flips to
//! completed and the record goes to the sink.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use darkscout_common::{
    AnalysisSummary, DarkscoutError, IdentifierType, ScanConfig, SessionSnapshot, TargetCategory,
};

use crate::analysis::analyze;
use crate::export::{RecordSink, ScanRecord};
use crate::extract;
use crate::fetch::Fetcher;
use crate::harvest;
use crate::registry::Registry;
use crate::session::{SessionHandle, SessionStore};

pub struct Scanner {
    store: Arc<SessionStore>,
    fetcher: Arc<dyn Fetcher>,
    registry: Registry,
    config: ScanConfig,
    sink: Arc<dyn RecordSink>,
}

impl Scanner {
    pub fn new(
        store: Arc<SessionStore>,
        fetcher: Arc<dyn Fetcher>,
        registry: Registry,
        config: ScanConfig,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        info!(targets = registry.len(), "Scanner initialized");
        Self {
            store,
            fetcher,
            registry,
            config,
            sink,
        }
    }

    /// Kick off a scan in the background.
    ///
    /// The session is registered before this returns, so a status poll
    /// issued immediately afterwards already sees it processing. A query
    /// with a scan still running is rejected.
    pub async fn start_scan(
        self: &Arc<Self>,
        query: &str,
        identifier_type: IdentifierType,
    ) -> Result<(), DarkscoutError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DarkscoutError::EmptyQuery);
        }

        let handle = self
            .store
            .create(query, identifier_type, &self.registry)
            .await?;

        let scanner = Arc::clone(self);
        let query = query.to_string();
        tokio::spawn(async move {
            scanner.run(&handle, &query).await;
        });
        Ok(())
    }

    /// Run a scan to completion on the caller's task and hand back the
    /// final snapshot plus its summary.
    pub async fn run_scan(
        &self,
        query: &str,
        identifier_type: IdentifierType,
    ) -> Result<(SessionSnapshot, AnalysisSummary), DarkscoutError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DarkscoutError::EmptyQuery);
        }

        let handle = self
            .store
            .create(query, identifier_type, &self.registry)
            .await?;
        Ok(self.run(&handle, query).await)
    }

    /// Point-in-time view of the session for a query, if one was started.
    pub async fn session(&self, query: &str) -> Option<SessionSnapshot> {
        self.store.get(query).await
    }

    async fn run(
        &self,
        handle: &Arc<SessionHandle>,
        query: &str,
    ) -> (SessionSnapshot, AnalysisSummary) {
        info!(query, "Starting dark web scan");

        for category in TargetCategory::ALL {
            handle.begin_category(category).await;
            let targets = self.registry.targets_of(category);
            if targets.is_empty() {
                handle.finish_category(category).await;
                continue;
            }

            let _: Vec<()> = stream::iter(targets.into_iter().map(|site| {
                let fetcher = Arc::clone(&self.fetcher);
                let handle = Arc::clone(handle);
                let query = query.to_string();
                let config = self.config.clone();
                async move {
                    handle.begin_target(&site).await;
                    let url = site.url_for(&query);
                    let outcome = fetcher.fetch(&url, config.primary_timeout).await;
                    let result =
                        extract::extract(&outcome, &query, site.category, &url, &config);
                    handle
                        .complete_target(&site, outcome.error, Some(&result))
                        .await;
                }
            }))
            .buffer_unordered(self.config.max_concurrent_fetches)
            .collect()
            .await;

            handle.finish_category(category).await;
        }

        harvest::run(&self.fetcher, handle, query, &self.config).await;
        handle.complete().await;

        let snapshot = handle.snapshot().await;
        let summary = analyze(&snapshot);

        let record = ScanRecord::build(&snapshot, &summary);
        if let Err(e) = self.sink.persist(&record).await {
            warn!(error = %e, "Failed to persist scan record");
        }

        info!(
            query,
            findings = snapshot.findings.len(),
            mentions = snapshot.total_mentions(),
            "Dark web scan completed"
        );
        (snapshot, summary)
    }
}
