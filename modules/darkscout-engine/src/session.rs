//! Concurrency-safe session registry.
//!
//! One scan owns one session. Every mutation goes through a single write
//! lock on the session's state, so a mention append and its risk escalation
//! land atomically, and concurrent workers can never lose each other's
//! updates. Polling clients only ever see point-in-time snapshots.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use darkscout_common::{
    CategoryProgress, DarkscoutError, Finding, FindingCategory, IdentifierType, Mention,
    ProgressStatus, RiskLevel, ScanStatus, SessionSnapshot, TargetCategory, TargetState,
};

use crate::extract::ExtractResult;
use crate::registry::{Registry, TargetSite};

struct SessionState {
    id: Uuid,
    query: String,
    identifier_type: IdentifierType,
    status: ScanStatus,
    message: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    total_sites_searched: u32,
    categories: BTreeMap<TargetCategory, CategoryProgress>,
    targets: BTreeMap<String, TargetState>,
    findings: BTreeMap<String, Finding>,
    /// Onion links discovered during the primary pass, drained by the
    /// harvester.
    pending_links: Vec<String>,
    /// Normalized URLs the harvester has already claimed.
    visited: HashSet<String>,
}

impl SessionState {
    fn new(query: &str, identifier_type: IdentifierType, registry: &Registry) -> Self {
        let categories = TargetCategory::ALL
            .into_iter()
            .map(|category| {
                (
                    category,
                    CategoryProgress {
                        category,
                        description: category.description().to_string(),
                        status: ProgressStatus::Pending,
                        total: registry.targets_of(category).len() as u32,
                        completed: 0,
                        in_progress: 0,
                        found_results: 0,
                    },
                )
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            query: query.to_string(),
            identifier_type,
            status: ScanStatus::Processing,
            message: "Searching dark web sources...".to_string(),
            started_at: Utc::now(),
            completed_at: None,
            total_sites_searched: registry.len() as u32,
            categories,
            targets: BTreeMap::new(),
            findings: BTreeMap::new(),
            pending_links: Vec::new(),
            visited: HashSet::new(),
        }
    }

    fn progress_percent(&self) -> u8 {
        if self.status == ScanStatus::Completed {
            return 100;
        }
        let total: u32 = self.categories.values().map(|c| c.total).sum();
        if total == 0 {
            return 0;
        }
        let completed: u32 = self.categories.values().map(|c| c.completed).sum();
        (completed * 100 / total).min(99) as u8
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            query: self.query.clone(),
            identifier_type: self.identifier_type,
            status: self.status,
            message: self.message.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            total_sites_searched: self.total_sites_searched,
            progress_percent: self.progress_percent(),
            categories: self.categories.clone(),
            targets: self.targets.clone(),
            findings: self.findings.clone(),
        }
    }
}

/// Shared handle to one scan's mutable state.
pub struct SessionHandle {
    state: RwLock<SessionState>,
}

impl SessionHandle {
    fn new(state: SessionState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn status(&self) -> ScanStatus {
        self.state.read().await.status
    }

    pub async fn set_message(&self, message: &str) {
        self.state.write().await.message = message.to_string();
    }

    /// Mark a category as started and surface it in the progress message.
    pub async fn begin_category(&self, category: TargetCategory) {
        let mut state = self.state.write().await;
        state.message = format!("Searching {}...", category.description());
        if let Some(progress) = state.categories.get_mut(&category) {
            progress.status = ProgressStatus::InProgress;
        }
    }

    pub async fn finish_category(&self, category: TargetCategory) {
        let mut state = self.state.write().await;
        if let Some(progress) = state.categories.get_mut(&category) {
            progress.status = ProgressStatus::Completed;
            progress.in_progress = 0;
        }
    }

    pub async fn begin_target(&self, site: &TargetSite) {
        let mut state = self.state.write().await;
        state.targets.insert(
            site.name.to_string(),
            TargetState {
                category: site.category,
                status: ProgressStatus::InProgress,
                started_at: Utc::now(),
                finished_at: None,
                error: None,
            },
        );
        if let Some(progress) = state.categories.get_mut(&site.category) {
            progress.in_progress += 1;
        }
    }

    /// Fold one finished target into the session: advance counters, record
    /// the per-target outcome, and create-or-append the finding when the
    /// identifier was found. All under one write lock.
    pub async fn complete_target(
        &self,
        site: &TargetSite,
        error: Option<String>,
        result: Option<&ExtractResult>,
    ) {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Some(target) = state.targets.get_mut(site.name) {
            target.status = ProgressStatus::Completed;
            target.finished_at = Some(now);
            target.error = error;
        }
        if let Some(progress) = state.categories.get_mut(&site.category) {
            progress.completed += 1;
            progress.in_progress = progress.in_progress.saturating_sub(1);
        }

        let Some(result) = result.filter(|r| r.found) else {
            return;
        };

        if let Some(progress) = state.categories.get_mut(&site.category) {
            progress.found_results += 1;
        }

        let finding = state
            .findings
            .entry(site.name.to_string())
            .or_insert_with(|| {
                info!(
                    source = site.name,
                    risk = %result.risk,
                    category = %site.category,
                    "New finding recorded"
                );
                Finding {
                    source: site.name.to_string(),
                    category: site.category.into(),
                    risk: result.risk,
                    description: site.category.finding_description().to_string(),
                    breach_indicator: None,
                    mentions: Vec::new(),
                }
            });

        let escalated = finding.risk.escalate(result.risk);
        if escalated > finding.risk {
            info!(
                source = site.name,
                from = %finding.risk,
                to = %escalated,
                "Finding risk escalated"
            );
        }
        finding.risk = escalated;

        if finding.breach_indicator.is_none() {
            finding.breach_indicator = result.indicator.map(str::to_string);
        }

        if let Some(context) = &result.context {
            finding.mentions.push(Mention {
                context: context.clone(),
                observed_at: now,
                metadata: result.metadata.clone(),
            });
        }

        state
            .pending_links
            .extend(result.outbound_links.iter().cloned());
    }

    /// Drain the onion links accumulated during the primary pass.
    pub async fn take_pending_links(&self) -> Vec<String> {
        std::mem::take(&mut self.state.write().await.pending_links)
    }

    /// Cap the candidate list, then keep only links not yet visited,
    /// marking the survivors as visited in the same step.
    pub async fn claim_unvisited(&self, candidates: Vec<String>, cap: usize) -> Vec<String> {
        let mut state = self.state.write().await;
        candidates
            .into_iter()
            .take(cap)
            .filter(|link| state.visited.insert(link.clone()))
            .collect()
    }

    /// Create-or-append a synthetic finding for a harvested onion page.
    pub async fn upsert_harvest_finding(
        &self,
        title: &str,
        risk: RiskLevel,
        indicator: Option<&'static str>,
        context: String,
    ) {
        let mut state = self.state.write().await;

        let finding = state.findings.entry(title.to_string()).or_insert_with(|| {
            info!(source = title, risk = %risk, "New onion-site finding recorded");
            Finding {
                source: title.to_string(),
                category: FindingCategory::OnionSite,
                risk,
                description:
                    "This is a dark web (.onion) site containing a direct mention of the target identifier."
                        .to_string(),
                breach_indicator: None,
                mentions: Vec::new(),
            }
        });

        let escalated = finding.risk.escalate(risk);
        if escalated > finding.risk {
            info!(source = title, from = %finding.risk, to = %escalated, "Finding risk escalated");
        }
        finding.risk = escalated;

        if finding.breach_indicator.is_none() {
            finding.breach_indicator = indicator.map(str::to_string);
        }

        finding.mentions.push(Mention {
            context,
            observed_at: Utc::now(),
            metadata: None,
        });
    }

    /// Flip the session to its terminal state. After this the snapshot is
    /// stable and `progress_percent` reads 100.
    pub async fn complete(&self) {
        let mut state = self.state.write().await;
        state.status = ScanStatus::Completed;
        state.completed_at = Some(Utc::now());
        state.message = "Dark web scan completed".to_string();
    }
}

/// All known sessions, keyed by query.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a session for the query. A query whose previous session is
    /// still processing is rejected; a completed one is replaced.
    pub async fn create(
        &self,
        query: &str,
        identifier_type: IdentifierType,
        registry: &Registry,
    ) -> Result<Arc<SessionHandle>, DarkscoutError> {
        let mut sessions = self.sessions.write().await;

        if let Some(existing) = sessions.get(query) {
            if existing.status().await == ScanStatus::Processing {
                return Err(DarkscoutError::ScanAlreadyRunning(query.to_string()));
            }
        }

        let handle = Arc::new(SessionHandle::new(SessionState::new(
            query,
            identifier_type,
            registry,
        )));
        sessions.insert(query.to_string(), Arc::clone(&handle));
        Ok(handle)
    }

    /// Snapshot of the session for a query, if one was ever started.
    pub async fn get(&self, query: &str) -> Option<SessionSnapshot> {
        let handle = {
            let sessions = self.sessions.read().await;
            sessions.get(query).cloned()
        };
        match handle {
            Some(handle) => Some(handle.snapshot().await),
            None => None,
        }
    }
}
