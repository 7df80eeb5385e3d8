//! Scan record persistence.
//!
//! A completed scan is flattened into a self-describing [`ScanRecord`] and
//! handed to a [`RecordSink`]. The default sink writes pretty-printed JSON
//! under the configured results directory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use darkscout_common::{
    AnalysisSummary, CategoryProgress, Finding, IdentifierType, RiskLevel, SessionSnapshot,
    TargetCategory,
};

/// Bumped whenever the record layout changes shape.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything worth keeping from one finished scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub schema_version: u32,
    pub id: Uuid,
    pub query: String,
    pub identifier_type: IdentifierType,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    pub total_sites_searched: u32,
    pub result_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highest_risk: Option<RiskLevel>,
    pub categories: BTreeMap<TargetCategory, CategoryProgress>,
    pub findings: BTreeMap<String, Finding>,
    pub summary: AnalysisSummary,
}

impl ScanRecord {
    pub fn build(snapshot: &SessionSnapshot, summary: &AnalysisSummary) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: snapshot.id,
            query: snapshot.query.clone(),
            identifier_type: snapshot.identifier_type,
            started_at: snapshot.started_at,
            completed_at: snapshot.completed_at,
            duration_seconds: snapshot
                .completed_at
                .map(|end| (end - snapshot.started_at).num_seconds()),
            total_sites_searched: snapshot.total_sites_searched,
            result_count: snapshot.findings.len() as u32,
            highest_risk: snapshot.highest_risk(),
            categories: snapshot.categories.clone(),
            findings: snapshot.findings.clone(),
            summary: summary.clone(),
        }
    }
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn persist(&self, record: &ScanRecord) -> Result<()>;
}

/// Writes one JSON file per scan, named after the query and a timestamp.
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl RecordSink for JsonFileSink {
    async fn persist(&self, record: &ScanRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create results dir {}", self.dir.display()))?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{stamp}.json", sanitize_query(&record.query));
        let path = self.dir.join(filename);

        let bytes =
            serde_json::to_vec_pretty(record).context("Failed to serialize scan record")?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write scan record to {}", path.display()))?;

        info!(path = %path.display(), query = record.query, "Scan record saved");
        Ok(())
    }
}

/// Discards records. Handy where persistence is not wanted.
pub struct NoopSink;

#[async_trait]
impl RecordSink for NoopSink {
    async fn persist(&self, _record: &ScanRecord) -> Result<()> {
        Ok(())
    }
}

/// Queries go into filenames, so anything outside a conservative character
/// set becomes an underscore.
fn sanitize_query(query: &str) -> String {
    query
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
