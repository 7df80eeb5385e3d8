use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Risk ---

/// Severity of an exposure. `Ord` follows declaration order, so folding risk
/// levels with `max` escalates and never downgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    Medium,
    MediumHigh,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::MediumHigh,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::MediumHigh => "medium-high",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// The more severe of the two. Used everywhere a finding's risk is
    /// updated, so an already-critical finding can never drop back down.
    pub fn escalate(self, other: RiskLevel) -> RiskLevel {
        self.max(other)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Categories ---

/// The kinds of dark-web sources the scanner probes. Declaration order is
/// scan order: categories are processed strictly one after another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetCategory {
    General,
    Breach,
    Paste,
    Forum,
    Market,
    Ransomware,
    Specialized,
}

impl TargetCategory {
    pub const ALL: [TargetCategory; 7] = [
        TargetCategory::General,
        TargetCategory::Breach,
        TargetCategory::Paste,
        TargetCategory::Forum,
        TargetCategory::Market,
        TargetCategory::Ransomware,
        TargetCategory::Specialized,
    ];

    /// Human-readable plural used in progress messages
    /// ("Searching breach databases...").
    pub fn description(&self) -> &'static str {
        match self {
            TargetCategory::General => "general search engines",
            TargetCategory::Breach => "breach databases",
            TargetCategory::Paste => "paste sites",
            TargetCategory::Forum => "hacking forums",
            TargetCategory::Market => "dark web marketplaces",
            TargetCategory::Ransomware => "ransomware leak sites",
            TargetCategory::Specialized => "specialized search services",
        }
    }

    /// Risk assigned to a finding the moment the identifier turns up on a
    /// site of this category, before any indicator scan.
    pub fn baseline_risk(&self) -> RiskLevel {
        match self {
            TargetCategory::Breach => RiskLevel::High,
            TargetCategory::Paste => RiskLevel::MediumHigh,
            TargetCategory::Forum => RiskLevel::Medium,
            TargetCategory::Market => RiskLevel::High,
            TargetCategory::Ransomware => RiskLevel::Critical,
            TargetCategory::General | TargetCategory::Specialized => RiskLevel::Medium,
        }
    }

    /// Risk a breach-indicator match escalates to for this category. Applied
    /// via [`RiskLevel::escalate`], so categories whose baseline already sits
    /// at or above this level are unaffected.
    pub fn indicator_risk(&self) -> RiskLevel {
        match self {
            TargetCategory::Ransomware => RiskLevel::Critical,
            TargetCategory::Breach | TargetCategory::Market => RiskLevel::High,
            TargetCategory::Forum | TargetCategory::Paste => RiskLevel::MediumHigh,
            TargetCategory::General | TargetCategory::Specialized => RiskLevel::High,
        }
    }

    /// Boilerplate shown alongside findings from this category.
    pub fn finding_description(&self) -> &'static str {
        match self {
            TargetCategory::General => {
                "This is a general dark web search engine that indexes .onion sites."
            }
            TargetCategory::Breach => {
                "This is a known data breach repository that may contain leaked credentials."
            }
            TargetCategory::Paste => {
                "This is a paste site often used to anonymously share text content, including leaked data."
            }
            TargetCategory::Forum => {
                "This is a hacking-focused discussion forum where sensitive information may be shared or traded."
            }
            TargetCategory::Market => {
                "This is a darknet marketplace where data and credentials may be bought and sold."
            }
            TargetCategory::Ransomware => {
                "This is a ransomware leak site where stolen corporate and personal data is published."
            }
            TargetCategory::Specialized => {
                "This is a specialized search service focused on specific types of dark web content."
            }
        }
    }
}

impl std::fmt::Display for TargetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetCategory::General => write!(f, "general"),
            TargetCategory::Breach => write!(f, "breach"),
            TargetCategory::Paste => write!(f, "paste"),
            TargetCategory::Forum => write!(f, "forum"),
            TargetCategory::Market => write!(f, "market"),
            TargetCategory::Ransomware => write!(f, "ransomware"),
            TargetCategory::Specialized => write!(f, "specialized"),
        }
    }
}

/// Category attached to a finding. Mirrors [`TargetCategory`] plus the
/// synthetic `OnionSite` class for pages reached by following harvested
/// links rather than by probing the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    General,
    Breach,
    Paste,
    Forum,
    Market,
    Ransomware,
    Specialized,
    OnionSite,
}

impl From<TargetCategory> for FindingCategory {
    fn from(category: TargetCategory) -> Self {
        match category {
            TargetCategory::General => FindingCategory::General,
            TargetCategory::Breach => FindingCategory::Breach,
            TargetCategory::Paste => FindingCategory::Paste,
            TargetCategory::Forum => FindingCategory::Forum,
            TargetCategory::Market => FindingCategory::Market,
            TargetCategory::Ransomware => FindingCategory::Ransomware,
            TargetCategory::Specialized => FindingCategory::Specialized,
        }
    }
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FindingCategory::General => write!(f, "general"),
            FindingCategory::Breach => write!(f, "breach"),
            FindingCategory::Paste => write!(f, "paste"),
            FindingCategory::Forum => write!(f, "forum"),
            FindingCategory::Market => write!(f, "market"),
            FindingCategory::Ransomware => write!(f, "ransomware"),
            FindingCategory::Specialized => write!(f, "specialized"),
            FindingCategory::OnionSite => write!(f, "onion_site"),
        }
    }
}

// --- Identifiers ---

/// What kind of value is being searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    Email,
    Domain,
    Username,
    Phone,
}

impl std::fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierType::Email => write!(f, "email"),
            IdentifierType::Domain => write!(f, "domain"),
            IdentifierType::Username => write!(f, "username"),
            IdentifierType::Phone => write!(f, "phone"),
        }
    }
}

impl std::str::FromStr for IdentifierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "email" => Ok(IdentifierType::Email),
            "domain" => Ok(IdentifierType::Domain),
            "username" => Ok(IdentifierType::Username),
            "phone" => Ok(IdentifierType::Phone),
            other => Err(format!(
                "unknown identifier type '{other}' (expected email, domain, username, or phone)"
            )),
        }
    }
}

// --- Scan state ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Processing,
    Completed,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::Processing => write!(f, "processing"),
            ScanStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Pending,
    InProgress,
    Completed,
}

// --- Findings ---

/// Structured details pulled from a ransomware leak post: when it was
/// published, how much data, and which organization was hit. All best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeakMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

impl LeakMetadata {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.data_size.is_none() && self.organization.is_none()
    }
}

/// One occurrence of the identifier with its surrounding context window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub context: String,
    pub observed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<LeakMetadata>,
}

/// Accumulated evidence for one source within a session. Risk only ever
/// moves up: every write goes through [`RiskLevel::escalate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub source: String,
    pub category: FindingCategory,
    pub risk: RiskLevel,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breach_indicator: Option<String>,
    pub mentions: Vec<Mention>,
}

// --- Progress ---

/// Per-category counters surfaced to polling clients.
/// `completed + in_progress <= total` holds at every instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category: TargetCategory,
    pub description: String,
    pub status: ProgressStatus,
    pub total: u32,
    pub completed: u32,
    pub in_progress: u32,
    pub found_results: u32,
}

/// Per-target status line, useful for debugging a slow or flaky source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetState {
    pub category: TargetCategory,
    pub status: ProgressStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- Session snapshot ---

/// Point-in-time copy of a scan session, safe to hand to a polling client
/// while workers keep mutating the live state behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub query: String,
    pub identifier_type: IdentifierType,
    pub status: ScanStatus,
    pub message: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub total_sites_searched: u32,
    /// min(99, completed/total) while processing; exactly 100 once completed.
    pub progress_percent: u8,
    pub categories: BTreeMap<TargetCategory, CategoryProgress>,
    pub targets: BTreeMap<String, TargetState>,
    pub findings: BTreeMap<String, Finding>,
}

impl SessionSnapshot {
    pub fn total_mentions(&self) -> u32 {
        self.findings.values().map(|f| f.mentions.len() as u32).sum()
    }

    pub fn highest_risk(&self) -> Option<RiskLevel> {
        self.findings.values().map(|f| f.risk).max()
    }
}

// --- Analysis ---

/// One entry in the "most concerning" list: a high-or-critical finding with
/// at least one mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcernEntry {
    pub source: String,
    pub risk: RiskLevel,
    pub mention_count: u32,
}

/// Post-scan rollup derived from a completed session snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub query: String,
    pub generated_at: DateTime<Utc>,
    pub total_mentions: u32,
    /// Count of findings per risk level. Every level is present, zero or not.
    pub risk_histogram: BTreeMap<RiskLevel, u32>,
    pub category_breakdown: BTreeMap<FindingCategory, u32>,
    /// Findings at high or critical with at least one mention, most
    /// concerning first.
    pub top_concerns: Vec<ConcernEntry>,
    pub breach_indicators: BTreeSet<String>,
}

impl std::fmt::Display for AnalysisSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Dark Web Scan Complete ===")?;
        writeln!(f, "Query:          {}", self.query)?;
        writeln!(f, "Total mentions: {}", self.total_mentions)?;
        writeln!(f, "\nBy risk level:")?;
        for level in RiskLevel::ALL {
            let count = self.risk_histogram.get(&level).copied().unwrap_or(0);
            writeln!(f, "  {:<12} {}", level.as_str(), count)?;
        }
        if !self.category_breakdown.is_empty() {
            writeln!(f, "\nBy category:")?;
            for (category, count) in &self.category_breakdown {
                writeln!(f, "  {:<12} {}", category.to_string(), count)?;
            }
        }
        if !self.top_concerns.is_empty() {
            writeln!(f, "\nMost concerning:")?;
            for concern in &self.top_concerns {
                writeln!(
                    f,
                    "  [{}] {} ({} mention{})",
                    concern.risk,
                    concern.source,
                    concern.mention_count,
                    if concern.mention_count == 1 { "" } else { "s" }
                )?;
            }
        }
        if !self.breach_indicators.is_empty() {
            writeln!(f, "\nBreach indicators seen:")?;
            for indicator in &self.breach_indicators {
                writeln!(f, "  {indicator}")?;
            }
        }
        Ok(())
    }
}
