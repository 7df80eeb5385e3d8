//! Post-scan summarization.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;

use darkscout_common::{AnalysisSummary, ConcernEntry, RiskLevel, SessionSnapshot};

/// Roll a session snapshot up into an [`AnalysisSummary`].
///
/// Pure over the snapshot. The histogram carries every risk level, so a
/// level with zero findings still shows up in reports and exports.
pub fn analyze(snapshot: &SessionSnapshot) -> AnalysisSummary {
    let mut risk_histogram: BTreeMap<RiskLevel, u32> =
        RiskLevel::ALL.into_iter().map(|level| (level, 0)).collect();
    let mut category_breakdown = BTreeMap::new();
    let mut top_concerns = Vec::new();
    let mut breach_indicators = BTreeSet::new();
    let mut total_mentions: u32 = 0;

    for finding in snapshot.findings.values() {
        let mention_count = finding.mentions.len() as u32;
        total_mentions += mention_count;

        *risk_histogram.entry(finding.risk).or_insert(0) += 1;
        *category_breakdown.entry(finding.category).or_insert(0) += 1;

        if finding.risk >= RiskLevel::High && mention_count > 0 {
            top_concerns.push(ConcernEntry {
                source: finding.source.clone(),
                risk: finding.risk,
                mention_count,
            });
        }

        if let Some(indicator) = &finding.breach_indicator {
            breach_indicators.insert(indicator.clone());
        }
    }

    // Critical before high, then by mention volume. Source name breaks the
    // remaining ties so the ordering is stable across runs.
    top_concerns.sort_by(|a, b| {
        b.risk
            .cmp(&a.risk)
            .then(b.mention_count.cmp(&a.mention_count))
            .then(a.source.cmp(&b.source))
    });

    AnalysisSummary {
        query: snapshot.query.clone(),
        generated_at: Utc::now(),
        total_mentions,
        risk_histogram,
        category_breakdown,
        top_concerns,
        breach_indicators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use darkscout_common::{
        Finding, FindingCategory, IdentifierType, Mention, ScanStatus, SessionSnapshot,
    };
    use uuid::Uuid;

    fn empty_snapshot() -> SessionSnapshot {
        SessionSnapshot {
            id: Uuid::new_v4(),
            query: "victim@example.com".to_string(),
            identifier_type: IdentifierType::Email,
            status: ScanStatus::Completed,
            message: "Dark web scan completed".to_string(),
            started_at: Utc::now(),
            completed_at: Some(Utc::now()),
            total_sites_searched: 22,
            progress_percent: 100,
            categories: BTreeMap::new(),
            targets: BTreeMap::new(),
            findings: BTreeMap::new(),
        }
    }

    fn finding(
        source: &str,
        category: FindingCategory,
        risk: RiskLevel,
        mentions: usize,
        indicator: Option<&str>,
    ) -> Finding {
        Finding {
            source: source.to_string(),
            category,
            risk,
            description: "test".to_string(),
            breach_indicator: indicator.map(str::to_string),
            mentions: (0..mentions)
                .map(|i| Mention {
                    context: format!("context {i}"),
                    observed_at: Utc::now(),
                    metadata: None,
                })
                .collect(),
        }
    }

    #[test]
    fn empty_session_yields_zeroed_summary() {
        let summary = analyze(&empty_snapshot());

        assert_eq!(summary.total_mentions, 0);
        assert!(summary.top_concerns.is_empty());
        assert!(summary.breach_indicators.is_empty());
        assert!(summary.category_breakdown.is_empty());
        // Every risk level is present even with nothing found.
        assert_eq!(summary.risk_histogram.len(), 5);
        assert!(summary.risk_histogram.values().all(|&n| n == 0));
    }

    #[test]
    fn histogram_and_breakdown_count_findings_not_mentions() {
        let mut snapshot = empty_snapshot();
        snapshot.findings.insert(
            "A".to_string(),
            finding("A", FindingCategory::Breach, RiskLevel::High, 3, None),
        );
        snapshot.findings.insert(
            "B".to_string(),
            finding("B", FindingCategory::Breach, RiskLevel::High, 1, None),
        );
        snapshot.findings.insert(
            "C".to_string(),
            finding("C", FindingCategory::Paste, RiskLevel::MediumHigh, 2, None),
        );

        let summary = analyze(&snapshot);
        assert_eq!(summary.total_mentions, 6);
        assert_eq!(summary.risk_histogram[&RiskLevel::High], 2);
        assert_eq!(summary.risk_histogram[&RiskLevel::MediumHigh], 1);
        assert_eq!(summary.risk_histogram[&RiskLevel::Critical], 0);
        assert_eq!(summary.category_breakdown[&FindingCategory::Breach], 2);
        assert_eq!(summary.category_breakdown[&FindingCategory::Paste], 1);
    }

    #[test]
    fn concerns_require_high_risk_and_mentions() {
        let mut snapshot = empty_snapshot();
        // Medium-high never qualifies, however many mentions.
        snapshot.findings.insert(
            "quiet".to_string(),
            finding(
                "quiet",
                FindingCategory::Forum,
                RiskLevel::MediumHigh,
                5,
                None,
            ),
        );
        // High without a recorded mention does not qualify either.
        snapshot.findings.insert(
            "hollow".to_string(),
            finding("hollow", FindingCategory::Market, RiskLevel::High, 0, None),
        );
        snapshot.findings.insert(
            "loud".to_string(),
            finding("loud", FindingCategory::Breach, RiskLevel::High, 1, None),
        );

        let summary = analyze(&snapshot);
        assert_eq!(summary.top_concerns.len(), 1);
        assert_eq!(summary.top_concerns[0].source, "loud");
    }

    #[test]
    fn concerns_sorted_by_risk_then_mention_volume() {
        let mut snapshot = empty_snapshot();
        snapshot.findings.insert(
            "high-many".to_string(),
            finding(
                "high-many",
                FindingCategory::Breach,
                RiskLevel::High,
                9,
                None,
            ),
        );
        snapshot.findings.insert(
            "critical-few".to_string(),
            finding(
                "critical-few",
                FindingCategory::Ransomware,
                RiskLevel::Critical,
                1,
                None,
            ),
        );
        snapshot.findings.insert(
            "high-few".to_string(),
            finding("high-few", FindingCategory::Market, RiskLevel::High, 2, None),
        );

        let summary = analyze(&snapshot);
        let order: Vec<&str> = summary
            .top_concerns
            .iter()
            .map(|c| c.source.as_str())
            .collect();
        assert_eq!(order, vec!["critical-few", "high-many", "high-few"]);
    }

    #[test]
    fn indicators_deduplicate_across_findings() {
        let mut snapshot = empty_snapshot();
        snapshot.findings.insert(
            "A".to_string(),
            finding("A", FindingCategory::Breach, RiskLevel::High, 1, Some("leak")),
        );
        snapshot.findings.insert(
            "B".to_string(),
            finding("B", FindingCategory::Paste, RiskLevel::High, 1, Some("leak")),
        );
        snapshot.findings.insert(
            "C".to_string(),
            finding("C", FindingCategory::Forum, RiskLevel::High, 1, Some("dump")),
        );

        let summary = analyze(&snapshot);
        let seen: Vec<&str> = summary.breach_indicators.iter().map(String::as_str).collect();
        assert_eq!(seen, vec!["dump", "leak"]);
    }
}
