use std::collections::BTreeMap;

use super::master::{CompanyRecord, INDUSTRY_COLUMNS, TIER_ORDER};
use super::model::Table;

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

/// Headline numbers over the currently visible companies.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub shown: usize,
    pub avg_hiring_score: f64,
    pub high_momentum: usize,
    pub high_momentum_pct: f64,
    pub actively_hiring: usize,
    pub actively_hiring_pct: f64,
}

impl KpiSummary {
    /// An empty selection yields zeros throughout, never NaN.
    pub fn over<'a>(records: impl Iterator<Item = &'a CompanyRecord>) -> Self {
        let mut shown = 0usize;
        let mut score_sum = 0.0;
        let mut high_momentum = 0usize;
        let mut actively_hiring = 0usize;

        for record in records {
            shown += 1;
            score_sum += record.hiring_score;
            if matches!(
                record.momentum_tier.as_deref(),
                Some("Very High") | Some("High")
            ) {
                high_momentum += 1;
            }
            if record.has_job_postings == Some(true) {
                actively_hiring += 1;
            }
        }

        let pct = |count: usize| {
            if shown == 0 {
                0.0
            } else {
                count as f64 / shown as f64 * 100.0
            }
        };

        KpiSummary {
            shown,
            avg_hiring_score: if shown == 0 { 0.0 } else { score_sum / shown as f64 },
            high_momentum,
            high_momentum_pct: pct(high_momentum),
            actively_hiring,
            actively_hiring_pct: pct(actively_hiring),
        }
    }
}

// ---------------------------------------------------------------------------
// Distribution charts
// ---------------------------------------------------------------------------

/// Score histogram split by tier, for a stacked bar rendering.
pub struct TierHistogram {
    pub lo: f64,
    pub bin_width: f64,
    /// One count series per `TIER_ORDER` entry, each `bins` long.
    pub counts: [Vec<u64>; 5],
}

impl TierHistogram {
    pub fn bin_center(&self, bin: usize) -> f64 {
        self.lo + (bin as f64 + 0.5) * self.bin_width
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|series| series.iter().all(|&c| c == 0))
    }
}

/// Bucket `(score, tier)` samples into `bins` equal bins over `[lo, hi]`.
/// Samples outside the range are clamped into the edge bins; tiers outside
/// `TIER_ORDER` are dropped.
pub fn tier_histogram(samples: &[(f64, &str)], lo: f64, hi: f64, bins: usize) -> TierHistogram {
    let bin_width = (hi - lo) / bins as f64;
    let mut counts: [Vec<u64>; 5] = std::array::from_fn(|_| vec![0; bins]);

    for &(score, tier) in samples {
        let Some(tier_idx) = TIER_ORDER.iter().position(|t| *t == tier) else {
            continue;
        };
        let bin = (((score - lo) / bin_width).floor() as i64).clamp(0, bins as i64 - 1);
        counts[tier_idx][bin as usize] += 1;
    }

    TierHistogram {
        lo,
        bin_width,
        counts,
    }
}

/// Companies per industry flag over the full features dataset, sorted by
/// count ascending so the bar chart reads smallest to largest. Missing
/// indicator columns are skipped.
pub fn industry_counts(features: &Table) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = INDUSTRY_COLUMNS
        .iter()
        .filter(|(column, _)| features.has_column(column))
        .map(|(column, label)| {
            let count = features
                .rows
                .iter()
                .filter(|row| row.bool_at(column).unwrap_or(false))
                .count() as u64;
            (label.to_string(), count)
        })
        .collect();
    counts.sort_by_key(|(_, count)| *count);
    counts
}

/// Companies per funding stage label, sorted by count descending with
/// alphabetical tie-breaks, for the donut chart.
pub fn stage_counts(records: &[CompanyRecord]) -> Vec<(String, u64)> {
    let mut by_stage: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *by_stage.entry(record.funding_stage_label.as_str()).or_default() += 1;
    }
    let mut counts: Vec<(String, u64)> = by_stage
        .into_iter()
        .map(|(stage, count)| (stage.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Row, Value};

    fn record(score: f64, tier: Option<&str>, hiring: Option<bool>) -> CompanyRecord {
        CompanyRecord {
            company_id: "c".to_string(),
            name: None,
            hiring_score: score,
            hiring_rank: 1,
            hiring_tier: None,
            momentum_score: None,
            momentum_tier: tier.map(str::to_string),
            momentum_rank: None,
            funding_stage: None,
            has_job_postings: hiring,
            signals: [None; 5],
            industries: None,
            hq_location: None,
            description: None,
            city: None,
            state: None,
            country: None,
            total_funding_usd: None,
            last_funding_date: None,
            last_funding_type: None,
            num_employees: None,
            website: None,
            linkedin: None,
            top_investors: None,
            num_investors: None,
            founded_date: None,
            funding_stage_label: "Unknown".to_string(),
            primary_industry: "Other".to_string(),
            total_funding_display: "N/A".to_string(),
        }
    }

    #[test]
    fn kpis_over_empty_selection_are_zero() {
        let summary = KpiSummary::over(std::iter::empty());
        assert_eq!(summary.shown, 0);
        assert_eq!(summary.avg_hiring_score, 0.0);
        assert_eq!(summary.high_momentum_pct, 0.0);
        assert_eq!(summary.actively_hiring_pct, 0.0);
    }

    #[test]
    fn kpis_count_momentum_and_hiring_flags() {
        let records = vec![
            record(80.0, Some("Very High"), Some(true)),
            record(60.0, Some("High"), Some(false)),
            record(40.0, Some("Low"), None),
            record(20.0, None, Some(true)),
        ];
        let summary = KpiSummary::over(records.iter());
        assert_eq!(summary.shown, 4);
        assert_eq!(summary.avg_hiring_score, 50.0);
        assert_eq!(summary.high_momentum, 2);
        assert_eq!(summary.high_momentum_pct, 50.0);
        assert_eq!(summary.actively_hiring, 2);
        assert_eq!(summary.actively_hiring_pct, 50.0);
    }

    #[test]
    fn histogram_bins_cover_edges_and_clamp() {
        let samples = vec![
            (0.0, "Low"),
            (4.9, "Low"),
            (5.0, "Low"),
            (100.0, "Very High"),
            (120.0, "Very High"),
        ];
        let hist = tier_histogram(&samples, 0.0, 100.0, 20);
        let low_idx = TIER_ORDER.iter().position(|t| *t == "Low").unwrap();
        let vh_idx = TIER_ORDER.iter().position(|t| *t == "Very High").unwrap();
        assert_eq!(hist.counts[low_idx][0], 2);
        assert_eq!(hist.counts[low_idx][1], 1);
        assert_eq!(hist.counts[vh_idx][19], 2);
        assert_eq!(hist.bin_center(0), 2.5);
    }

    #[test]
    fn histogram_drops_unknown_tiers() {
        let hist = tier_histogram(&[(50.0, "Mystery")], 0.0, 100.0, 20);
        assert!(hist.is_empty());
    }

    #[test]
    fn industry_counts_sort_ascending_and_skip_absent_columns() {
        let mut features = Table::new(vec![
            "company_id".to_string(),
            "ind_ai".to_string(),
            "ind_saas".to_string(),
        ]);
        for (ai, saas) in [(1.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
            let mut row = Row::new();
            row.insert("company_id", Value::Str("c".to_string()));
            row.insert("ind_ai", Value::Float(ai));
            row.insert("ind_saas", Value::Float(saas));
            features.rows.push(row);
        }
        let counts = industry_counts(&features);
        assert_eq!(
            counts,
            vec![("SaaS".to_string(), 2), ("AI".to_string(), 3)]
        );
    }

    #[test]
    fn stage_counts_sort_by_count_then_label() {
        let mut records = vec![
            record(1.0, None, None),
            record(2.0, None, None),
            record(3.0, None, None),
            record(4.0, None, None),
        ];
        records[0].funding_stage_label = "Seed".to_string();
        records[1].funding_stage_label = "Seed".to_string();
        records[2].funding_stage_label = "Series A".to_string();
        records[3].funding_stage_label = "Post-IPO".to_string();
        let counts = stage_counts(&records);
        assert_eq!(
            counts,
            vec![
                ("Seed".to_string(), 2),
                ("Post-IPO".to_string(), 1),
                ("Series A".to_string(), 1),
            ]
        );
    }
}
