use anyhow::{bail, Result};

use super::loader::DataBundle;
use super::model::Row;

// ---------------------------------------------------------------------------
// Domain constants
// ---------------------------------------------------------------------------

/// Funding stage codes as published by the scoring pipeline.
pub const FUNDING_STAGE_LABELS: [(f64, &str); 5] = [
    (0.0, "Pre-Seed / Angel"),
    (1.0, "Seed"),
    (2.0, "Series A"),
    (3.0, "Series B"),
    (4.0, "Post-IPO"),
];

pub const UNKNOWN_STAGE: &str = "Unknown";

/// Industry indicator columns in priority order; the first set flag wins.
pub const INDUSTRY_COLUMNS: [(&str, &str); 12] = [
    ("ind_ai", "AI"),
    ("ind_software", "Software"),
    ("ind_it", "IT"),
    ("ind_saas", "SaaS"),
    ("ind_healthcare", "Healthcare"),
    ("ind_fintech", "FinTech"),
    ("ind_financial", "Financial Services"),
    ("ind_ml", "Machine Learning"),
    ("ind_manufacturing", "Manufacturing"),
    ("ind_biotech", "Biotech"),
    ("ind_genai", "Generative AI"),
    ("ind_devtools", "Developer Tools"),
];

pub const OTHER_INDUSTRY: &str = "Other";

/// Tier labels from best to worst, shared by both score families.
pub const TIER_ORDER: [&str; 5] = ["Very High", "High", "Moderate", "Low", "Very Low"];

/// The five hiring signals with their weighted display labels, in radar
/// order.
pub const SIGNAL_COLUMNS: [(&str, &str); 5] = [
    ("signal_job_posting", "Job Posting (30%)"),
    ("signal_funding_recency", "Funding Recency (25%)"),
    ("signal_headcount_proxy", "Headcount Proxy (20%)"),
    ("signal_github_activity", "GitHub Activity (15%)"),
    ("signal_company_trajectory", "Trajectory (10%)"),
];

// ---------------------------------------------------------------------------
// Master table
// ---------------------------------------------------------------------------

/// One company, denormalized across all datasets. Fields sourced from a
/// join are `None` when the dataset has no row for the company; the three
/// derived labels are always populated.
#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub company_id: String,
    pub name: Option<String>,

    // hiring (the anchor dataset)
    pub hiring_score: f64,
    pub hiring_rank: i64,
    pub hiring_tier: Option<String>,

    // scores
    pub momentum_score: Option<f64>,
    pub momentum_tier: Option<String>,
    pub momentum_rank: Option<i64>,
    pub funding_stage: Option<f64>,

    // features
    pub has_job_postings: Option<bool>,
    /// Values for `SIGNAL_COLUMNS`, in order.
    pub signals: [Option<f64>; 5],

    // spine
    pub industries: Option<String>,
    pub hq_location: Option<String>,
    pub description: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub total_funding_usd: Option<f64>,
    pub last_funding_date: Option<String>,
    pub last_funding_type: Option<String>,
    pub num_employees: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub top_investors: Option<String>,
    pub num_investors: Option<i64>,
    pub founded_date: Option<String>,

    // derived, never null
    pub funding_stage_label: String,
    pub primary_industry: String,
    pub total_funding_display: String,
}

/// The assembled view the whole application reads from. Rebuilt from
/// scratch on every load, never mutated in place.
#[derive(Debug)]
pub struct MasterTable {
    /// Sorted ascending by `hiring_rank`, ties broken by `company_id`.
    pub records: Vec<CompanyRecord>,
    /// Sorted unique `primary_industry` values, for the filter control.
    pub industry_options: Vec<String>,
    /// Sorted unique `funding_stage_label` values, for the filter control.
    pub stage_options: Vec<String>,
    /// Population median per `SIGNAL_COLUMNS` entry; 0 when no company
    /// carries the signal.
    pub signal_medians: [f64; 5],
}

impl MasterTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, company_id: &str) -> Option<&CompanyRecord> {
        self.records.iter().find(|r| r.company_id == company_id)
    }
}

/// Join the five datasets into the master table. Pure function of the
/// bundle; missing optional columns are tolerated, missing required ones
/// abort the load.
pub fn assemble(bundle: &DataBundle) -> Result<MasterTable> {
    for column in ["company_id", "hiring_score", "hiring_rank"] {
        if !bundle.hiring.has_column(column) {
            bail!("hiring dataset missing required column '{column}'");
        }
    }
    for column in [
        "company_id",
        "momentum_score",
        "momentum_tier",
        "momentum_rank",
        "funding_stage",
    ] {
        if !bundle.scores.has_column(column) {
            bail!("scores dataset missing required column '{column}'");
        }
    }

    let scores_by_id = bundle.scores.index_by("company_id");
    let spine_by_id = bundle.spine.index_by("company_id");
    let features_by_id = bundle.features.index_by("company_id");
    let empty = Row::new();

    let mut records = Vec::with_capacity(bundle.hiring.len());
    for row in &bundle.hiring.rows {
        let (Some(company_id), Some(hiring_score), Some(hiring_rank)) = (
            row.str_at("company_id"),
            row.f64_at("hiring_score"),
            row.i64_at("hiring_rank"),
        ) else {
            log::warn!("skipping hiring row with missing id, score or rank");
            continue;
        };

        let scores = scores_by_id.get(company_id).copied().unwrap_or(&empty);
        let spine = spine_by_id.get(company_id).copied().unwrap_or(&empty);
        let features = features_by_id.get(company_id).copied().unwrap_or(&empty);

        // Hiring's name wins over the spine's when both exist.
        let name = row
            .str_at("name")
            .or_else(|| spine.str_at("name"))
            .map(str::to_string);

        let funding_stage = scores.f64_at("funding_stage");
        let total_funding_usd = spine.f64_at("total_funding_usd");

        let mut signals = [None; 5];
        for (slot, (column, _)) in signals.iter_mut().zip(SIGNAL_COLUMNS) {
            *slot = features.f64_at(column);
        }

        records.push(CompanyRecord {
            company_id: company_id.to_string(),
            name,
            hiring_score,
            hiring_rank,
            hiring_tier: row.str_at("hiring_tier").map(str::to_string),
            momentum_score: scores.f64_at("momentum_score"),
            momentum_tier: scores.str_at("momentum_tier").map(str::to_string),
            momentum_rank: scores.i64_at("momentum_rank"),
            funding_stage,
            has_job_postings: features.bool_at("has_job_postings"),
            signals,
            industries: spine.str_at("industries").map(str::to_string),
            hq_location: spine.str_at("hq_location").map(str::to_string),
            description: spine.str_at("description_combined").map(str::to_string),
            city: spine.str_at("city").map(str::to_string),
            state: spine.str_at("state").map(str::to_string),
            country: spine.str_at("country").map(str::to_string),
            total_funding_usd,
            last_funding_date: spine.text_at("last_funding_date"),
            last_funding_type: spine.str_at("last_funding_type").map(str::to_string),
            num_employees: spine.text_at("num_employees"),
            website: spine.str_at("website").map(str::to_string),
            linkedin: spine.str_at("linkedin").map(str::to_string),
            top_investors: spine.str_at("top_investors").map(str::to_string),
            num_investors: spine.i64_at("num_investors"),
            founded_date: spine.text_at("founded_date"),
            funding_stage_label: funding_stage_label(funding_stage),
            primary_industry: primary_industry(features),
            total_funding_display: format_usd(total_funding_usd),
        });
    }

    records.sort_by(|a, b| {
        a.hiring_rank
            .cmp(&b.hiring_rank)
            .then_with(|| a.company_id.cmp(&b.company_id))
    });

    let mut industry_options: Vec<String> = records
        .iter()
        .map(|r| r.primary_industry.clone())
        .collect();
    industry_options.sort();
    industry_options.dedup();

    let mut stage_options: Vec<String> = records
        .iter()
        .map(|r| r.funding_stage_label.clone())
        .collect();
    stage_options.sort();
    stage_options.dedup();

    let mut signal_medians = [0.0; 5];
    for (i, slot) in signal_medians.iter_mut().enumerate() {
        let values: Vec<f64> = records.iter().filter_map(|r| r.signals[i]).collect();
        *slot = median(&values).unwrap_or(0.0);
    }

    Ok(MasterTable {
        records,
        industry_options,
        stage_options,
        signal_medians,
    })
}

// ---------------------------------------------------------------------------
// Derivations
// ---------------------------------------------------------------------------

/// Map a funding stage code to its label; unmapped or missing codes read
/// "Unknown".
pub fn funding_stage_label(code: Option<f64>) -> String {
    code.and_then(|c| {
        FUNDING_STAGE_LABELS
            .iter()
            .find(|(v, _)| *v == c)
            .map(|(_, label)| (*label).to_string())
    })
    .unwrap_or_else(|| UNKNOWN_STAGE.to_string())
}

/// First set industry flag in priority order, else "Other". A company
/// absent from features also reads "Other".
pub fn primary_industry(features_row: &Row) -> String {
    for (column, label) in INDUSTRY_COLUMNS {
        if features_row.bool_at(column).unwrap_or(false) {
            return label.to_string();
        }
    }
    OTHER_INDUSTRY.to_string()
}

/// Human-readable funding magnitude: `$2.3M`, `$45K`, `$750`, or `N/A`.
pub fn format_usd(value: Option<f64>) -> String {
    match value {
        None => "N/A".to_string(),
        Some(v) if v.is_nan() => "N/A".to_string(),
        Some(v) if v >= 1_000_000.0 => format!("${:.1}M", v / 1_000_000.0),
        Some(v) if v >= 1_000.0 => format!("${:.0}K", v / 1_000.0),
        Some(v) => format!("${}", group_thousands(v)),
    }
}

fn group_thousands(v: f64) -> String {
    let rounded = format!("{v:.0}");
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}

/// Median of the given values; `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Table, Value};
    use std::sync::Arc;

    fn table(columns: &[&str], rows: &[&[Value]]) -> Arc<Table> {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect());
        for cells in rows {
            let mut row = Row::new();
            for (column, value) in columns.iter().zip(*cells) {
                row.insert(*column, value.clone());
            }
            t.rows.push(row);
        }
        Arc::new(t)
    }

    fn s(v: &str) -> Value {
        Value::Str(v.to_string())
    }

    fn f(v: f64) -> Value {
        Value::Float(v)
    }

    fn bundle() -> DataBundle {
        let hiring = table(
            &["company_id", "name", "hiring_score", "hiring_tier", "hiring_rank"],
            &[
                &[s("c2"), s("Beta Labs"), f(64.2), s("High"), Value::Int(2)],
                &[s("c1"), s("ACME Corp"), f(88.0), s("Very High"), Value::Int(1)],
                &[s("c3"), Value::Null, f(31.0), s("Low"), Value::Int(3)],
            ],
        );
        let scores = table(
            &["company_id", "momentum_score", "momentum_tier", "momentum_rank", "funding_stage"],
            &[
                &[s("c1"), f(0.91), s("Very High"), Value::Int(1), f(2.0)],
                &[s("c2"), f(0.44), s("Moderate"), Value::Int(2), f(7.0)],
            ],
        );
        let features = table(
            &[
                "company_id",
                "ind_software",
                "ind_ai",
                "has_job_postings",
                "signal_job_posting",
                "signal_funding_recency",
            ],
            &[
                &[s("c1"), f(1.0), f(1.0), Value::Bool(true), f(90.0), f(70.0)],
                &[s("c2"), f(1.0), f(0.0), Value::Bool(false), f(40.0), f(30.0)],
            ],
        );
        let metadata = table(
            &["feature_name", "group", "mean", "min", "max"],
            &[&[s("signal_job_posting"), s("signals"), f(51.0), f(0.0), f(100.0)]],
        );
        let spine = table(
            &["company_id", "name", "city", "country", "total_funding_usd"],
            &[
                &[s("c1"), s("ACME Corporation"), s("Austin"), s("USA"), f(2_300_000.0)],
                &[s("c3"), s("Gamma Inc"), s("Berlin"), s("Germany"), f(45_000.0)],
            ],
        );
        DataBundle {
            scores,
            hiring,
            features,
            metadata,
            spine,
        }
    }

    #[test]
    fn joins_are_anchored_on_hiring_and_sorted_by_rank() {
        let master = assemble(&bundle()).unwrap();
        let ids: Vec<&str> = master.records.iter().map(|r| r.company_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);

        let c1 = &master.records[0];
        assert_eq!(c1.name.as_deref(), Some("ACME Corp"));
        assert_eq!(c1.momentum_score, Some(0.91));
        assert_eq!(c1.primary_industry, "AI");
        assert_eq!(c1.funding_stage_label, "Series A");
        assert_eq!(c1.total_funding_display, "$2.3M");
        assert_eq!(c1.has_job_postings, Some(true));
    }

    #[test]
    fn missing_join_rows_keep_the_company_with_nulls() {
        let master = assemble(&bundle()).unwrap();
        let c3 = master.find("c3").unwrap();
        // Absent from scores and features, present in spine.
        assert_eq!(c3.momentum_score, None);
        assert_eq!(c3.momentum_tier, None);
        assert_eq!(c3.has_job_postings, None);
        assert_eq!(c3.signals, [None; 5]);
        // Derived labels are still total.
        assert_eq!(c3.primary_industry, "Other");
        assert_eq!(c3.funding_stage_label, "Unknown");
        assert_eq!(c3.total_funding_display, "$45K");
        // Name falls back to the spine.
        assert_eq!(c3.name.as_deref(), Some("Gamma Inc"));
    }

    #[test]
    fn out_of_range_stage_code_reads_unknown() {
        let master = assemble(&bundle()).unwrap();
        let c2 = master.find("c2").unwrap();
        assert_eq!(c2.funding_stage, Some(7.0));
        assert_eq!(c2.funding_stage_label, "Unknown");
    }

    #[test]
    fn industry_priority_order_wins_over_column_order() {
        // c1 has both ind_software and ind_ai set; ind_ai is declared first.
        let master = assemble(&bundle()).unwrap();
        assert_eq!(master.find("c1").unwrap().primary_industry, "AI");
        assert_eq!(master.find("c2").unwrap().primary_industry, "Software");
    }

    #[test]
    fn filter_options_are_sorted_and_deduplicated() {
        let master = assemble(&bundle()).unwrap();
        assert_eq!(master.industry_options, vec!["AI", "Other", "Software"]);
        assert_eq!(master.stage_options, vec!["Series A", "Unknown"]);
    }

    #[test]
    fn signal_medians_skip_missing_companies() {
        let master = assemble(&bundle()).unwrap();
        // job posting: median of [90, 40]; funding recency: median of [70, 30].
        assert_eq!(master.signal_medians[0], 65.0);
        assert_eq!(master.signal_medians[1], 50.0);
        // Signals nobody carries stay at zero.
        assert_eq!(master.signal_medians[2], 0.0);
    }

    #[test]
    fn equal_ranks_order_by_company_id() {
        let mut b = bundle();
        b.hiring = table(
            &["company_id", "hiring_score", "hiring_rank"],
            &[
                &[s("cz"), f(50.0), Value::Int(1)],
                &[s("ca"), f(70.0), Value::Int(1)],
                &[s("cm"), f(60.0), Value::Int(1)],
            ],
        );
        let first = assemble(&b).unwrap();
        let ids: Vec<&str> = first.records.iter().map(|r| r.company_id.as_str()).collect();
        assert_eq!(ids, vec!["ca", "cm", "cz"]);

        // Same bundle in, same order out.
        let second = assemble(&b).unwrap();
        let again: Vec<&str> = second.records.iter().map(|r| r.company_id.as_str()).collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn missing_required_column_aborts() {
        let mut b = bundle();
        b.hiring = table(&["company_id", "hiring_score"], &[&[s("c1"), f(50.0)]]);
        let err = assemble(&b).unwrap_err();
        assert!(err.to_string().contains("hiring_rank"));
    }

    #[test]
    fn hiring_rows_without_key_fields_are_skipped() {
        let mut b = bundle();
        b.hiring = table(
            &["company_id", "hiring_score", "hiring_rank"],
            &[
                &[s("c1"), f(50.0), Value::Int(1)],
                &[Value::Null, f(60.0), Value::Int(2)],
                &[s("c9"), Value::Null, Value::Int(3)],
            ],
        );
        let master = assemble(&b).unwrap();
        assert_eq!(master.len(), 1);
        assert_eq!(master.records[0].company_id, "c1");
    }

    #[test]
    fn usd_formatting_matches_display_rules() {
        assert_eq!(format_usd(None), "N/A");
        assert_eq!(format_usd(Some(f64::NAN)), "N/A");
        assert_eq!(format_usd(Some(0.0)), "$0");
        assert_eq!(format_usd(Some(750.0)), "$750");
        assert_eq!(format_usd(Some(999.6)), "$1,000");
        assert_eq!(format_usd(Some(1_500.0)), "$2K");
        assert_eq!(format_usd(Some(45_000.0)), "$45K");
        assert_eq!(format_usd(Some(999_999.5)), "$1000K");
        assert_eq!(format_usd(Some(1_000_000.0)), "$1.0M");
        assert_eq!(format_usd(Some(2_300_000.0)), "$2.3M");
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0]), Some(3.0));
        assert_eq!(median(&[1.0, 2.0, 10.0, 4.0]), Some(3.0));
    }
}
