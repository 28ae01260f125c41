use std::collections::BTreeSet;

use super::master::MasterTable;

// ---------------------------------------------------------------------------
// Filter selection: the state behind the sidebar controls
// ---------------------------------------------------------------------------

/// What the user has narrowed the table to. Every criterion is optional:
/// a zero threshold, an empty set or a blank search string means "no
/// constraint from this control".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    /// Keep companies with `hiring_score >= min_score`; inactive at 0.
    pub min_score: f64,
    /// Momentum tier membership.
    pub tiers: BTreeSet<String>,
    /// Primary industry membership.
    pub industries: BTreeSet<String>,
    /// Funding stage label membership.
    pub stages: BTreeSet<String>,
    /// Case-insensitive substring of the company name.
    pub search: String,
}

impl FilterSelection {
    pub fn is_neutral(&self) -> bool {
        self.min_score <= 0.0
            && self.tiers.is_empty()
            && self.industries.is_empty()
            && self.stages.is_empty()
            && self.search.is_empty()
    }
}

/// Indices into `master.records` that pass every active criterion, in the
/// master table's order.
pub fn filtered_indices(master: &MasterTable, selection: &FilterSelection) -> Vec<usize> {
    let search = selection.search.to_lowercase();
    master
        .records
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            if selection.min_score > 0.0 && record.hiring_score < selection.min_score {
                return false;
            }
            if !selection.tiers.is_empty() {
                match &record.momentum_tier {
                    Some(tier) if selection.tiers.contains(tier) => {}
                    _ => return false,
                }
            }
            if !selection.industries.is_empty()
                && !selection.industries.contains(&record.primary_industry)
            {
                return false;
            }
            if !selection.stages.is_empty()
                && !selection.stages.contains(&record.funding_stage_label)
            {
                return false;
            }
            if !search.is_empty() {
                // A company without a name never matches a live search.
                match &record.name {
                    Some(name) if name.to_lowercase().contains(&search) => {}
                    _ => return false,
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}
