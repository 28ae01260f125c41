use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::cache::{SnapshotCache, DATA_TTL};
use crate::data::filter::{filtered_indices, FilterSelection};
use crate::data::loader::{load_bundle, DataBundle};
use crate::data::master::{assemble, CompanyRecord, MasterTable, TIER_ORDER};
use crate::data::remote::{DirStore, ObjectStore};

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Rankings,
    Overview,
}

/// Columns of the ranking table that can drive the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Rank,
    Company,
    HiringScore,
    HiringTier,
    Momentum,
    MomentumTier,
    Industry,
    Stage,
    Funding,
}

#[derive(Debug, Clone, Copy)]
pub struct SortState {
    pub key: SortKey,
    pub ascending: bool,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// One loaded snapshot: the raw bundle plus the assembled master table.
pub struct LoadedData {
    pub bundle: DataBundle,
    pub master: MasterTable,
    pub loaded_at: Instant,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Where datasets come from; swapped when a local snapshot is opened.
    pub store: Box<dyn ObjectStore>,
    pub cache: SnapshotCache,

    /// Present after a successful load, `None` before the first load or
    /// after a failed one.
    pub data: Option<LoadedData>,
    pub load_error: Option<String>,

    /// Sidebar filter selections.
    pub filters: FilterSelection,
    /// Indices into the master table passing the current filters (cached).
    pub visible: Vec<usize>,

    /// Company shown in the detail pane.
    pub selected_company: Option<String>,
    pub active_tab: Tab,
    /// `None` means the natural order (ascending hiring rank).
    pub sort: Option<SortState>,
}

impl AppState {
    pub fn new(store: Box<dyn ObjectStore>) -> Self {
        Self {
            store,
            cache: SnapshotCache::new(),
            data: None,
            load_error: None,
            filters: FilterSelection::default(),
            visible: Vec::new(),
            selected_company: None,
            active_tab: Tab::Rankings,
            sort: None,
        }
    }

    /// Fetch all datasets through the cache, assemble the master table and
    /// recompute the visible set. Blocking; a failure aborts the whole load
    /// and is surfaced through `load_error`.
    pub fn reload(&mut self) {
        let loaded = load_bundle(self.store.as_ref(), &mut self.cache).and_then(|bundle| {
            let master = assemble(&bundle)?;
            Ok(LoadedData {
                bundle,
                master,
                loaded_at: Instant::now(),
            })
        });
        match loaded {
            Ok(data) => {
                log::info!("assembled master table with {} companies", data.master.len());
                self.data = Some(data);
                self.load_error = None;
                self.refilter();
            }
            Err(err) => {
                log::error!("load failed: {err:#}");
                self.load_error = Some(format!("{err:#}"));
                self.data = None;
                self.visible.clear();
                self.selected_company = None;
            }
        }
    }

    /// Drop every cached dataset and load fresh.
    pub fn refresh(&mut self) {
        self.cache.clear();
        self.reload();
    }

    /// Reload once the snapshot has outlived its TTL. A failed load is not
    /// retried; recovery is the manual refresh button.
    pub fn maybe_refresh(&mut self) {
        if let Some(data) = &self.data {
            if data.loaded_at.elapsed() >= DATA_TTL {
                log::info!("snapshot older than {DATA_TTL:?}, reloading");
                self.reload();
            }
        }
    }

    /// Recompute `visible` after a filter or sort change.
    pub fn refilter(&mut self) {
        if let Some(data) = &self.data {
            self.visible = filtered_indices(&data.master, &self.filters);
        } else {
            return;
        }
        self.apply_sort();
        if let Some(data) = &self.data {
            // A selection that filtered out no longer has a detail pane.
            if let Some(selected) = &self.selected_company {
                let still_visible = self
                    .visible
                    .iter()
                    .any(|&i| data.master.records[i].company_id == *selected);
                if !still_visible {
                    self.selected_company = None;
                }
            }
        }
    }

    /// Cycle a header click: ascending, then descending, then back to the
    /// natural rank order.
    pub fn set_sort(&mut self, key: SortKey) {
        self.sort = match self.sort {
            Some(s) if s.key == key && s.ascending => Some(SortState {
                key,
                ascending: false,
            }),
            Some(s) if s.key == key => None,
            _ => Some(SortState {
                key,
                ascending: true,
            }),
        };
        self.refilter();
    }

    fn apply_sort(&mut self) {
        let (Some(data), Some(sort)) = (&self.data, self.sort) else {
            return;
        };
        let records = &data.master.records;
        self.visible.sort_by(|&a, &b| {
            let ord = compare(&records[a], &records[b], sort.key);
            if sort.ascending {
                ord
            } else {
                ord.reverse()
            }
        });
    }

    /// Point the app at a snapshot directory on disk instead of the bucket.
    pub fn open_local_snapshot(&mut self, root: PathBuf) {
        log::info!("switching to local snapshot at {}", root.display());
        self.store = Box::new(DirStore::new(root));
        self.refresh();
    }
}

fn compare(a: &CompanyRecord, b: &CompanyRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Rank => a.hiring_rank.cmp(&b.hiring_rank),
        SortKey::Company => cmp_optional_str(a.name.as_deref(), b.name.as_deref()),
        SortKey::HiringScore => a.hiring_score.total_cmp(&b.hiring_score),
        SortKey::HiringTier => {
            tier_position(a.hiring_tier.as_deref()).cmp(&tier_position(b.hiring_tier.as_deref()))
        }
        SortKey::Momentum => cmp_optional_f64(a.momentum_score, b.momentum_score),
        SortKey::MomentumTier => tier_position(a.momentum_tier.as_deref())
            .cmp(&tier_position(b.momentum_tier.as_deref())),
        SortKey::Industry => a.primary_industry.cmp(&b.primary_industry),
        SortKey::Stage => a.funding_stage_label.cmp(&b.funding_stage_label),
        SortKey::Funding => cmp_optional_f64(a.total_funding_usd, b.total_funding_usd),
    }
}

/// Tiers order semantically, best first; untiered rows sort last.
fn tier_position(tier: Option<&str>) -> usize {
    tier.and_then(|t| TIER_ORDER.iter().position(|x| *x == t))
        .unwrap_or(TIER_ORDER.len())
}

fn cmp_optional_f64(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_optional_str(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
