/// Data layer: remote storage, dataset decoding, assembly, and filtering.
///
/// Architecture:
/// ```text
///   S3 bucket / local snapshot
///          │
///          ▼
///    ┌──────────┐
///    │  remote   │  resolve key → fetch bytes (SigV4-signed for S3)
///    └──────────┘
///          │
///          ▼
///    ┌──────────┐
///    │  decode   │  CSV / Parquet bytes → Table
///    └──────────┘
///          │  (cached per key for one hour)
///          ▼
///    ┌──────────┐
///    │  loader   │  five named datasets → DataBundle
///    └──────────┘
///          │
///          ▼
///    ┌──────────┐
///    │  master   │  left joins + derived columns → MasterTable
///    └──────────┘
///          │
///          ▼
///    ┌──────────┐
///    │  filter   │  conjunctive predicates → visible indices
///    └──────────┘
/// ```
/// `stats` aggregates the master table for KPI cards and charts; `sign`
/// and `cache` support `remote` and `loader`.

pub mod cache;
pub mod decode;
pub mod filter;
pub mod loader;
pub mod master;
pub mod model;
pub mod remote;
pub mod sign;
pub mod stats;
