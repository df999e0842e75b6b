/// Data layer: core types, loading, enrichment, filtering, and caching.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → raw rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  clean cells, derive metrics → InjuryDataset
///   └──────────┘
///        │
///        ▼
///   ┌───────────────┐
///   │ InjuryDataset  │  Vec<InjuryRecord>, column indices  (cached per path)
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  season/team/player selections → visible indices
///   └──────────┘
/// ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
