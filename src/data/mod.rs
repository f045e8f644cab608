/// Data layer: typed records, loading, joining, querying and export.
///
/// Architecture:
/// ```text
///  index table            industry table
///  (.xlsx/.csv/...)       (.xlsx/.csv/...)
///        │                      │
///        ▼                      ▼
///   ┌──────────┐          ┌──────────┐
///   │  loader  │ schema → │  loader  │  normalize headers + codes
///   └──────────┘          └──────────┘
///        │                      │
///        └──────────┬───────────┘
///                   ▼
///             ┌──────────┐
///             │   join   │  left join on (code, year)
///             └──────────┘
///                   │
///                   ▼
///   ┌──────────────────────────┐
///   │ Dataset (Arc, via cache) │  immutable unified table
///   └──────────────────────────┘
///                   │
///                   ▼
///      ┌──────────┐   ┌─────────┐   ┌──────────┐
///      │  query   │ → │  stats  │   │  export  │
///      └──────────┘   └─────────┘   └──────────┘
/// ```

pub mod cache;
pub mod export;
pub mod join;
pub mod loader;
pub mod model;
pub mod query;
pub mod schema;
pub mod stats;
