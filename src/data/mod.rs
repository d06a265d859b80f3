/// Data layer: coordinate types, source resolution, loading and the midpoint.
///
/// Architecture:
/// ```text
///  data.csv (local)  ──or──  <fallback-url>/data.csv
///        │
///        ▼
///   ┌──────────┐
///   │  source   │  resolve + fetch bytes (one attempt)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse → CoordinateDataset, cached once per process
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ midpoint  │  column means, memoised by dataset identity
///   └──────────┘
/// ```

pub mod error;
pub mod loader;
pub mod midpoint;
pub mod model;
pub mod source;
