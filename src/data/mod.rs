/// Data layer: core types, loading, classification and filtering.
///
/// Architecture:
/// ```text
///  .csv / .xlsx (sheet "dane")
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → Table (sorted by dzien_zapisu)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  column name → (group, year)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSpec → visible rows + selected columns
///   └──────────┘
/// ```

pub mod classify;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
