//! Table analysis: descriptive statistics and duplicate-row reports.
//!
//! All three operations are pure functions of a [`Table`]; nothing is cached
//! and calling them twice on the same table gives the same report.
//!
//! ```
//! use serde_json::json;
//! use tablelens::analyser::{self, Table};
//!
//! let records: Vec<_> = [
//!     json!({ "id": 1, "v": "a" }),
//!     json!({ "id": 2, "v": "b" }),
//!     json!({ "id": 1, "v": "a" }),
//! ]
//! .into_iter()
//! .filter_map(|v| v.as_object().cloned())
//! .collect();
//!
//! let table = Table::from_records(&records)?;
//! let report = analyser::find_duplicates(&table)?;
//! assert_eq!(report.row_count(), 2);
//! assert_eq!(report.redundant_count, 1);
//! # Ok::<(), tablelens::error::LensError>(())
//! ```

pub mod describe;
pub mod duplicates;
pub mod table;
pub mod types;

pub use describe::describe;
pub use duplicates::{find_duplicates, find_duplicates_by_subset};
pub use table::{ColumnKind, Record, Table};
pub use types::{
    CategoricalSummary, DuplicateReport, NumericSummary, StatisticsReport, SubReport,
};
