//! Listing filter system
//!
//! Compiles the free-text filter box of a listing page into `field__operator`
//! predicates and renders them as SQL.
//!
//! ## Usage
//!
//! ```
//! use taskdesk_server::domain::filters::{FieldMap, FilterValue, SqlParams, compile};
//!
//! let fields = FieldMap::new([("Title", "title"), ("Hours Required", "hours_required")]);
//! let filters = compile(Some("Title contains report, Hours Required>=5"), &fields, "Title", &[]);
//! assert_eq!(
//!     filters.get("hours_required__gte"),
//!     Some(&FilterValue::Text("5".to_string()))
//! );
//!
//! let mut params = SqlParams::default();
//! let sql = filters.to_sql(&mut params);
//! assert_eq!(sql.as_deref(), Some("hours_required >= ? AND title LIKE ? ESCAPE '\\'"));
//! ```

mod compiler;
mod field_map;
mod operators;
mod sql;
mod types;

pub use compiler::{FilterCompiler, compile};
pub use field_map::FieldMap;
pub use operators::OperatorTable;
pub use sql::{SqlParams, parse_date_value};
pub use types::{
    ClauseDiagnostic, ClauseIssue, CompiledFilters, FilterEntry, FilterValue, Operator,
};
