//! Domain logic for listing pages
//!
//! - `entities` - per-listing field, fallback and sort tables
//! - `filters` - free-text filter compiler and SQL rendering
//! - `sorting` - sort label resolution

pub mod entities;
pub mod filters;
pub mod sorting;

pub use entities::{EntityError, EntityProfile, EntityRegistry, ListingQuery, SqlFragment};
pub use filters::{CompiledFilters, FieldMap, FilterCompiler};
pub use sorting::{OrderBy, OrderDirection};
