//! Listing sort resolution

use std::fmt;

use serde::{Deserialize, Serialize};

use super::filters::FieldMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    /// `desc` in any case sorts descending; anything else ascending
    pub fn parse(order: Option<&str>) -> Self {
        match order {
            Some(o) if o.trim().eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.direction.as_sql())
    }
}

/// Resolve a sort label against `sort_fields`.
///
/// The label may be a display label (`"Hours Required"`) or the storage column
/// itself (`"hours_required"`). Unknown labels leave the listing unsorted.
pub fn resolve_sort(
    sort: Option<&str>,
    order: Option<&str>,
    sort_fields: &FieldMap,
) -> Option<OrderBy> {
    let sort = sort.map(str::trim).filter(|s| !s.is_empty())?;
    let column = match sort_fields.resolve(sort) {
        Some(column) => column,
        None if sort_fields.contains_field(sort) => sort,
        None => {
            tracing::debug!(sort, "Unknown sort field");
            return None;
        }
    };
    Some(OrderBy {
        column: column.to_string(),
        direction: OrderDirection::parse(order),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sort_fields() -> FieldMap {
        FieldMap::new([
            ("Title", "title"),
            ("Hours Required", "hours_required"),
            ("Date", "timestamp"),
        ])
    }

    #[test]
    fn direction_parse() {
        assert_eq!(OrderDirection::parse(Some("desc")), OrderDirection::Desc);
        assert_eq!(OrderDirection::parse(Some("DESC")), OrderDirection::Desc);
        assert_eq!(OrderDirection::parse(Some("asc")), OrderDirection::Asc);
        assert_eq!(OrderDirection::parse(Some("sideways")), OrderDirection::Asc);
        assert_eq!(OrderDirection::parse(None), OrderDirection::Asc);
    }

    #[test]
    fn resolve_by_label() {
        let order_by = resolve_sort(Some("hours required"), Some("desc"), &sort_fields()).unwrap();
        assert_eq!(order_by.column, "hours_required");
        assert_eq!(order_by.to_sql(), "hours_required DESC");
    }

    #[test]
    fn resolve_by_storage_column() {
        let order_by = resolve_sort(Some("timestamp"), None, &sort_fields()).unwrap();
        assert_eq!(order_by.to_sql(), "timestamp ASC");
    }

    #[test]
    fn unknown_or_missing_sort() {
        assert_eq!(resolve_sort(Some("Bogus"), Some("desc"), &sort_fields()), None);
        assert_eq!(resolve_sort(None, Some("desc"), &sort_fields()), None);
        assert_eq!(resolve_sort(Some("  "), None, &sort_fields()), None);
    }
}
