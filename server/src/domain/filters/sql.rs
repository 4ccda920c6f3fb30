//! SQL rendering of compiled filters
//!
//! Produces a `WHERE` fragment with `?` placeholders. Date fields are compared
//! as Unix seconds; values that cannot be read as dates are skipped. A bare
//! `YYYY-MM-DD` covers the whole UTC day, so `Date=2024-01-01` matches any
//! time on that day.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::utils::sql::contains_pattern;

use super::types::{CompiledFilters, FilterEntry, Operator};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const SECONDS_PER_DAY: i64 = 86_400;

/// Collects SQL parameters during query building (maintains insertion order)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SqlParams {
    pub values: Vec<String>,
}

/// Parse a user-typed date into Unix seconds (UTC).
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS` and
/// `YYYY-MM-DD` (midnight).
pub fn parse_date_value(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    parse_day_start(value)
}

/// Midnight UTC of a bare `YYYY-MM-DD` value
fn parse_day_start(value: &str) -> Option<i64> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

/// Predicate comparing `col` against the day `[start, start + 1 day)`
fn day_to_sql(
    col: &str,
    operator: Operator,
    start: i64,
    params: &mut SqlParams,
) -> Option<String> {
    let end = start + SECONDS_PER_DAY;
    let (sql, bounds) = match operator {
        Operator::Eq => (format!("{col} >= ? AND {col} < ?"), vec![start, end]),
        Operator::Gte => (format!("{col} >= ?"), vec![start]),
        Operator::Gt => (format!("{col} >= ?"), vec![end]),
        Operator::Lt => (format!("{col} < ?"), vec![start]),
        Operator::Lte => (format!("{col} < ?"), vec![end]),
        Operator::Contains => return None,
    };
    params.values.extend(bounds.iter().map(i64::to_string));
    Some(sql)
}

impl CompiledFilters {
    /// Render all entries as one `AND`-joined predicate.
    ///
    /// Returns `None` when no entry produced a predicate.
    pub fn to_sql(&self, params: &mut SqlParams) -> Option<String> {
        let clauses: Vec<String> = self
            .entries()
            .filter_map(|entry| self.entry_to_sql(entry, params))
            .collect();
        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" AND "))
        }
    }

    fn entry_to_sql(&self, entry: &FilterEntry, params: &mut SqlParams) -> Option<String> {
        let col = entry.field.as_str();
        let is_date = self.is_date_field(col);

        match (entry.operator.sql_symbol(), is_date) {
            (None, true) => {
                tracing::warn!(field = col, "Substring search is not supported on date fields");
                None
            }
            (None, false) => {
                params.values.push(contains_pattern(&entry.value.to_string()));
                Some(format!("{} LIKE ? ESCAPE '\\'", col))
            }
            (Some(symbol), true) => {
                if let Some(start) = entry.value.as_text().and_then(parse_day_start) {
                    return day_to_sql(col, entry.operator, start, params);
                }
                let Some(ts) = entry.value.as_text().and_then(parse_date_value) else {
                    tracing::warn!(field = col, value = %entry.value, "Ignoring unparseable date filter");
                    return None;
                };
                params.values.push(ts.to_string());
                Some(format!("{} {} ?", col, symbol))
            }
            (Some(symbol), false) => {
                params.values.push(entry.value.to_string());
                Some(format!("{} {} ?", col, symbol))
            }
        }
    }
}
