//! Filter type definitions
//!
//! Operators, values and the compiled output handed to the query layer.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Comparison applied by a compiled filter entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Contains,
}

impl Operator {
    /// Key used in the `field__operator` mapping
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Lte => "lte",
            Self::Eq => "eq",
            Self::Contains => "contains",
        }
    }

    /// SQL comparison symbol, `None` for containment
    pub fn sql_symbol(&self) -> Option<&'static str> {
        match self {
            Self::Gt => Some(">"),
            Self::Lt => Some("<"),
            Self::Gte => Some(">="),
            Self::Lte => Some("<="),
            Self::Eq => Some("="),
            Self::Contains => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value compared against a field.
///
/// `yes`/`no` typed in a comparison clause become `Flag(1)`/`Flag(0)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(u8),
    Text(String),
}

impl FilterValue {
    /// Normalize a comparison value
    pub fn from_comparison(value: &str) -> Self {
        if value.eq_ignore_ascii_case("yes") {
            Self::Flag(1)
        } else if value.eq_ignore_ascii_case("no") {
            Self::Flag(0)
        } else {
            Self::Text(value.to_string())
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Flag(_) => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One compiled predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterEntry {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl FilterEntry {
    /// Mapping key, e.g. `hours_required__gte`
    pub fn key(&self) -> String {
        filter_key(&self.field, self.operator)
    }
}

fn filter_key(field: &str, operator: Operator) -> String {
    format!("{}__{}", field, operator.as_str())
}

/// Why a clause was left out of the compiled result
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClauseIssue {
    #[error("unknown field '{label}'")]
    UnresolvedField { label: String },

    #[error("unsupported operator '{symbol}'")]
    UnresolvedOperator { symbol: String },

    #[error("free-text fallback field '{label}' is not filterable")]
    UnresolvedFallback { label: String },

    #[error("expected '<field> contains <value>', found {parts} parts")]
    MalformedContains { parts: usize },

    #[error("more than {limit} filter terms")]
    ClauseLimitExceeded { limit: usize },
}

/// An ignored clause together with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClauseDiagnostic {
    pub clause: String,
    pub issue: ClauseIssue,
}

impl fmt::Display for ClauseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.clause, self.issue)
    }
}

/// Result of compiling one filter string.
///
/// Entries are keyed by `field__operator`; a later clause for the same key
/// replaces the earlier one. Ignored clauses are kept as diagnostics so a caller
/// can report them without failing the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilters {
    entries: BTreeMap<String, FilterEntry>,
    date_fields: BTreeSet<String>,
    diagnostics: Vec<ClauseDiagnostic>,
}

impl CompiledFilters {
    pub(crate) fn with_date_fields(date_fields: BTreeSet<String>) -> Self {
        Self {
            date_fields,
            ..Self::default()
        }
    }

    pub(crate) fn insert(&mut self, entry: FilterEntry) {
        self.entries.insert(entry.key(), entry);
    }

    pub(crate) fn ignore(&mut self, clause: &str, issue: ClauseIssue) {
        self.diagnostics.push(ClauseDiagnostic {
            clause: clause.to_string(),
            issue,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Entries in key order
    pub fn entries(&self) -> impl Iterator<Item = &FilterEntry> {
        self.entries.values()
    }

    /// Plain `field__operator -> value` mapping for the query layer
    pub fn to_mapping(&self) -> BTreeMap<String, FilterValue> {
        self.entries
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }

    pub fn diagnostics(&self) -> &[ClauseDiagnostic] {
        &self.diagnostics
    }

    pub fn ignored_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether `field` (a storage field) holds dates
    pub fn is_date_field(&self, field: &str) -> bool {
        self.date_fields.contains(field)
    }
}
