//! Filter expression compiler
//!
//! Turns a free-text `combined_filters` string such as
//! `Title contains foo, Hours Required>=5, Archived=no` into `field__operator`
//! predicates. Clauses that cannot be understood are dropped and reported as
//! diagnostics; compilation itself never fails.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::utils::string::{split_clauses, title_case};

use super::field_map::FieldMap;
use super::operators::{COMPARISON_SYMBOLS, OperatorTable};
use super::types::{ClauseIssue, CompiledFilters, FilterEntry, FilterValue, Operator};

fn contains_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+contains\s+").expect("Invalid regex"))
}

fn comparison_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let symbols: Vec<String> = COMPARISON_SYMBOLS.iter().map(|s| regex::escape(s)).collect();
        let pattern = format!(
            r"^(?P<field>.*?)\s*(?P<op>{})\s*(?P<value>.*)$",
            symbols.join("|")
        );
        Regex::new(&pattern).expect("Invalid regex")
    })
}

/// Compiler settings shared by every listing
///
/// The default compiler processes every clause; a clause limit is opt-in.
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    operators: OperatorTable,
    max_clauses: Option<usize>,
}

impl FilterCompiler {
    pub fn new(operators: OperatorTable, max_clauses: Option<usize>) -> Self {
        Self {
            operators,
            max_clauses,
        }
    }

    pub fn with_max_clauses(mut self, max_clauses: usize) -> Self {
        self.max_clauses = Some(max_clauses);
        self
    }

    pub fn max_clauses(&self) -> Option<usize> {
        self.max_clauses
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    /// Compile `raw` against one entity's field map.
    ///
    /// `fallback_label` receives free-text clauses that match neither grammar.
    /// `date_labels` name the fields whose values are dates; they are resolved
    /// here and carried on the result for the query layer.
    pub fn compile(
        &self,
        raw: Option<&str>,
        fields: &FieldMap,
        fallback_label: &str,
        date_labels: &[&str],
    ) -> CompiledFilters {
        let date_fields: BTreeSet<String> = date_labels
            .iter()
            .filter_map(|label| fields.resolve(label))
            .map(str::to_string)
            .collect();
        let mut out = CompiledFilters::with_date_fields(date_fields);

        let Some(raw) = raw else {
            return out;
        };

        for (i, clause) in split_clauses(raw).into_iter().enumerate() {
            if let Some(limit) = self.max_clauses
                && i >= limit
            {
                tracing::debug!(clause, limit, "Filter clause over limit");
                out.ignore(clause, ClauseIssue::ClauseLimitExceeded { limit });
                continue;
            }
            self.compile_clause(clause, fields, fallback_label, &mut out);
        }

        tracing::trace!(
            entries = out.len(),
            ignored = out.ignored_count(),
            "Compiled filters"
        );
        out
    }

    fn compile_clause(
        &self,
        clause: &str,
        fields: &FieldMap,
        fallback_label: &str,
        out: &mut CompiledFilters,
    ) {
        if contains_regex().is_match(clause) {
            // A contains clause never falls through to the other grammars.
            let parts: Vec<&str> = contains_regex().split(clause).collect();
            let [field_part, value_part] = parts.as_slice() else {
                tracing::debug!(clause, parts = parts.len(), "Malformed contains clause");
                out.ignore(clause, ClauseIssue::MalformedContains { parts: parts.len() });
                return;
            };
            let label = title_case(field_part.trim());
            match fields.resolve(&label) {
                Some(field) => out.insert(FilterEntry {
                    field: field.to_string(),
                    operator: Operator::Contains,
                    value: FilterValue::Text(value_part.trim().to_string()),
                }),
                None => {
                    tracing::debug!(clause, label = %label, "Unknown filter field");
                    out.ignore(clause, ClauseIssue::UnresolvedField { label });
                }
            }
            return;
        }

        if let Some(caps) = comparison_regex().captures(clause) {
            let label = title_case(caps["field"].trim());
            let symbol = caps["op"].trim();
            let value = FilterValue::from_comparison(caps["value"].trim());

            let Some(field) = fields.resolve(&label) else {
                tracing::debug!(clause, label = %label, "Unknown filter field");
                out.ignore(clause, ClauseIssue::UnresolvedField { label });
                return;
            };
            let Some(operator) = self.operators.lookup(symbol) else {
                tracing::debug!(clause, symbol, "Unsupported filter operator");
                out.ignore(
                    clause,
                    ClauseIssue::UnresolvedOperator {
                        symbol: symbol.to_string(),
                    },
                );
                return;
            };
            out.insert(FilterEntry {
                field: field.to_string(),
                operator,
                value,
            });
            return;
        }

        match fields.resolve(fallback_label) {
            Some(field) => out.insert(FilterEntry {
                field: field.to_string(),
                operator: Operator::Contains,
                value: FilterValue::Text(clause.to_string()),
            }),
            None => {
                tracing::warn!(clause, fallback = fallback_label, "Could not find field for search term");
                out.ignore(
                    clause,
                    ClauseIssue::UnresolvedFallback {
                        label: fallback_label.to_string(),
                    },
                );
            }
        }
    }
}

/// Compile with the default operator table and no clause limit
pub fn compile(
    raw: Option<&str>,
    fields: &FieldMap,
    fallback_label: &str,
    date_labels: &[&str],
) -> CompiledFilters {
    FilterCompiler::default().compile(raw, fields, fallback_label, date_labels)
}

#[cfg(test)]
#[path = "compiler_tests.rs"]
mod tests;
