//! Operator symbol table

use super::types::Operator;

/// Symbols recognized by the comparison grammar, longest first
pub(crate) const COMPARISON_SYMBOLS: [&str; 5] = [">=", "<=", ">", "<", "="];

/// Maps textual comparison symbols to operators.
///
/// The comparison grammar always recognizes `>= <= > < =`; a symbol absent from
/// the table makes the clause unresolvable instead of changing how it parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorTable {
    symbols: Vec<(String, Operator)>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self {
            symbols: vec![
                (">=".to_string(), Operator::Gte),
                ("<=".to_string(), Operator::Lte),
                (">".to_string(), Operator::Gt),
                ("<".to_string(), Operator::Lt),
                ("=".to_string(), Operator::Eq),
            ],
        }
    }
}

impl OperatorTable {
    pub fn lookup(&self, symbol: &str) -> Option<Operator> {
        self.symbols
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, op)| *op)
    }

    /// Copy of this table with `symbol` removed
    pub fn without(&self, symbol: &str) -> Self {
        Self {
            symbols: self
                .symbols
                .iter()
                .filter(|(s, _)| s != symbol)
                .cloned()
                .collect(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|(s, _)| s.as_str())
    }
}
