//! Label to storage field lookup

use rustc_hash::FxHashMap;

use crate::utils::string::title_case;

/// Ordered table mapping user-facing labels (`"Hours Required"`) to storage
/// fields (`"hours_required"`).
///
/// Labels are title-cased on insert and on lookup, so `"hours required"`,
/// `"HOURS REQUIRED"` and `"Hours Required"` resolve to the same field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    entries: Vec<(String, String)>,
    index: FxHashMap<String, usize>,
}

impl FieldMap {
    pub fn new<I, L, F>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (L, F)>,
        L: AsRef<str>,
        F: Into<String>,
    {
        let mut map = Self::default();
        for (label, field) in pairs {
            map.insert(label.as_ref(), field.into());
        }
        map
    }

    /// Insert or replace a label; a replaced label keeps its position
    pub fn insert(&mut self, label: &str, field: String) {
        let label = title_case(label.trim());
        match self.index.get(&label) {
            Some(&pos) => self.entries[pos].1 = field,
            None => {
                self.index.insert(label.clone(), self.entries.len());
                self.entries.push((label, field));
            }
        }
    }

    /// Storage field for `label`, if any
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.index
            .get(&title_case(label.trim()))
            .map(|&pos| self.entries[pos].1.as_str())
    }

    /// Whether `field` is one of the storage fields in this map
    pub fn contains_field(&self, field: &str) -> bool {
        self.entries.iter().any(|(_, f)| f == field)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, f)| f.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, f)| (l.as_str(), f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
