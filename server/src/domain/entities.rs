//! Listable entity profiles
//!
//! Each listing page (projects, tasks, users, work logs) filters and sorts
//! against its own label tables. Profiles are built once from the builtin
//! definitions plus config overrides and shared read-only afterwards.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use super::filters::{ClauseDiagnostic, CompiledFilters, FieldMap, FilterCompiler, SqlParams};
use super::sorting::{OrderBy, OrderDirection, resolve_sort};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("unknown entity '{0}' (known: {1})")]
    Unknown(String, String),
}

/// Filtering and sorting configuration for one listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProfile {
    pub name: String,
    pub fields: FieldMap,
    pub fallback_label: String,
    pub date_labels: Vec<String>,
    pub sort_fields: FieldMap,
    pub default_sort: Option<String>,
    pub default_order: OrderDirection,
    /// Labels offered in the filter box hint
    pub filterable: Vec<String>,
}

impl EntityProfile {
    pub fn compile(&self, raw: Option<&str>, compiler: &FilterCompiler) -> CompiledFilters {
        let date_labels: Vec<&str> = self.date_labels.iter().map(String::as_str).collect();
        compiler.compile(raw, &self.fields, &self.fallback_label, &date_labels)
    }

    /// Resolve the requested sort, falling back to the profile defaults
    pub fn resolve_sort(&self, sort: Option<&str>, order: Option<&str>) -> Option<OrderBy> {
        let sort = sort.or(self.default_sort.as_deref());
        let default_order = self.default_order.to_string();
        let order = order.or(Some(default_order.as_str()));
        resolve_sort(sort, order, &self.sort_fields)
    }

    pub fn listing_query(
        &self,
        raw: Option<&str>,
        sort: Option<&str>,
        order: Option<&str>,
        compiler: &FilterCompiler,
    ) -> ListingQuery {
        ListingQuery {
            filters: self.compile(raw, compiler),
            order_by: self.resolve_sort(sort, order),
        }
    }

    pub fn describe(&self) -> EntityDescription {
        EntityDescription {
            name: self.name.clone(),
            fields: self
                .fields
                .iter()
                .map(|(l, f)| (l.to_string(), f.to_string()))
                .collect(),
            fallback: self.fallback_label.clone(),
            fallback_resolves: self.fields.resolve(&self.fallback_label).is_some(),
            date_fields: self.date_labels.clone(),
            sort_fields: self.sort_fields.labels().map(str::to_string).collect(),
            default_sort: self.default_sort.clone(),
            default_order: self.default_order,
            filterable: self.filterable.clone(),
        }
    }
}

/// Serializable view of a profile
#[derive(Debug, Serialize)]
pub struct EntityDescription {
    pub name: String,
    pub fields: Vec<(String, String)>,
    pub fallback: String,
    pub fallback_resolves: bool,
    pub date_fields: Vec<String>,
    pub sort_fields: Vec<String>,
    pub default_sort: Option<String>,
    pub default_order: OrderDirection,
    pub filterable: Vec<String>,
}

/// Compiled filters plus ordering for one listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub filters: CompiledFilters,
    pub order_by: Option<OrderBy>,
}

/// SQL pieces ready to append to a `SELECT`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlFragment {
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
    pub order_by: Option<String>,
    pub params: Vec<String>,
    pub ignored: Vec<ClauseDiagnostic>,
}

impl ListingQuery {
    pub fn to_sql(&self) -> SqlFragment {
        let mut params = SqlParams::default();
        let where_clause = self.filters.to_sql(&mut params);
        SqlFragment {
            where_clause,
            order_by: self.order_by.as_ref().map(OrderBy::to_sql),
            params: params.values,
            ignored: self.filters.diagnostics().to_vec(),
        }
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Project listing
pub fn project_profile() -> EntityProfile {
    let fields = FieldMap::new([
        ("Name", "name"),
        ("Email", "email"),
        ("Send Email", "send_email"),
        ("Archived", "archived"),
    ]);
    EntityProfile {
        name: "project".to_string(),
        sort_fields: fields.clone(),
        filterable: fields.labels().map(str::to_string).collect(),
        fields,
        fallback_label: "Name".to_string(),
        date_labels: Vec::new(),
        default_sort: None,
        default_order: OrderDirection::Asc,
    }
}

/// Task listing
pub fn task_profile() -> EntityProfile {
    EntityProfile {
        name: "task".to_string(),
        fields: FieldMap::new([
            ("Title", "title"),
            ("Project", "project_name"),
            ("Hours Required", "hours_required"),
            ("Hours Worked", "hours_worked"),
            ("Status", "status"),
            ("Date", "timestamp"),
            ("Last Updated", "last_updated"),
            ("User", "user_name"),
        ]),
        fallback_label: "Title".to_string(),
        date_labels: labels(&["Date", "Last Updated"]),
        sort_fields: FieldMap::new([
            ("Title", "title"),
            ("Hours Required", "hours_required"),
            ("Hours Worked", "hours_worked"),
            ("Status", "status"),
            ("Date", "timestamp"),
            ("Last Updated", "last_updated"),
        ]),
        default_sort: Some("Date".to_string()),
        default_order: OrderDirection::Desc,
        filterable: labels(&[
            "Title",
            "Project",
            "Hours Required",
            "Hours Worked",
            "Status",
            "User",
        ]),
    }
}

/// User listing
pub fn user_profile() -> EntityProfile {
    let fields = FieldMap::new([("Name", "full_name"), ("Email", "email")]);
    EntityProfile {
        name: "user".to_string(),
        sort_fields: fields.clone(),
        filterable: fields.labels().map(str::to_string).collect(),
        fields,
        fallback_label: "Name".to_string(),
        date_labels: Vec::new(),
        default_sort: None,
        default_order: OrderDirection::Asc,
    }
}

/// Work log listing
pub fn log_profile() -> EntityProfile {
    EntityProfile {
        name: "log".to_string(),
        fields: FieldMap::new([
            ("Task Name", "task_name"),
            ("User", "user_name"),
            ("Hours Worked", "hours_spent_today"),
            ("Hours", "hours_spent_today"),
            ("Task Status", "task_status"),
            ("Date", "timestamp"),
        ]),
        fallback_label: "Task Name".to_string(),
        date_labels: labels(&["Date"]),
        sort_fields: FieldMap::new([
            ("ID", "id"),
            ("Task Name", "task_name"),
            ("Hours", "hours_spent_today"),
            ("Task Status", "task_status"),
            ("Date", "timestamp"),
        ]),
        default_sort: None,
        default_order: OrderDirection::Asc,
        filterable: labels(&["Task Name", "User", "Hours Worked", "Task Status", "Date"]),
    }
}

/// Profiles by lowercase name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRegistry {
    profiles: BTreeMap<String, EntityProfile>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        let mut registry = Self {
            profiles: BTreeMap::new(),
        };
        for profile in [project_profile(), task_profile(), user_profile(), log_profile()] {
            registry.insert(profile);
        }
        registry
    }
}

impl EntityRegistry {
    pub fn insert(&mut self, profile: EntityProfile) {
        self.profiles
            .insert(profile.name.trim().to_lowercase(), profile);
    }

    pub fn get(&self, name: &str) -> Result<&EntityProfile, EntityError> {
        self.profiles
            .get(&name.trim().to_lowercase())
            .ok_or_else(|| EntityError::Unknown(name.to_string(), self.names().join(", ")))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut EntityProfile> {
        self.profiles.get_mut(&name.trim().to_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityProfile> {
        self.profiles.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::FilterValue;

    fn text(s: &str) -> FilterValue {
        FilterValue::Text(s.to_string())
    }

    #[test]
    fn builtin_registry_has_all_listings() {
        let registry = EntityRegistry::default();
        assert_eq!(registry.names(), vec!["log", "project", "task", "user"]);
        assert!(registry.get("TASK").is_ok());
    }

    #[test]
    fn unknown_entity_error_lists_known_names() {
        let registry = EntityRegistry::default();
        let err = registry.get("invoice").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown entity 'invoice' (known: log, project, task, user)"
        );
    }

    #[test]
    fn every_builtin_fallback_resolves() {
        for profile in EntityRegistry::default().iter() {
            assert!(
                profile.fields.resolve(&profile.fallback_label).is_some(),
                "{} fallback {}",
                profile.name,
                profile.fallback_label
            );
        }
    }

    #[test]
    fn task_mixed_filter() {
        let task = task_profile();
        let out = task.compile(
            Some("Title contains foo, Hours Required>=5, junk text here"),
            &FilterCompiler::default(),
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out.get("title__contains"), Some(&text("junk text here")));
        assert_eq!(out.get("hours_required__gte"), Some(&text("5")));
        assert!(out.is_date_field("timestamp"));
        assert!(out.is_date_field("last_updated"));
    }

    #[test]
    fn user_free_text_searches_name() {
        let out = user_profile().compile(Some("alice"), &FilterCompiler::default());
        assert_eq!(out.get("full_name__contains"), Some(&text("alice")));
    }

    #[test]
    fn project_flag_filter() {
        let out = project_profile().compile(Some("send email=yes"), &FilterCompiler::default());
        assert_eq!(out.get("send_email__eq"), Some(&FilterValue::Flag(1)));
    }

    #[test]
    fn task_default_sort_is_newest_first() {
        let order_by = task_profile().resolve_sort(None, None).unwrap();
        assert_eq!(order_by.to_sql(), "timestamp DESC");

        let order_by = task_profile().resolve_sort(Some("Title"), Some("asc")).unwrap();
        assert_eq!(order_by.to_sql(), "title ASC");
    }

    #[test]
    fn project_has_no_default_sort() {
        assert_eq!(project_profile().resolve_sort(None, None), None);
    }

    #[test]
    fn log_sort_labels() {
        let order_by = log_profile().resolve_sort(Some("hours"), Some("desc")).unwrap();
        assert_eq!(order_by.to_sql(), "hours_spent_today DESC");
    }

    #[test]
    fn log_hours_label_filters_and_sorts() {
        let log = log_profile();
        let out = log.compile(Some("Hours>3, hours worked<8"), &FilterCompiler::default());
        assert_eq!(out.get("hours_spent_today__gt"), Some(&text("3")));
        assert_eq!(out.get("hours_spent_today__lt"), Some(&text("8")));
        assert_eq!(out.ignored_count(), 0);
        assert_eq!(
            log.resolve_sort(Some("Hours"), None).map(|o| o.column),
            Some("hours_spent_today".to_string())
        );
    }

    #[test]
    fn listing_query_date_equality_spans_day() {
        let query = task_profile().listing_query(
            Some("Date=2024-01-01"),
            None,
            None,
            &FilterCompiler::default(),
        );
        let sql = query.to_sql();
        assert_eq!(
            sql.where_clause.as_deref(),
            Some("timestamp >= ? AND timestamp < ?")
        );
        assert_eq!(sql.params, vec!["1704067200", "1704153600"]);
    }

    #[test]
    fn listing_query_sql() {
        let query = task_profile().listing_query(
            Some("Status=open, Date>=2024-01-01, Bogus=1"),
            None,
            None,
            &FilterCompiler::default(),
        );
        let sql = query.to_sql();
        assert_eq!(
            sql.where_clause.as_deref(),
            Some("status = ? AND timestamp >= ?")
        );
        assert_eq!(sql.params, vec!["open", "1704067200"]);
        assert_eq!(sql.order_by.as_deref(), Some("timestamp DESC"));
        assert_eq!(sql.ignored.len(), 1);
    }

    #[test]
    fn describe_reports_fallback_resolution() {
        let mut profile = project_profile();
        profile.fallback_label = "Task Name".to_string();
        let description = profile.describe();
        assert!(!description.fallback_resolves);
        assert_eq!(description.fields.len(), 4);
    }
}
