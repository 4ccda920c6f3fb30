use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::entities::{EntityProfile, EntityRegistry};
use crate::domain::filters::{FieldMap, FilterCompiler, OperatorTable};
use crate::domain::sorting::OrderDirection;
use crate::utils::string::is_sql_identifier;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Filter compiler configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FiltersFileConfig {
    pub max_clauses: Option<usize>,
}

/// Per-listing overrides (from JSON config file)
///
/// `fields` and `sort_fields` are label -> column objects; their entries are
/// merged into the builtin tables. The other keys replace the builtin value.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EntityFileConfig {
    pub fields: Option<BTreeMap<String, String>>,
    pub fallback: Option<String>,
    pub date_fields: Option<Vec<String>>,
    pub sort_fields: Option<BTreeMap<String, String>>,
    pub default_sort: Option<String>,
    pub default_order: Option<OrderDirection>,
    pub filterable: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl EntityFileConfig {
    fn merge(&mut self, other: EntityFileConfig) {
        if let Some(fields) = other.fields {
            self.fields.get_or_insert_with(BTreeMap::new).extend(fields);
        }
        if let Some(sort_fields) = other.sort_fields {
            self.sort_fields
                .get_or_insert_with(BTreeMap::new)
                .extend(sort_fields);
        }
        if other.fallback.is_some() {
            self.fallback = other.fallback;
        }
        if other.date_fields.is_some() {
            self.date_fields = other.date_fields;
        }
        if other.default_sort.is_some() {
            self.default_sort = other.default_sort;
        }
        if other.default_order.is_some() {
            self.default_order = other.default_order;
        }
        if other.filterable.is_some() {
            self.filterable = other.filterable;
        }
    }

    /// Apply on top of an existing profile
    fn apply(self, profile: &mut EntityProfile) {
        if let Some(fields) = self.fields {
            for (label, field) in fields {
                profile.fields.insert(&label, field);
            }
        }
        if let Some(sort_fields) = self.sort_fields {
            for (label, field) in sort_fields {
                profile.sort_fields.insert(&label, field);
            }
        }
        if let Some(fallback) = self.fallback {
            profile.fallback_label = fallback;
        }
        if let Some(date_fields) = self.date_fields {
            profile.date_labels = date_fields;
        }
        if let Some(default_sort) = self.default_sort {
            profile.default_sort = Some(default_sort);
        }
        if let Some(default_order) = self.default_order {
            profile.default_order = default_order;
        }
        if let Some(filterable) = self.filterable {
            profile.filterable = filterable;
        }
    }

    /// Build a profile for a listing that has no builtin definition
    fn into_profile(self, name: &str) -> Result<EntityProfile> {
        let Some(fields) = self.fields.filter(|f| !f.is_empty()) else {
            anyhow::bail!("Configuration error: entities.{}.fields is required", name);
        };
        let Some(fallback) = self.fallback else {
            anyhow::bail!("Configuration error: entities.{}.fallback is required", name);
        };
        let fields = FieldMap::new(fields);
        let sort_fields = match self.sort_fields {
            Some(sort_fields) => FieldMap::new(sort_fields),
            None => fields.clone(),
        };
        let filterable = self
            .filterable
            .unwrap_or_else(|| fields.labels().map(str::to_string).collect());
        Ok(EntityProfile {
            name: name.to_string(),
            fields,
            fallback_label: fallback,
            date_labels: self.date_fields.unwrap_or_default(),
            sort_fields,
            default_sort: self.default_sort,
            default_order: self.default_order.unwrap_or_default(),
            filterable,
        })
    }
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub filters: Option<FiltersFileConfig>,
    pub entities: Option<BTreeMap<String, EntityFileConfig>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Unknown keys, top-level and inside `entities.<name>`, as dotted paths
    fn unknown_fields(&self) -> Vec<String> {
        let mut keys: Vec<String> = extra_keys(&self.extra).map(str::to_string).collect();
        for (name, entity) in self.entities.iter().flatten() {
            keys.extend(extra_keys(&entity.extra).map(|k| format!("entities.{}.{}", name, k)));
        }
        keys
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        let keys = self.unknown_fields();
        if !keys.is_empty() {
            tracing::warn!(
                fields = %keys.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(filters) = other.filters {
            let current = self.filters.get_or_insert_with(FiltersFileConfig::default);
            if filters.max_clauses.is_some() {
                tracing::trace!(max_clauses = ?filters.max_clauses, "Merging filters.max_clauses");
                current.max_clauses = filters.max_clauses;
            }
        }

        if let Some(entities) = other.entities {
            let current = self.entities.get_or_insert_with(BTreeMap::new);
            for (name, entity) in entities {
                tracing::trace!(entity = %name, "Merging entities section");
                current
                    .entry(name.trim().to_lowercase())
                    .or_default()
                    .merge(entity);
            }
        }
    }
}

// =============================================================================
// Final Config
// =============================================================================

/// Filter compiler settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Clauses past this count are reported and skipped; `None` compiles all
    pub max_clauses: Option<usize>,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub filters: FilterConfig,
    pub entities: EntityRegistry,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.taskdesk/taskdesk.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_home(path);
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_sources(file_config, cli)
    }

    /// Layer defaults, merged file config and CLI/env overrides
    pub fn from_sources(file_config: FileConfig, cli: &CliConfig) -> Result<Self> {
        let file_filters = file_config.filters.unwrap_or_default();
        let max_clauses = cli.max_clauses.or(file_filters.max_clauses);

        let mut entities = EntityRegistry::default();
        for (name, entity) in file_config.entities.unwrap_or_default() {
            match entities.get_mut(&name) {
                Some(profile) => entity.apply(profile),
                None => entities.insert(entity.into_profile(&name)?),
            }
        }

        let config = Self {
            filters: FilterConfig { max_clauses },
            entities,
        };
        config.validate()?;
        Ok(config)
    }

    /// Compiler configured from this config
    pub fn compiler(&self) -> FilterCompiler {
        FilterCompiler::new(OperatorTable::default(), self.filters.max_clauses)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.filters.max_clauses == Some(0) {
            anyhow::bail!("Configuration error: filters.max_clauses must be greater than 0");
        }

        for profile in self.entities.iter() {
            for column in profile.fields.fields().chain(profile.sort_fields.fields()) {
                if !is_sql_identifier(column) {
                    anyhow::bail!(
                        "Configuration error: entities.{} column '{}' is not a valid identifier",
                        profile.name,
                        column
                    );
                }
            }

            // Free-text terms are dropped for this listing until fixed
            if profile.fields.resolve(&profile.fallback_label).is_none() {
                tracing::warn!(
                    entity = %profile.name,
                    fallback = %profile.fallback_label,
                    "Fallback label is not a filter field; free-text search is disabled"
                );
            }

            for label in &profile.date_labels {
                if profile.fields.resolve(label).is_none() {
                    tracing::warn!(entity = %profile.name, label = %label, "Unknown date field label");
                }
            }

            if let Some(sort) = &profile.default_sort
                && profile.sort_fields.resolve(sort).is_none()
            {
                tracing::warn!(entity = %profile.name, sort = %sort, "Default sort label is not sortable");
            }
        }

        Ok(())
    }
}

fn extra_keys(extra: &serde_json::Value) -> impl Iterator<Item = &str> {
    extra
        .as_object()
        .into_iter()
        .flat_map(|map| map.keys().map(String::as_str))
}

/// Get the profile config path (~/.taskdesk/taskdesk.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::FilterValue;

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "filters": { "max_clauses": 10 },
            "entities": {
                "task": {
                    "fields": { "Owner": "owner_name" },
                    "fallback": "Project",
                    "default_order": "asc"
                }
            }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.filters.as_ref().unwrap().max_clauses, Some(10));
        let task = &config.entities.as_ref().unwrap()["task"];
        assert_eq!(task.fallback.as_deref(), Some("Project"));
        assert_eq!(task.default_order, Some(OrderDirection::Asc));
        assert_eq!(task.fields.as_ref().unwrap()["Owner"], "owner_name");
    }

    #[test]
    fn test_file_config_parse_empty() {
        let config: FileConfig = serde_json::from_str("{}").unwrap();
        assert!(config.filters.is_none());
        assert!(config.entities.is_none());
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "filters": {}, "server": { "port": 80 } }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert!(config.extra.get("server").is_some());
    }

    #[test]
    fn test_unknown_fields_include_entity_sections() {
        let json = r#"{
            "verbose": true,
            "entities": { "task": { "fallbak": "Project", "fallback": "Title" } }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.entities.as_ref().unwrap()["task"].fallback.as_deref(), Some("Title"));
        assert_eq!(
            config.unknown_fields(),
            vec!["verbose".to_string(), "entities.task.fallbak".to_string()]
        );
    }

    #[test]
    fn test_unknown_fields_empty_for_clean_config() {
        let json = r#"{ "entities": { "user": { "fallback": "Email" } } }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert!(config.unknown_fields().is_empty());
    }

    #[test]
    fn test_file_config_rejects_bad_order() {
        let json = r#"{ "entities": { "task": { "default_order": "sideways" } } }"#;
        assert!(serde_json::from_str::<FileConfig>(json).is_err());
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{
                "filters": { "max_clauses": 10 },
                "entities": { "task": { "fields": { "Owner": "owner_name" }, "fallback": "Project" } }
            }"#,
        )
        .unwrap();
        let overlay: FileConfig = serde_json::from_str(
            r#"{
                "filters": {},
                "entities": { "TASK": { "fields": { "Priority": "priority" } } }
            }"#,
        )
        .unwrap();

        base.merge(overlay);

        assert_eq!(base.filters.as_ref().unwrap().max_clauses, Some(10));
        let task = &base.entities.as_ref().unwrap()["task"];
        let fields = task.fields.as_ref().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["Priority"], "priority");
        assert_eq!(task.fallback.as_deref(), Some("Project"));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::from_sources(FileConfig::default(), &CliConfig::default()).unwrap();
        assert_eq!(config.filters.max_clauses, None);
        assert_eq!(config.entities.names(), vec!["log", "project", "task", "user"]);
        assert_eq!(config.compiler().max_clauses(), None);
    }

    #[test]
    fn test_app_config_cli_override() {
        let file_config: FileConfig =
            serde_json::from_str(r#"{ "filters": { "max_clauses": 10 } }"#).unwrap();
        let cli = CliConfig {
            config: None,
            max_clauses: Some(3),
        };
        let config = AppConfig::from_sources(file_config, &cli).unwrap();
        assert_eq!(config.filters.max_clauses, Some(3));
    }

    #[test]
    fn test_app_config_file_clause_limit() {
        let file_config: FileConfig =
            serde_json::from_str(r#"{ "filters": { "max_clauses": 1 } }"#).unwrap();
        let config = AppConfig::from_sources(file_config, &CliConfig::default()).unwrap();
        assert_eq!(config.compiler().max_clauses(), Some(1));

        let task = config.entities.get("task").unwrap();
        let out = task.compile(Some("Status=open, Title contains foo"), &config.compiler());
        assert_eq!(out.len(), 1);
        assert_eq!(out.ignored_count(), 1);
    }

    #[test]
    fn test_app_config_entity_override() {
        let file_config: FileConfig = serde_json::from_str(
            r#"{ "entities": { "task": { "fields": { "Owner": "owner_name" }, "fallback": "Project" } } }"#,
        )
        .unwrap();
        let config = AppConfig::from_sources(file_config, &CliConfig::default()).unwrap();
        let task = config.entities.get("task").unwrap();
        assert_eq!(task.fields.resolve("owner"), Some("owner_name"));
        assert_eq!(task.fields.resolve("Title"), Some("title"));

        let out = task.compile(Some("weekly"), &config.compiler());
        assert_eq!(
            out.get("project_name__contains"),
            Some(&FilterValue::Text("weekly".to_string()))
        );
    }

    #[test]
    fn test_app_config_new_entity() {
        let file_config: FileConfig = serde_json::from_str(
            r#"{ "entities": { "invoice": {
                "fields": { "Number": "number", "Issued": "issued_at" },
                "fallback": "Number",
                "date_fields": ["Issued"]
            } } }"#,
        )
        .unwrap();
        let config = AppConfig::from_sources(file_config, &CliConfig::default()).unwrap();
        let invoice = config.entities.get("invoice").unwrap();
        assert_eq!(invoice.sort_fields.resolve("Issued"), Some("issued_at"));
        let out = invoice.compile(Some("Issued>2024-01-01"), &config.compiler());
        assert!(out.is_date_field("issued_at"));
    }

    #[test]
    fn test_app_config_new_entity_requires_fallback() {
        let file_config: FileConfig = serde_json::from_str(
            r#"{ "entities": { "invoice": { "fields": { "Number": "number" } } } }"#,
        )
        .unwrap();
        let err = AppConfig::from_sources(file_config, &CliConfig::default()).unwrap_err();
        assert!(err.to_string().contains("entities.invoice.fallback"));
    }

    #[test]
    fn test_app_config_validation_zero_clauses() {
        let cli = CliConfig {
            config: None,
            max_clauses: Some(0),
        };
        assert!(AppConfig::from_sources(FileConfig::default(), &cli).is_err());
    }

    #[test]
    fn test_app_config_validation_bad_column() {
        let file_config: FileConfig = serde_json::from_str(
            r#"{ "entities": { "user": { "fields": { "Role": "role; DROP TABLE users" } } } }"#,
        )
        .unwrap();
        let err = AppConfig::from_sources(file_config, &CliConfig::default()).unwrap_err();
        assert!(err.to_string().contains("not a valid identifier"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{ "filters": { "max_clauses": 7 } }"#).unwrap();

        let config = FileConfig::load_from_file(&path).unwrap();
        assert_eq!(config.filters.unwrap().max_clauses, Some(7));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let err = FileConfig::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_missing_cli_config_path() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/taskdesk.json")),
            max_clauses: None,
        };
        let err = AppConfig::load(&cli).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(
            expand_home(Path::new("/etc/taskdesk.json")),
            PathBuf::from("/etc/taskdesk.json")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_home(Path::new("~/taskdesk.json")),
                home.join("taskdesk.json")
            );
        }
    }
}
