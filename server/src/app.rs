//! Core application

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::domain::filters::FilterCompiler;

pub struct CoreApp {
    pub config: AppConfig,
    pub compiler: FilterCompiler,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::new(AppConfig::load(&cli_config)?);
        let output = app.execute(&command)?;
        println!("{}", output);
        Ok(())
    }

    pub fn new(config: AppConfig) -> Self {
        let compiler = config.compiler();
        Self { config, compiler }
    }

    /// Run one command and return its JSON output
    pub fn execute(&self, command: &Commands) -> Result<String> {
        match command {
            Commands::Compile { entity, filter } => {
                let profile = self.config.entities.get(entity)?;
                let filters = profile.compile(filter.as_deref(), &self.compiler);
                tracing::debug!(
                    entity = %profile.name,
                    predicates = filters.len(),
                    ignored = filters.ignored_count(),
                    "Compiled filter"
                );
                to_json(&serde_json::json!({
                    "entity": profile.name,
                    "filters": filters.to_mapping(),
                    "ignored": filters.diagnostics(),
                }))
            }
            Commands::Query {
                entity,
                sort,
                order,
                filter,
            } => {
                let profile = self.config.entities.get(entity)?;
                let query = profile.listing_query(
                    filter.as_deref(),
                    sort.as_deref(),
                    order.as_deref(),
                    &self.compiler,
                );
                to_json(&query.to_sql())
            }
            Commands::Entities => {
                let descriptions: Vec<_> = self
                    .config
                    .entities
                    .iter()
                    .map(|profile| profile.describe())
                    .collect();
                to_json(&descriptions)
            }
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries command output
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}
