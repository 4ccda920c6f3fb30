use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_CONFIG, ENV_MAX_FILTER_CLAUSES};

#[derive(Parser, Debug)]
#[command(name = "taskdesk")]
#[command(version, about = "Listing filter compiler for projects, tasks, users and logs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Maximum number of filter clauses compiled per request
    #[arg(long, global = true, env = ENV_MAX_FILTER_CLAUSES)]
    pub max_clauses: Option<usize>,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Compile a filter string into field__operator predicates
    Compile {
        /// Listing the filter applies to (project, task, user, log)
        #[arg(long, short = 'e')]
        entity: String,

        /// Filter string, e.g. "Title contains foo, Hours Required>=5"
        filter: Option<String>,
    },
    /// Build the SQL WHERE and ORDER BY fragments for a listing
    Query {
        #[arg(long, short = 'e')]
        entity: String,

        /// Sort label (defaults to the listing's default sort)
        #[arg(long, short = 's')]
        sort: Option<String>,

        /// Sort order: asc or desc
        #[arg(long, short = 'o')]
        order: Option<String>,

        filter: Option<String>,
    },
    /// Show the field tables of every listing
    Entities,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub max_clauses: Option<usize>,
}

impl From<&Cli> for CliConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            config: cli.config.clone(),
            max_clauses: cli.max_clauses,
        }
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    (CliConfig::from(&cli), cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compile_command() {
        let cli = Cli::try_parse_from([
            "taskdesk",
            "compile",
            "--entity",
            "task",
            "Title contains foo, Status=open",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Compile {
                entity: "task".to_string(),
                filter: Some("Title contains foo, Status=open".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_query_with_global_flags() {
        let cli = Cli::try_parse_from([
            "taskdesk",
            "query",
            "-e",
            "task",
            "--sort",
            "Title",
            "--order",
            "desc",
            "--max-clauses",
            "5",
            "-c",
            "/tmp/taskdesk.json",
        ])
        .unwrap();
        let config = CliConfig::from(&cli);
        assert_eq!(config.max_clauses, Some(5));
        assert_eq!(config.config, Some(PathBuf::from("/tmp/taskdesk.json")));
        assert_eq!(
            cli.command,
            Commands::Query {
                entity: "task".to_string(),
                sort: Some("Title".to_string()),
                order: Some("desc".to_string()),
                filter: None,
            }
        );
    }

    #[test]
    fn test_compile_requires_entity() {
        assert!(Cli::try_parse_from(["taskdesk", "compile", "Status=open"]).is_err());
    }

    #[test]
    fn test_entities_command() {
        let cli = Cli::try_parse_from(["taskdesk", "entities"]).unwrap();
        assert_eq!(cli.command, Commands::Entities);
    }
}
