// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "taskdesk";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".taskdesk";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "taskdesk.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "TASKDESK_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TASKDESK_LOG";

// =============================================================================
// Filters
// =============================================================================

/// Environment variable for the optional per-request filter clause limit
pub const ENV_MAX_FILTER_CLAUSES: &str = "TASKDESK_MAX_FILTER_CLAUSES";
