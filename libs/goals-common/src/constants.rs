//! Constants for the goal tracker

/// Key under which the whole goal collection is persisted
pub const GOALS_KEY: &str = "goals";

/// Default data directory name (relative to the user's home)
pub const DATA_DIR_NAME: &str = ".goals";

/// Extension used for files written by the file-backed key-value store
pub const STORE_FILE_EXTENSION: &str = "json";

/// Default log level when nothing else is configured
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Width of the text progress bar printed by the CLI
pub const PROGRESS_BAR_WIDTH: usize = 30;

/// Supported date formats
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Supported datetime formats
pub const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S UTC",
];
