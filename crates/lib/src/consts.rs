//! Tool-wide constants.

/// Application name, used for logging and user-facing output.
pub const APP_NAME: &str = "stratus";

/// Name of the per-project state directory.
pub const STATE_DIR_NAME: &str = ".sst";

/// Default build output directory, relative to the project root.
pub const DEFAULT_BUILD_DIR: &str = ".sst/out";
