/// Constants shared by the CLI, config and TUI

pub const APP_NAME: &str = "pm1-monitor";

/// Address of the controller in access-point mode
pub const DEFAULT_BASE_URL: &str = "http://192.168.4.1";

pub const DEFAULT_INTERVAL_MS: u64 = 2500;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Step for the `+`/`-` interval keys
pub const INTERVAL_STEP_MS: u64 = 500;

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const LOG_FILE_NAME: &str = "pm1-monitor.log";

/// Fallback log directory, relative to the working directory
pub const DEFAULT_LOG_DIR: &str = "logs";
