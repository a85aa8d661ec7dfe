//! Gate configuration file handling
//!
//! Provides default configuration generation and loading for the CLI.
//! Configuration files are TOML.

use serde::{Deserialize, Serialize};
use service_suspend::error::{SettingsError, SettingsResult};
use service_suspend::SuspendSettings;
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default node identifier when none is configured
const DEFAULT_NODE_ID: &str = "local";

/// Configuration for one suspendable service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Service identity
    pub service: ServiceConfig,

    /// Suspend allow-lists and hooks
    #[serde(default)]
    pub suspend: SuspendSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Service identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name, used in `service.<name>.suspended` notifications
    pub name: String,

    /// Node this instance runs on
    #[serde(default = "default_node_id")]
    pub node_id: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_node_id() -> String {
    DEFAULT_NODE_ID.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl GateConfig {
    /// Create a new configuration for `service_name` with default settings
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service: ServiceConfig {
                name: service_name.into(),
                node_id: default_node_id(),
            },
            suspend: SuspendSettings::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> SettingsResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| SettingsError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        write_file(path, &contents)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(service_name: &str) -> String {
        format!(
            r#"# Suspend gate configuration

[service]
# Service name. Notifications go out as service.<name>.suspended / .resumed
name = "{service_name}"

# Node this instance runs on (reported in rejection data)
node_id = "{node_id}"

[suspend]
# Actions still reachable while suspended: "*" for all, or a list of patterns.
# suspendService, resumeService and isSuspended are always reachable.
# Patterns: "*" = one segment, "**" = any segments, "get*" = prefix match
allowed_actions = []

# Events still delivered while suspended: "*" for all, or a list of patterns.
# "$"-prefixed internal events and suspend/resume notifications always pass.
allowed_events = []

# Service method run on every suspend/resume (optional)
# handler = "drain"

# Services this one depends on (informational)
dependencies = []

[logging]
# Log level: trace, debug, info, warn, error
level = "{level}"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/service-suspend.log"
"#,
            node_id = DEFAULT_NODE_ID,
            level = DEFAULT_LOG_LEVEL,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path, service_name: &str) -> SettingsResult<()> {
        write_file(config_path, &Self::generate_default_toml(service_name))
    }
}

fn write_file(path: &Path, contents: &str) -> SettingsResult<()> {
    let write_err = |e: std::io::Error| SettingsError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    // Create parent directory if needed
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}
