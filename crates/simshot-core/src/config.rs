//! Snapshot run configuration.
//!
//! Stored as JSON (by default `simshot.json` in the working directory). Every
//! field is optional; absent values are omitted from the generated command.
//!
//! # Example
//!
//! ```no_run
//! use simshot_core::config::SnapshotConfig;
//!
//! let config = SnapshotConfig::load("simshot.json".as_ref()).unwrap();
//! if let Some(scheme) = &config.scheme {
//!     println!("Scheme: {}", scheme);
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::OsVersion;

pub const DEFAULT_CONFIG_FILENAME: &str = "simshot.json";
const DEFAULT_BUILDLOG_PATH: &str = "~/Library/Logs/snapshot";

/// Errors that can occur when loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Options recognized by the command generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Path to the `.xcworkspace`. Takes precedence over `project`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    /// Path to the `.xcodeproj`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    /// Name used for log files. Defaults to the workspace/project file stem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// `-sdk` override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<String>,

    /// Extra `xcodebuild` arguments, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xcargs: Option<String>,

    /// Run `clean` before `build`.
    pub clean: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_target_name: Option<String>,

    /// OS version to run on. Defaults to the newest installed SDK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios_version: Option<OsVersion>,

    /// Derived data directory. A temporary one is created when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived_data_path: Option<PathBuf>,

    /// Append device, language and locale to log file names.
    pub namespace_log_files: bool,

    /// Directory receiving build logs. A leading `~` is expanded.
    pub buildlog_path: PathBuf,

    /// Arguments for `xcpretty`, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xcpretty_args: Option<String>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            project: None,
            scheme: None,
            app_name: None,
            sdk: None,
            xcargs: None,
            clean: false,
            test_target_name: None,
            ios_version: None,
            derived_data_path: None,
            namespace_log_files: false,
            buildlog_path: PathBuf::from(DEFAULT_BUILDLOG_PATH),
            xcpretty_args: None,
        }
    }
}

impl SnapshotConfig {
    /// Load config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// `buildlog_path` with a leading `~` replaced by the home directory.
    pub fn buildlog_dir(&self) -> PathBuf {
        expand_home(&self.buildlog_path)
    }
}

/// Replaces a leading `~` component with the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
