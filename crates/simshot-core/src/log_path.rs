//! Deterministic build log file names.
//!
//! A log is named after the app and scheme. With namespacing enabled the
//! device type, language and locale are appended (in that order, each only
//! when present) so parallel runs for different devices or languages do not
//! overwrite each other's logs.

use std::path::{Path, PathBuf};

const SEPARATOR: &str = "-";
const EXTENSION: &str = "log";

/// Naming parts for one build log.
#[derive(Debug, Clone, Default)]
pub struct LogPathBuilder<'a> {
    pub app_name: &'a str,
    pub scheme: Option<&'a str>,
    pub namespace: bool,
    pub device_type: Option<&'a str>,
    pub language: Option<&'a str>,
    pub locale: Option<&'a str>,
}

impl<'a> LogPathBuilder<'a> {
    pub fn new(app_name: &'a str, scheme: Option<&'a str>) -> Self {
        Self {
            app_name,
            scheme,
            ..Default::default()
        }
    }

    pub fn namespaced(
        mut self,
        device_type: Option<&'a str>,
        language: Option<&'a str>,
        locale: Option<&'a str>,
    ) -> Self {
        self.namespace = true;
        self.device_type = device_type;
        self.language = language;
        self.locale = locale;
        self
    }

    fn components(&self) -> Vec<&'a str> {
        let mut parts = vec![self.app_name];
        parts.extend(self.scheme);
        if self.namespace {
            parts.extend(
                [self.device_type, self.language, self.locale]
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.is_empty()),
            );
        }
        parts
    }

    /// The log file name, e.g. `App-App-iPhone 15-en.log`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.components().join(SEPARATOR), EXTENSION)
    }

    /// The log file path inside `base_dir`. Does not touch the filesystem.
    pub fn build_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(self.file_name())
    }
}
