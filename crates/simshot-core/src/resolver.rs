//! Picks the simulator a test run should target.
//!
//! Several simulators can share a name, either on different runtimes or as
//! duplicates on the same runtime. The resolver prefers an exact OS version
//! match and otherwise falls back to the newest runtime carrying that name.
//! Among duplicates with the same name and version, the one the catalog lists
//! first wins.

use thiserror::Error;
use tracing::debug;

use crate::simctl::{DeviceCatalog, SimctlError, SimulatedDevice};
use crate::version::OsVersion;

/// Errors returned by [`DeviceResolver::resolve`].
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No device in the catalog carries the requested name.
    #[error("No simulator named '{name}'")]
    NotFound { name: String },

    /// The catalog could not be queried.
    #[error("Failed to query device catalog: {0}")]
    Catalog(#[from] SimctlError),
}

/// Resolves device names against a [`DeviceCatalog`] snapshot.
pub struct DeviceResolver<'a> {
    catalog: &'a dyn DeviceCatalog,
}

impl<'a> DeviceResolver<'a> {
    pub fn new(catalog: &'a dyn DeviceCatalog) -> Self {
        Self { catalog }
    }

    /// Finds the best device for `name` and `os_version`.
    ///
    /// Names are compared after trimming surrounding whitespace, case
    /// sensitively. When no device runs exactly `os_version`, the device with
    /// the highest OS version is returned instead; callers can detect this by
    /// comparing the returned device's version.
    pub fn resolve(&self, name: &str, os_version: &OsVersion) -> Result<SimulatedDevice, ResolveError> {
        let wanted = name.trim();
        let mut matches: Vec<SimulatedDevice> = self
            .catalog
            .devices()?
            .into_iter()
            .filter(|d| d.name.trim() == wanted)
            .collect();

        // Stable: duplicates keep catalog order
        matches.sort_by(|a, b| b.os_version.cmp(&a.os_version));
        debug!(name = wanted, candidates = matches.len(), "resolving simulator");

        match matches.iter().position(|d| d.os_version == *os_version) {
            Some(idx) => Ok(matches.swap_remove(idx)),
            None => matches.into_iter().next().ok_or_else(|| ResolveError::NotFound {
                name: wanted.to_string(),
            }),
        }
    }

    /// Returns the UDID of the device [`resolve`](Self::resolve) would pick.
    pub fn udid(&self, name: &str, os_version: &OsVersion) -> Option<String> {
        self.resolve(name, os_version).ok().map(|d| d.udid)
    }
}
