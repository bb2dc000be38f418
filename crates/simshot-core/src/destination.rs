//! Turns a requested device into an `xcodebuild -destination` value.
//!
//! macOS targets always run on the host machine, so no simulator lookup
//! happens for them. Everything else is resolved through
//! [`DeviceResolver`]; if the requested OS version is not installed for that
//! device the newest available one is used and a [`VersionFallback`] is
//! reported alongside the destination.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::resolver::{DeviceResolver, ResolveError};
use crate::simctl::{DeviceCatalog, Platform, SdkVersions, SimctlError};
use crate::version::OsVersion;

const MAC_PREFIX: &str = "Mac";
const APPLE_TV_PREFIX: &str = "Apple TV";

/// Fatal destination selection failures.
#[derive(Error, Debug)]
pub enum DestinationError {
    /// No simulator matches the requested name.
    #[error("No device found named '{name}' for version '{version}'")]
    DeviceNotFound { name: String, version: OsVersion },

    /// No OS version was requested and the latest one could not be determined.
    #[error("Failed to determine the latest {platform} version: {source}")]
    LatestVersion {
        platform: Platform,
        #[source]
        source: SimctlError,
    },
}

/// Where `xcodebuild` should run the build and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    /// The host Mac.
    MacHost,
    /// A specific simulator instance.
    Simulator {
        platform: Platform,
        udid: String,
        os_version: OsVersion,
    },
}

impl Destination {
    /// The value passed to `xcodebuild -destination`.
    pub fn descriptor(&self) -> String {
        match self {
            Destination::MacHost => "platform=macOS".to_string(),
            Destination::Simulator {
                platform,
                udid,
                os_version,
            } => format!("platform={} Simulator,id={},OS={}", platform, udid, os_version),
        }
    }
}

/// The resolved device runs a different OS version than was asked for.
///
/// Not an error: the build proceeds on the resolved device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionFallback {
    pub device_name: String,
    pub requested: OsVersion,
    pub resolved: OsVersion,
}

impl fmt::Display for VersionFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Using device named '{}' with version '{}' because no match was found for version '{}'",
            self.device_name, self.resolved, self.requested
        )
    }
}

/// Outcome of [`DestinationSelector::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub destination: Destination,
    pub fallback: Option<VersionFallback>,
}

/// Returns the platform a device name belongs to. Mac names map to the host.
pub fn platform_for(device_name: &str) -> Platform {
    if device_name.starts_with(MAC_PREFIX) {
        Platform::Macos
    } else if device_name.starts_with(APPLE_TV_PREFIX) {
        Platform::Tvos
    } else {
        Platform::Ios
    }
}

/// Builds [`Destination`]s from device names.
pub struct DestinationSelector<'a> {
    resolver: DeviceResolver<'a>,
    sdk: &'a dyn SdkVersions,
}

impl<'a> DestinationSelector<'a> {
    pub fn new(catalog: &'a dyn DeviceCatalog, sdk: &'a dyn SdkVersions) -> Self {
        Self {
            resolver: DeviceResolver::new(catalog),
            sdk,
        }
    }

    /// Selects the destination for `device_name`.
    ///
    /// A missing name or one starting with `Mac` targets the host. Without
    /// `os_version` the newest SDK version for the device's platform is used.
    pub fn select(
        &self,
        device_name: Option<&str>,
        os_version: Option<&OsVersion>,
    ) -> Result<Selection, DestinationError> {
        let name = match device_name {
            Some(name) if platform_for(name) != Platform::Macos => name,
            _ => {
                return Ok(Selection {
                    destination: Destination::MacHost,
                    fallback: None,
                })
            }
        };

        let platform = platform_for(name);
        let requested = match os_version {
            Some(v) => *v,
            None => self
                .sdk
                .latest_version(platform)
                .map_err(|source| DestinationError::LatestVersion { platform, source })?,
        };

        let device = self.resolver.resolve(name, &requested).map_err(|e| {
            if let ResolveError::Catalog(err) = &e {
                warn!(error = %err, "device catalog unavailable");
            }
            DestinationError::DeviceNotFound {
                name: name.to_string(),
                version: requested,
            }
        })?;

        let fallback = (device.os_version != requested).then(|| VersionFallback {
            device_name: name.to_string(),
            requested,
            resolved: device.os_version,
        });
        if let Some(fallback) = &fallback {
            warn!(device = name, requested = %requested, resolved = %device.os_version, "{}", fallback);
        }

        Ok(Selection {
            destination: Destination::Simulator {
                platform,
                udid: device.udid,
                os_version: device.os_version,
            },
            fallback,
        })
    }
}
