//! Simulator catalog backed by Apple's `xcrun simctl`.
//!
//! Device resolution never talks to `simctl` directly. It goes through the
//! [`DeviceCatalog`] capability, which hands out a snapshot of the available
//! devices, and the [`SdkVersions`] capability, which reports the newest OS
//! version installed for a platform. [`Simctl`] implements both against the
//! live toolchain; [`StaticCatalog`] implements both over a fixed list.
//!
//! # Requirements
//!
//! Xcode must be installed for `xcrun simctl` to be available.
//!
//! # Example
//!
//! ```no_run
//! use simshot_core::simctl::{DeviceCatalog, Simctl};
//!
//! let devices = Simctl.devices().unwrap();
//! for device in &devices {
//!     println!("{} ({} {}): {}", device.name, device.platform, device.os_version, device.udid);
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::version::{OsVersion, VersionError};

const RUNTIME_PREFIX: &str = "com.apple.CoreSimulator.SimRuntime.";

/// Errors that can occur when querying the simulator toolchain.
#[derive(Error, Debug)]
pub enum SimctlError {
    /// A simctl or xcrun command failed to execute successfully.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse JSON output from simctl.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// An I/O error occurred while executing the command.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The toolchain reported a version we could not parse.
    #[error("Invalid version reported: {0}")]
    InvalidVersion(#[from] VersionError),

    /// No runtime is installed for the platform.
    #[error("No {0} runtime available")]
    NoRuntime(Platform),
}

/// OS family of a simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "iOS")]
    Ios,
    #[serde(rename = "tvOS")]
    Tvos,
    #[serde(rename = "macOS")]
    Macos,
}

impl Platform {
    /// Parses the platform part of a runtime identifier (`iOS`, `tvOS`, `macOS`).
    pub fn from_runtime_name(name: &str) -> Option<Self> {
        match name {
            "iOS" => Some(Platform::Ios),
            "tvOS" => Some(Platform::Tvos),
            "macOS" => Some(Platform::Macos),
            _ => None,
        }
    }

    /// The SDK name `xcrun --sdk` expects for this platform.
    pub fn sdk_name(&self) -> &'static str {
        match self {
            Platform::Ios => "iphonesimulator",
            Platform::Tvos => "appletvsimulator",
            Platform::Macos => "macosx",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Ios => "iOS",
            Platform::Tvos => "tvOS",
            Platform::Macos => "macOS",
        })
    }
}

/// A simulator instance as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedDevice {
    /// The human-readable name of the device (e.g., "iPhone 15 Pro").
    pub name: String,

    /// The OS family of the runtime the device belongs to.
    pub platform: Platform,

    /// The OS version of the runtime the device belongs to.
    pub os_version: OsVersion,

    /// The unique device identifier (UDID) for this simulator.
    pub udid: String,
}

/// Source of the currently available simulated devices.
///
/// Each call returns a fresh snapshot; callers never mutate catalog state.
pub trait DeviceCatalog {
    fn devices(&self) -> Result<Vec<SimulatedDevice>, SimctlError>;
}

/// Source of the newest installed OS version per platform.
pub trait SdkVersions {
    fn latest_version(&self, platform: Platform) -> Result<OsVersion, SimctlError>;
}

#[derive(Debug, Deserialize)]
struct RawDevice {
    udid: String,
    name: String,
    #[serde(rename = "isAvailable", default = "available_by_default")]
    is_available: bool,
}

fn available_by_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    devices: BTreeMap<String, Vec<RawDevice>>,
}

/// Splits a runtime key into platform and version.
///
/// Accepts both `com.apple.CoreSimulator.SimRuntime.iOS-17-0` and the legacy
/// `iOS 9.0` form.
fn parse_runtime(key: &str) -> Option<(Platform, OsVersion)> {
    let runtime = key.strip_prefix(RUNTIME_PREFIX).unwrap_or(key);
    let (platform, version) = runtime.split_once(|c: char| c == '-' || c == ' ')?;
    let platform = Platform::from_runtime_name(platform)?;
    let version = version.replace('-', ".").parse().ok()?;
    Some((platform, version))
}

/// Wrapper for `xcrun simctl` and `xcrun --show-sdk-version`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simctl;

impl Simctl {
    /// Lists all available simulator devices for supported platforms.
    ///
    /// Queries `xcrun simctl list --json devices available`. Runtimes are
    /// visited in sorted key order and devices keep their order within a
    /// runtime, so the result is stable for a given simctl output.
    ///
    /// # Errors
    ///
    /// - [`SimctlError::Io`] if the command fails to execute
    /// - [`SimctlError::CommandFailed`] if simctl returns a non-zero exit code
    /// - [`SimctlError::JsonParse`] if the output cannot be parsed as JSON
    pub fn list_devices() -> Result<Vec<SimulatedDevice>, SimctlError> {
        let output = Command::new("xcrun")
            .args(["simctl", "list", "--json", "devices", "available"])
            .output()?;

        if !output.status.success() {
            return Err(SimctlError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        Self::parse_device_list(&output.stdout)
    }

    /// Parses device list JSON into a flat vector of devices.
    ///
    /// Runtimes for unsupported platforms (watchOS, visionOS) and devices
    /// flagged as unavailable are skipped.
    pub fn parse_device_list(json: &[u8]) -> Result<Vec<SimulatedDevice>, SimctlError> {
        let device_list: DeviceList = serde_json::from_slice(json)?;
        let mut devices = Vec::new();

        for (runtime, entries) in device_list.devices {
            let Some((platform, os_version)) = parse_runtime(&runtime) else {
                debug!(%runtime, "skipping unsupported runtime");
                continue;
            };
            devices.extend(entries.into_iter().filter(|d| d.is_available).map(|d| {
                SimulatedDevice {
                    name: d.name,
                    platform,
                    os_version,
                    udid: d.udid,
                }
            }));
        }

        Ok(devices)
    }

    /// Returns the SDK version Xcode builds against for `platform`.
    ///
    /// Runs `xcrun --sdk <sdk> --show-sdk-version`.
    pub fn sdk_version(platform: Platform) -> Result<OsVersion, SimctlError> {
        let output = Command::new("xcrun")
            .args(["--sdk", platform.sdk_name(), "--show-sdk-version"])
            .output()?;

        if !output.status.success() {
            return Err(SimctlError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let version = String::from_utf8_lossy(&output.stdout).trim().parse()?;
        debug!(%platform, %version, "detected latest sdk version");
        Ok(version)
    }
}

impl DeviceCatalog for Simctl {
    fn devices(&self) -> Result<Vec<SimulatedDevice>, SimctlError> {
        Self::list_devices()
    }
}

impl SdkVersions for Simctl {
    fn latest_version(&self, platform: Platform) -> Result<OsVersion, SimctlError> {
        Self::sdk_version(platform)
    }
}

/// A fixed device list, e.g. loaded from a saved `simctl list --json` dump.
///
/// The newest runtime it holds for a platform stands in for the SDK version.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    devices: Vec<SimulatedDevice>,
}

impl StaticCatalog {
    pub fn new(devices: Vec<SimulatedDevice>) -> Self {
        Self { devices }
    }

    /// Builds a catalog from `xcrun simctl list --json devices` output.
    pub fn from_simctl_json(json: &[u8]) -> Result<Self, SimctlError> {
        Simctl::parse_device_list(json).map(Self::new)
    }
}

impl DeviceCatalog for StaticCatalog {
    fn devices(&self) -> Result<Vec<SimulatedDevice>, SimctlError> {
        Ok(self.devices.clone())
    }
}

impl SdkVersions for StaticCatalog {
    fn latest_version(&self, platform: Platform) -> Result<OsVersion, SimctlError> {
        self.devices
            .iter()
            .filter(|d| d.platform == platform)
            .map(|d| d.os_version)
            .max()
            .ok_or(SimctlError::NoRuntime(platform))
    }
}
