//! Shared test helpers for simshot-core integration tests.
//!
//! Provides an in-memory catalog that records how often it was queried, so
//! tests can assert that some paths never touch the device catalog.

use std::cell::Cell;
use std::path::Path;

use simshot_core::config::SnapshotConfig;
use simshot_core::simctl::{
    DeviceCatalog, Platform, SdkVersions, SimctlError, SimulatedDevice, StaticCatalog,
};
use simshot_core::version::OsVersion;

/// A [`StaticCatalog`] that counts device and SDK queries.
pub struct RecordingCatalog {
    inner: StaticCatalog,
    pub device_queries: Cell<usize>,
    pub sdk_queries: Cell<usize>,
}

impl RecordingCatalog {
    pub fn new(devices: Vec<SimulatedDevice>) -> Self {
        Self {
            inner: StaticCatalog::new(devices),
            device_queries: Cell::new(0),
            sdk_queries: Cell::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.device_queries.get() + self.sdk_queries.get()
    }
}

impl DeviceCatalog for RecordingCatalog {
    fn devices(&self) -> Result<Vec<SimulatedDevice>, SimctlError> {
        self.device_queries.set(self.device_queries.get() + 1);
        self.inner.devices()
    }
}

impl SdkVersions for RecordingCatalog {
    fn latest_version(&self, platform: Platform) -> Result<OsVersion, SimctlError> {
        self.sdk_queries.set(self.sdk_queries.get() + 1);
        self.inner.latest_version(platform)
    }
}

pub fn device(name: &str, platform: Platform, version: &str, udid: &str) -> SimulatedDevice {
    SimulatedDevice {
        name: name.to_string(),
        platform,
        os_version: version.parse().unwrap(),
        udid: udid.to_string(),
    }
}

/// `iPhone 5` on 9.0 (A) and 8.0 (B), plus an Apple TV and an iPhone 15.
pub fn sample_catalog() -> RecordingCatalog {
    RecordingCatalog::new(vec![
        device("iPhone 5", Platform::Ios, "9.0", "A"),
        device("iPhone 5", Platform::Ios, "8.0", "B"),
        device("iPhone 15", Platform::Ios, "17.0", "C"),
        device("Apple TV 4K", Platform::Tvos, "17.0", "TV"),
    ])
}

/// A config pointing at `App.xcodeproj` with scheme `App`, logging into `log_dir`.
pub fn app_config(log_dir: &Path) -> SnapshotConfig {
    SnapshotConfig {
        project: Some("App.xcodeproj".into()),
        scheme: Some("App".to_string()),
        derived_data_path: Some("/tmp/simshot-derived".into()),
        buildlog_path: log_dir.to_path_buf(),
        ..Default::default()
    }
}
