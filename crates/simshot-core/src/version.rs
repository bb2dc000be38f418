//! Numeric OS versions as reported by simulator runtimes and SDKs.
//!
//! Versions compare component by component (`10.0 > 9.3`), never
//! lexicographically. Missing components are zero, so `17`, `17.0` and
//! `17.0.0` are all the same version.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing an [`OsVersion`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// One of the dot-separated components is not a number.
    #[error("Failed to parse {component} version from {version:?}")]
    ComponentInvalid {
        component: &'static str,
        version: String,
    },

    /// The string has no components or more than three.
    #[error("Failed to parse version string {version:?}: expected <major>[.minor][.patch]")]
    VersionStringInvalid { version: String },
}

/// An OS version such as `17.0` or `16.4.1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OsVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl OsVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for OsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.patch != 0 {
            write!(f, ".{}", self.patch)?;
        }
        Ok(())
    }
}

impl FromStr for OsVersion {
    type Err = VersionError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        let v = v.trim();
        let parts: Vec<&str> = v.split('.').collect();
        if v.is_empty() || parts.len() > 3 {
            return Err(VersionError::VersionStringInvalid {
                version: v.to_owned(),
            });
        }

        let parse = |idx: usize, component: &'static str| -> Result<u32, VersionError> {
            match parts.get(idx) {
                None => Ok(0),
                Some(s) => s.parse().map_err(|_| VersionError::ComponentInvalid {
                    component,
                    version: v.to_owned(),
                }),
            }
        };

        Ok(Self {
            major: parse(0, "major")?,
            minor: parse(1, "minor")?,
            patch: parse(2, "patch")?,
        })
    }
}

impl TryFrom<String> for OsVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OsVersion> for String {
    fn from(version: OsVersion) -> Self {
        version.to_string()
    }
}
