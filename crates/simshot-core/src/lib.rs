//! # simshot-core
//!
//! Builds the `xcodebuild` command line that builds and runs snapshot UI tests
//! on an iOS or tvOS Simulator (or the host Mac), teeing output into a log file
//! and through `xcpretty`.
//!
//! The command is returned as structured fragments; running it is up to the
//! caller.
//!
//! ## Modules
//!
//! - [`simctl`] - Simulator catalog and SDK version lookup via `xcrun`
//! - [`resolver`] - Picks a simulator by name and OS version
//! - [`destination`] - Turns a device name into an `xcodebuild -destination`
//! - [`log_path`] - Build log file naming
//! - [`project`] - Workspace/project locator arguments
//! - [`command`] - Typed command fragments and shell escaping
//! - [`generator`] - Assembles the full command
//! - [`config`] - JSON configuration
//! - [`version`] - Numeric OS versions
//!
//! ## External Dependencies
//!
//! Generating commands against the live catalog requires **Xcode** (for
//! `xcrun simctl`). The generated command additionally expects `xcpretty`.
//!
//! ## Example
//!
//! ```no_run
//! use simshot_core::config::SnapshotConfig;
//! use simshot_core::generator::{CommandAssembler, Request, Session};
//! use simshot_core::simctl::Simctl;
//!
//! let config = SnapshotConfig {
//!     workspace: Some("App.xcworkspace".into()),
//!     scheme: Some("AppUITests".to_string()),
//!     ..Default::default()
//! };
//! let session = Session::new(config);
//! let assembler = CommandAssembler::new(&session, &Simctl, &Simctl);
//!
//! let generated = assembler
//!     .assemble(&Request { device_type: Some("iPhone 15"), ..Default::default() })
//!     .expect("Failed to generate command");
//! println!("{}", generated.command.to_shell_string());
//! ```

pub mod command;
pub mod config;
pub mod destination;
pub mod generator;
pub mod log_path;
pub mod project;
pub mod resolver;
pub mod simctl;
pub mod version;
