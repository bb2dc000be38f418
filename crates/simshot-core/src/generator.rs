//! Assembles the full `xcodebuild` build-and-test command line.
//!
//! # Stage order
//!
//! 1. `set -o pipefail &&` so a failing `xcodebuild` is not hidden by the pipe
//! 2. `xcodebuild`
//! 3. project/workspace and scheme, `-sdk`, `-derivedDataPath`, `xcargs`
//! 4. `-destination`
//! 5. `FASTLANE_SNAPSHOT=YES` and `TEST_TARGET_NAME`
//! 6. `clean` (optional), `build`, `test`
//! 7. suffix (empty)
//! 8. `2>&1 | tee <log> | xcpretty <args>`
//!
//! # Example
//!
//! ```no_run
//! use simshot_core::config::SnapshotConfig;
//! use simshot_core::generator::{CommandAssembler, Request, Session};
//! use simshot_core::simctl::Simctl;
//!
//! let session = Session::new(SnapshotConfig::load("simshot.json".as_ref()).unwrap());
//! let assembler = CommandAssembler::new(&session, &Simctl, &Simctl);
//! let generated = assembler
//!     .assemble(&Request {
//!         device_type: Some("iPhone 15"),
//!         language: Some("en"),
//!         locale: Some("en-US"),
//!     })
//!     .unwrap();
//! println!("{}", generated.command.to_shell_string());
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info_span};

use crate::command::{ShellCommand, Stage, Token};
use crate::config::SnapshotConfig;
use crate::destination::{Destination, DestinationError, DestinationSelector, VersionFallback};
use crate::log_path::LogPathBuilder;
use crate::project::Project;
use crate::simctl::{DeviceCatalog, SdkVersions};

pub const TOOL: &str = "xcodebuild";
pub const FORMATTER: &str = "xcpretty";
/// Build setting the UI test helpers look for to enable screenshot capture.
pub const CAPTURE_SETTING: &str = "FASTLANE_SNAPSHOT=YES";
const DERIVED_DATA_PREFIX: &str = "snapshot_derived";

/// Fatal command generation failures. No partial command is returned.
#[derive(Error, Debug)]
pub enum GenerateError {
    /// Neither a workspace nor a project is configured.
    #[error("No project/workspace found")]
    NoProject,

    #[error(transparent)]
    Destination(#[from] DestinationError),

    #[error("Failed to create derived data directory: {0}")]
    DerivedData(#[source] io::Error),

    #[error("Failed to create log directory {path}: {source}")]
    LogDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerateError {
    /// Whether the failure stems from configuration rather than the environment.
    pub fn is_configuration(&self) -> bool {
        matches!(self, GenerateError::NoProject)
    }
}

/// Derived data directory, decided once per [`Session`].
///
/// The first caller either adopts the configured path or creates a temporary
/// directory; later callers get the same path. The mutex makes sure
/// concurrent callers never create two directories.
#[derive(Debug, Default)]
pub struct DerivedDataCache {
    path: Mutex<Option<PathBuf>>,
}

impl DerivedDataCache {
    pub fn get_or_init(&self, configured: Option<&Path>) -> io::Result<PathBuf> {
        let mut slot = self.path.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(path) = slot.as_ref() {
            return Ok(path.clone());
        }

        let path = match configured {
            Some(path) => path.to_path_buf(),
            None => {
                let dir = tempfile::Builder::new()
                    .prefix(DERIVED_DATA_PREFIX)
                    .keep(true)
                    .tempdir()?;
                debug!(path = %dir.path().display(), "created derived data directory");
                dir.path().to_path_buf()
            }
        };
        *slot = Some(path.clone());
        Ok(path)
    }

    /// The cached path, if one was decided already.
    pub fn get(&self) -> Option<PathBuf> {
        self.path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Configuration plus the state shared by every command generated in one run.
#[derive(Debug, Default)]
pub struct Session {
    pub config: SnapshotConfig,
    derived_data: DerivedDataCache,
}

impl Session {
    pub fn new(config: SnapshotConfig) -> Self {
        Self {
            config,
            derived_data: DerivedDataCache::default(),
        }
    }

    pub fn derived_data_path(&self) -> io::Result<PathBuf> {
        self.derived_data
            .get_or_init(self.config.derived_data_path.as_deref())
    }
}

/// What to generate a command for.
#[derive(Debug, Clone, Copy, Default)]
pub struct Request<'a> {
    /// Device name; `None` runs on the host Mac.
    pub device_type: Option<&'a str>,
    pub language: Option<&'a str>,
    pub locale: Option<&'a str>,
}

/// A generated command and what was decided while building it.
#[derive(Debug, Clone)]
pub struct Generated {
    pub command: ShellCommand,
    pub destination: Destination,
    pub log_path: PathBuf,
    pub fallback: Option<VersionFallback>,
}

/// Builds `xcodebuild` invocations for a [`Session`].
pub struct CommandAssembler<'a> {
    session: &'a Session,
    selector: DestinationSelector<'a>,
}

impl<'a> CommandAssembler<'a> {
    pub fn new(
        session: &'a Session,
        catalog: &'a dyn DeviceCatalog,
        sdk: &'a dyn SdkVersions,
    ) -> Self {
        Self {
            session,
            selector: DestinationSelector::new(catalog, sdk),
        }
    }

    /// Generates the command for one device/language/locale combination.
    ///
    /// Fails with [`GenerateError::NoProject`] before any device lookup if no
    /// workspace or project is configured.
    pub fn assemble(&self, request: &Request<'_>) -> Result<Generated, GenerateError> {
        let _span = info_span!("assemble", device = request.device_type.unwrap_or("host")).entered();
        let config = &self.session.config;
        let project = Project::from_config(config).ok_or(GenerateError::NoProject)?;

        let mut command = ShellCommand::new();
        command.push(Stage::Prefix, prefix());
        command.push(Stage::Tool, vec![Token::arg(TOOL)]);
        command.push(Stage::Options, self.options(&project)?);

        let selection = self
            .selector
            .select(request.device_type, config.ios_version.as_ref())?;
        command.push(
            Stage::Destination,
            vec![
                Token::arg("-destination"),
                Token::arg(selection.destination.descriptor()),
            ],
        );

        command.push(Stage::BuildSettings, build_settings(config));
        command.push(Stage::Actions, actions(config));
        command.push(Stage::Suffix, suffix());

        let log_path = self.log_path(&project, request)?;
        command.push(Stage::Pipe, pipe(&log_path, config.xcpretty_args.as_deref()));

        Ok(Generated {
            command,
            destination: selection.destination,
            log_path,
            fallback: selection.fallback,
        })
    }

    fn options(&self, project: &Project) -> Result<Vec<Token>, GenerateError> {
        let config = &self.session.config;
        let mut options = project.xcodebuild_parameters();
        if let Some(sdk) = &config.sdk {
            options.push(Token::arg("-sdk"));
            options.push(Token::arg(sdk.as_str()));
        }
        let derived_data = self
            .session
            .derived_data_path()
            .map_err(GenerateError::DerivedData)?;
        options.push(Token::arg("-derivedDataPath"));
        options.push(Token::arg(derived_data.to_string_lossy()));
        if let Some(xcargs) = config.xcargs.as_deref().filter(|s| !s.trim().is_empty()) {
            options.push(Token::raw(xcargs));
        }
        Ok(options)
    }

    /// Resolves the log file path and makes sure its directory exists.
    fn log_path(&self, project: &Project, request: &Request<'_>) -> Result<PathBuf, GenerateError> {
        let config = &self.session.config;
        let app_name = config
            .app_name
            .clone()
            .unwrap_or_else(|| project.default_app_name());

        let mut builder = LogPathBuilder::new(&app_name, config.scheme.as_deref());
        if config.namespace_log_files {
            builder = builder.namespaced(request.device_type, request.language, request.locale);
        }

        let dir = config.buildlog_dir();
        std::fs::create_dir_all(&dir).map_err(|source| GenerateError::LogDir {
            path: dir.clone(),
            source,
        })?;
        Ok(builder.build_path(&dir))
    }
}

fn prefix() -> Vec<Token> {
    vec![Token::raw("set -o pipefail"), Token::raw("&&")]
}

fn build_settings(config: &SnapshotConfig) -> Vec<Token> {
    let mut settings = vec![Token::arg(CAPTURE_SETTING)];
    if let Some(target) = &config.test_target_name {
        settings.push(Token::arg(format!("TEST_TARGET_NAME={}", target)));
    }
    settings
}

// `build` must run before `test`: the test action needs a built product.
fn actions(config: &SnapshotConfig) -> Vec<Token> {
    let mut actions = Vec::with_capacity(3);
    if config.clean {
        actions.push(Token::arg("clean"));
    }
    actions.push(Token::arg("build"));
    actions.push(Token::arg("test"));
    actions
}

fn suffix() -> Vec<Token> {
    Vec::new()
}

fn pipe(log_path: &Path, formatter_args: Option<&str>) -> Vec<Token> {
    let mut tokens = vec![
        Token::raw("2>&1"),
        Token::raw("|"),
        Token::arg("tee"),
        Token::arg(log_path.to_string_lossy()),
        Token::raw("|"),
        Token::arg(FORMATTER),
    ];
    if let Some(args) = formatter_args.filter(|s| !s.trim().is_empty()) {
        tokens.push(Token::raw(args));
    }
    tokens
}
