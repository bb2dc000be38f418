//! CLI for generating `xcodebuild` snapshot test commands.
//!
//! Prints the command instead of running it, so it can be fed to a shell,
//! a CI step or a wrapper script.
//!
//! # Usage
//!
//! ```bash
//! # Generate the command for one device/language combination
//! simshot generate --device "iPhone 15" --language en --locale en-US
//!
//! # Use a specific config file and OS version
//! simshot -c ci/simshot.json generate -d "iPad Air (5th generation)" --os 17.2
//!
//! # Generate against a saved `xcrun simctl list --json devices` dump
//! simshot generate -d "iPhone 15" --catalog devices.json
//!
//! # Machine-readable output
//! simshot -f json generate -d "iPhone 15"
//!
//! # List simulators / show which one a name resolves to
//! simshot devices
//! simshot resolve "iPhone 15" --os 17.0
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use simshot_core::config::{SnapshotConfig, DEFAULT_CONFIG_FILENAME};
use simshot_core::destination::platform_for;
use simshot_core::generator::{CommandAssembler, GenerateError, Request, Session};
use simshot_core::resolver::DeviceResolver;
use simshot_core::simctl::{
    DeviceCatalog, Platform, SdkVersions, SimctlError, SimulatedDevice, Simctl, StaticCatalog,
};
use simshot_core::version::OsVersion;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Generate xcodebuild commands for simulator snapshot runs.
#[derive(Parser)]
#[command(name = "simshot")]
#[command(about = "Generate xcodebuild snapshot test commands for iOS Simulators")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILENAME, env = "SIMSHOT_CONFIG")]
    config: PathBuf,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the build-and-test command for a device
    Generate {
        /// Simulator name; omit to run on the host Mac
        #[arg(short, long)]
        device: Option<String>,
        /// Language, used to namespace the log file
        #[arg(short, long)]
        language: Option<String>,
        /// Locale, used to namespace the log file
        #[arg(short = 'L', long)]
        locale: Option<String>,
        /// OS version to run on (overrides `ios_version`)
        #[arg(long)]
        os: Option<OsVersion>,
        /// Read devices from a saved `simctl list --json devices` dump
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// List available simulator devices
    Devices {
        /// Read devices from a saved `simctl list --json devices` dump
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Show which simulator a device name resolves to
    Resolve {
        /// Simulator name
        name: String,
        /// OS version to prefer; defaults to the newest SDK
        #[arg(long)]
        os: Option<OsVersion>,
        /// Read devices from a saved `simctl list --json devices` dump
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Config(String),
    Generation(String),
    Output(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Generation(_) => ExitCode::from(1),
            CliError::Config(_) => ExitCode::from(2),
            CliError::Output(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Generation(msg) => write!(f, "{}", msg),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl From<GenerateError> for CliError {
    fn from(e: GenerateError) -> Self {
        if e.is_configuration() {
            CliError::Config(e.to_string())
        } else {
            CliError::Generation(e.to_string())
        }
    }
}

/// Either the live `xcrun simctl` catalog or a saved device list.
enum Catalog {
    Live(Simctl),
    Saved(StaticCatalog),
}

impl Catalog {
    fn open(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Catalog::Live(Simctl));
        };
        let json = std::fs::read(path)
            .map_err(|e| CliError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        StaticCatalog::from_simctl_json(&json)
            .map(Catalog::Saved)
            .map_err(|e| CliError::Config(format!("Invalid device list {}: {}", path.display(), e)))
    }
}

impl DeviceCatalog for Catalog {
    fn devices(&self) -> Result<Vec<SimulatedDevice>, SimctlError> {
        match self {
            Catalog::Live(simctl) => simctl.devices(),
            Catalog::Saved(saved) => saved.devices(),
        }
    }
}

impl SdkVersions for Catalog {
    fn latest_version(&self, platform: Platform) -> Result<OsVersion, SimctlError> {
        match self {
            Catalog::Live(simctl) => simctl.latest_version(platform),
            Catalog::Saved(saved) => saved.latest_version(platform),
        }
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let s = serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))?;
    println!("{}", s);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Generate {
            ref device,
            ref language,
            ref locale,
            os,
            ref catalog,
        } => {
            debug!(config = %cli.config.display(), "loading configuration");
            let mut config = SnapshotConfig::load(&cli.config).map_err(|e| CliError::Config(e.to_string()))?;
            if os.is_some() {
                config.ios_version = os;
            }
            let catalog = Catalog::open(catalog.as_deref())?;
            let session = Session::new(config);
            let assembler = CommandAssembler::new(&session, &catalog, &catalog);

            let generated = assembler.assemble(&Request {
                device_type: device.as_deref(),
                language: language.as_deref(),
                locale: locale.as_deref(),
            })?;

            if cli.format == OutputFormat::Json {
                print_json(&serde_json::json!({
                    "command": generated.command.to_shell_string(),
                    "parts": generated.command.parts(),
                    "log_path": generated.log_path,
                    "destination": generated.destination,
                    "fallback": generated.fallback.as_ref().map(|f| f.to_string()),
                }))
            } else {
                println!("{}", generated.command.to_shell_string());
                Ok(())
            }
        }
        Command::Devices { ref catalog } => {
            let devices = Catalog::open(catalog.as_deref())?
                .devices()
                .map_err(|e| CliError::Generation(format!("Failed to list devices: {}", e)))?;
            if cli.format == OutputFormat::Json {
                let value = serde_json::to_value(&devices).map_err(|e| CliError::Output(e.to_string()))?;
                return print_json(&value);
            }
            if devices.is_empty() {
                eprintln!("No simulator devices found");
            }
            for device in &devices {
                println!("{} -- {} ({} {})", device.udid, device.name, device.platform, device.os_version);
            }
            Ok(())
        }
        Command::Resolve {
            ref name,
            os,
            ref catalog,
        } => {
            let catalog = Catalog::open(catalog.as_deref())?;
            let os = match os {
                Some(os) => os,
                None => catalog
                    .latest_version(platform_for(name))
                    .map_err(|e| CliError::Generation(format!("Failed to determine OS version: {}", e)))?,
            };
            let device = DeviceResolver::new(&catalog)
                .resolve(name, &os)
                .map_err(|e| CliError::Generation(format!("No device found named '{}' for version '{}': {}", name, os, e)))?;

            if cli.format == OutputFormat::Json {
                let value = serde_json::to_value(&device).map_err(|e| CliError::Output(e.to_string()))?;
                return print_json(&value);
            }
            if device.os_version != os {
                eprintln!("No {} on {}, using {}", name, os, device.os_version);
            }
            println!("{} -- {} ({} {})", device.udid, device.name, device.platform, device.os_version);
            Ok(())
        }
    }
}
