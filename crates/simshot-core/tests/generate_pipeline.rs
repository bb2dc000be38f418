//! End-to-end command generation against an in-memory catalog.

mod common;

use common::{app_config, sample_catalog};

use simshot_core::command::{Stage, Token};
use simshot_core::destination::{Destination, DestinationError};
use simshot_core::generator::{CommandAssembler, GenerateError, Request, Session};
use simshot_core::simctl::Platform;
use simshot_core::version::OsVersion;

fn v(s: &str) -> OsVersion {
    s.parse().unwrap()
}

fn stage_strings(tokens: Vec<&Token>) -> Vec<String> {
    tokens.into_iter().map(Token::render).collect()
}

#[test]
fn test_full_command_line() {
    let logs = tempfile::tempdir().unwrap();
    let mut config = app_config(logs.path());
    config.ios_version = Some(v("9.0"));
    let session = Session::new(config);
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    let generated = assembler
        .assemble(&Request {
            device_type: Some("iPhone 5"),
            language: Some("en"),
            locale: None,
        })
        .unwrap();

    let expected = format!(
        "set -o pipefail && xcodebuild -project App.xcodeproj -scheme App \
         -derivedDataPath /tmp/simshot-derived \
         -destination 'platform=iOS Simulator,id=A,OS=9.0' \
         FASTLANE_SNAPSHOT=YES build test \
         2>&1 | tee {} | xcpretty",
        simshot_core::command::shell_escape(&generated.log_path.to_string_lossy())
    );
    assert_eq!(generated.command.to_shell_string(), expected);
    assert!(generated.fallback.is_none());
}

#[test]
fn test_stage_order_is_fixed() {
    let logs = tempfile::tempdir().unwrap();
    let mut config = app_config(logs.path());
    config.clean = true;
    config.sdk = Some("iphonesimulator".to_string());
    config.xcargs = Some("-parallel-testing-enabled NO".to_string());
    config.test_target_name = Some("AppUITests".to_string());
    config.xcpretty_args = Some("--color".to_string());
    let session = Session::new(config);
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    let generated = assembler
        .assemble(&Request {
            device_type: Some("iPhone 15"),
            ..Default::default()
        })
        .unwrap();

    let stages: Vec<Stage> = generated.command.fragments().iter().map(|f| f.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Prefix,
            Stage::Tool,
            Stage::Options,
            Stage::Destination,
            Stage::BuildSettings,
            Stage::Actions,
            Stage::Pipe,
        ]
    );

    assert_eq!(
        stage_strings(generated.command.stage_tokens(Stage::Actions)),
        vec!["clean", "build", "test"]
    );
    assert_eq!(
        stage_strings(generated.command.stage_tokens(Stage::BuildSettings)),
        vec!["FASTLANE_SNAPSHOT=YES", "TEST_TARGET_NAME=AppUITests"]
    );

    let options = stage_strings(generated.command.stage_tokens(Stage::Options));
    assert_eq!(
        options,
        vec![
            "-project",
            "App.xcodeproj",
            "-scheme",
            "App",
            "-sdk",
            "iphonesimulator",
            "-derivedDataPath",
            "/tmp/simshot-derived",
            "-parallel-testing-enabled NO",
        ]
    );

    let line = generated.command.to_shell_string();
    assert!(line.ends_with("| xcpretty --color"));
    assert!(line.find(" clean ").unwrap() < line.find(" build ").unwrap());
    assert!(line.find(" build ").unwrap() < line.find(" test ").unwrap());
}

#[test]
fn test_version_fallback_is_reported() {
    let logs = tempfile::tempdir().unwrap();
    let mut config = app_config(logs.path());
    config.ios_version = Some(v("10.0"));
    let session = Session::new(config);
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    let generated = assembler
        .assemble(&Request {
            device_type: Some("iPhone 5"),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(
        generated.destination,
        Destination::Simulator {
            platform: Platform::Ios,
            udid: "A".to_string(),
            os_version: v("9.0"),
        }
    );
    let fallback = generated.fallback.expect("fallback should be reported");
    assert_eq!(fallback.requested, v("10.0"));
    assert_eq!(fallback.resolved, v("9.0"));
    assert!(generated
        .command
        .to_shell_string()
        .contains("'platform=iOS Simulator,id=A,OS=9.0'"));
}

#[test]
fn test_default_version_uses_latest_sdk() {
    let logs = tempfile::tempdir().unwrap();
    let session = Session::new(app_config(logs.path()));
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    // Latest iOS in the catalog is 17.0; iPhone 5 tops out at 9.0
    let generated = assembler
        .assemble(&Request {
            device_type: Some("iPhone 5"),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(catalog.sdk_queries.get(), 1);
    assert_eq!(generated.fallback.unwrap().requested, v("17.0"));
}

#[test]
fn test_host_target_never_queries_catalog() {
    let logs = tempfile::tempdir().unwrap();
    let session = Session::new(app_config(logs.path()));
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    for device in [None, Some("Mac")] {
        let generated = assembler
            .assemble(&Request {
                device_type: device,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(generated.destination, Destination::MacHost);
        assert!(generated
            .command
            .to_shell_string()
            .contains("-destination platform=macOS"));
    }
    assert_eq!(catalog.queries(), 0);
}

#[test]
fn test_missing_project_fails_before_destination() {
    let logs = tempfile::tempdir().unwrap();
    let mut config = app_config(logs.path());
    config.project = None;
    config.workspace = None;
    let session = Session::new(config);
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    let err = assembler
        .assemble(&Request {
            device_type: Some("iPhone 5"),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(err, GenerateError::NoProject));
    assert!(err.is_configuration());
    assert_eq!(catalog.queries(), 0);
}

#[test]
fn test_unknown_device_aborts_generation() {
    let logs = tempfile::tempdir().unwrap();
    let mut config = app_config(logs.path());
    config.ios_version = Some(v("17.0"));
    let session = Session::new(config);
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    let err = assembler
        .assemble(&Request {
            device_type: Some("iPhone 99"),
            ..Default::default()
        })
        .unwrap_err();

    match &err {
        GenerateError::Destination(DestinationError::DeviceNotFound { name, version }) => {
            assert_eq!(name, "iPhone 99");
            assert_eq!(*version, v("17.0"));
        }
        other => panic!("expected DeviceNotFound, got {:?}", other),
    }
    assert!(!err.is_configuration());
    assert!(err.to_string().contains("iPhone 99"));
    assert!(err.to_string().contains("17.0"));
}

#[test]
fn test_namespaced_log_path() {
    let logs = tempfile::tempdir().unwrap();
    let base = logs.path().join("nested").join("logs");
    let mut config = app_config(&base);
    config.namespace_log_files = true;
    config.ios_version = Some(v("9.0"));
    let session = Session::new(config);
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    let request = Request {
        device_type: Some("iPhone 5"),
        language: Some("en"),
        locale: None,
    };
    let generated = assembler.assemble(&request).unwrap();

    assert!(base.is_dir(), "log directory should be created");
    assert_eq!(generated.log_path, base.join("App-App-iPhone 5-en.log"));
    assert!(generated
        .command
        .to_shell_string()
        .contains("-iPhone 5-en.log'"));

    // Generating twice yields the same path
    assert_eq!(assembler.assemble(&request).unwrap().log_path, generated.log_path);
}

#[test]
fn test_app_name_override_and_temp_derived_data() {
    let logs = tempfile::tempdir().unwrap();
    let mut config = app_config(logs.path());
    config.app_name = Some("Shop".to_string());
    config.derived_data_path = None;
    config.ios_version = Some(v("17.0"));
    let session = Session::new(config);
    let catalog = sample_catalog();
    let assembler = CommandAssembler::new(&session, &catalog, &catalog);

    let first = assembler
        .assemble(&Request {
            device_type: Some("iPhone 15"),
            ..Default::default()
        })
        .unwrap();
    let second = assembler
        .assemble(&Request {
            device_type: Some("Apple TV 4K"),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(first.log_path, logs.path().join("Shop-App.log"));

    let derived = session.derived_data_path().unwrap();
    assert!(derived.is_dir());
    for generated in [&first, &second] {
        let options = stage_strings(generated.command.stage_tokens(Stage::Options));
        assert!(options.contains(&derived.to_string_lossy().into_owned()));
    }
    assert_eq!(
        second.destination.descriptor(),
        "platform=tvOS Simulator,id=TV,OS=17.0"
    );

    std::fs::remove_dir_all(derived).unwrap();
}
