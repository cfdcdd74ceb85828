//! Unit Tests for Configuration Loading

use maxima_driver::{CallTimeout, ConfigLoader, EngineConfig, Error, ErrorKind, Launcher};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::{Builder, NamedTempFile, TempDir};

fn temp_config(suffix: &str) -> NamedTempFile {
    Builder::new().suffix(suffix).tempfile().unwrap()
}

#[test]
fn test_load_toml_file() {
    let mut file = temp_config(".toml");
    writeln!(
        file,
        r#"
executable_path = "/usr/bin/maxima"
arguments = ["--quiet", "--very-quiet"]
encoding = "UTF-8"
default_call_timeout = 5
default_batch_timeout = -1

[environment]
MAXIMA_USERDIR = "/tmp/maxima"
"#
    )
    .unwrap();

    let config = ConfigLoader::load_from_path(file.path()).unwrap();
    assert_eq!(config.executable_path, PathBuf::from("/usr/bin/maxima"));
    assert_eq!(config.arguments, vec!["--quiet", "--very-quiet"]);
    assert_eq!(config.encoding, "UTF-8");
    assert_eq!(config.call_timeout(), CallTimeout::After(Duration::from_secs(5)));
    assert_eq!(config.batch_timeout(), CallTimeout::Unbounded);
    assert_eq!(
        config.environment.unwrap().get("MAXIMA_USERDIR").map(String::as_str),
        Some("/tmp/maxima")
    );
}

#[test]
fn test_load_json_file() {
    let mut file = temp_config(".json");
    write!(
        file,
        r#"{{ "executable_path": "/opt/maxima/bin/maxima", "default_call_timeout": 0 }}"#
    )
    .unwrap();

    let config = ConfigLoader::load_from_path(file.path()).unwrap();
    assert_eq!(config.executable_path, PathBuf::from("/opt/maxima/bin/maxima"));
    assert_eq!(config.encoding, "US-ASCII");
    assert_eq!(config.environment, None);
    assert_eq!(config.call_timeout(), CallTimeout::After(Duration::from_secs(60)));
}

#[test]
fn test_malformed_toml_is_configuration_fault() {
    let mut file = temp_config(".toml");
    writeln!(file, "executable_path = [").unwrap();

    let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
    assert!(matches!(err, Error::ConfigParseFailed { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig {
        arguments: vec!["-q".to_string()],
        default_call_timeout: 30,
        ..EngineConfig::new("/usr/local/bin/maxima")
    };

    for name in ["nested/config.toml", "config.json"] {
        let path = dir.path().join(name);
        ConfigLoader::save_to_path(&config, &path).unwrap();
        assert_eq!(ConfigLoader::load_from_path(&path).unwrap(), config);
    }
}

#[test]
fn test_save_failure_is_configuration_fault() {
    let blocker = temp_config(".toml");
    // A regular file cannot be used as a directory
    let path = blocker.path().join("config.toml");

    let err = ConfigLoader::save_to_path(&EngineConfig::new("sh"), &path).unwrap_err();
    match &err {
        Error::ConfigSaveFailed { path: failed, .. } => assert_eq!(failed, &path),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_search_path_lookup() {
    let dir = TempDir::new().unwrap();
    let base = dir.path().join("maxima-driver");
    std::fs::write(base.with_extension("json"), r#"{ "executable_path": "sh" }"#).unwrap();

    let mut loader = ConfigLoader::new();
    loader.set_search_path(base.clone());
    let config = loader.load().unwrap();

    assert_eq!(loader.current_path(), Some(base.with_extension("json").as_path()));
    assert!(Launcher::new(config).is_ok());
}

#[test]
fn test_launcher_rejects_bad_config_before_spawning() {
    let config = EngineConfig {
        encoding: "UTF-16LE".to_string(),
        ..EngineConfig::new("sh")
    };
    let err = Launcher::new(config).unwrap_err();
    assert!(matches!(err, Error::UnsupportedEncoding { .. }));
}
