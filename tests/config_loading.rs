// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use shellpipe::build_registry;
use shellpipe::config::{load_and_validate, load_or_default};
use shellpipe::errors::ShellError;

#[test]
fn full_config_loads() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[session]
delimiter = "demo$"
separator = ","

[pipeline]
drain_timeout_ms = 250

[alias]
up = "upper"
n = "count"
"#
    )
    .unwrap();

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.session.delimiter, "demo$");
    assert_eq!(cfg.session.separator, ",");
    assert_eq!(cfg.pipeline.drain_timeout(), Some(Duration::from_millis(250)));

    let registry = build_registry(&cfg).unwrap();
    assert_eq!(registry.get("up").unwrap().name, "upper");
    assert_eq!(registry.get("n").unwrap().name, "count");
}

#[test]
fn bad_alias_returns_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[alias]
zap = "rm"
"#
    )
    .unwrap();

    match load_and_validate(file.path()) {
        Err(ShellError::ConfigError(msg)) => {
            assert!(msg.contains("zap"));
            assert!(msg.contains("rm"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_returns_toml_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[session\ndelimiter = ").unwrap();

    assert!(matches!(
        load_and_validate(file.path()),
        Err(ShellError::TomlError(_))
    ));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_or_default(Some(missing.as_path())),
        Err(ShellError::IoError(_))
    ));
}
