//! Loading generator configuration from files.

mod common;

use std::io::Write;

use sqlforge_core::{DialectName, DialectRegistry, GeneratorConfig, PrintFormat, SqlGenError};

#[test]
fn test_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"dialect": "sqlserver", "format": "pretty", "utc_offset_seconds": 19800}}"#
    )
    .unwrap();

    let config = GeneratorConfig::from_path(file.path()).unwrap();
    assert_eq!(config.format, PrintFormat::Pretty);
    assert_eq!(config.bind_context().unwrap().utc_offset.local_minus_utc(), 19800);
    let dialect = config.dialect(DialectRegistry::shared().unwrap()).unwrap();
    assert_eq!(dialect.name(), DialectName::MsSql);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = GeneratorConfig::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SqlGenError::Io(_)));
}

#[test]
fn test_unknown_dialect() {
    let config = GeneratorConfig::new("db2");
    assert!(matches!(
        config.dialect(DialectRegistry::shared().unwrap()),
        Err(SqlGenError::UnknownDialect(_))
    ));
}

#[test]
fn test_round_trip_through_json() {
    let config = GeneratorConfig {
        format: PrintFormat::Pretty,
        ..GeneratorConfig::new("oracle12")
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""format":"pretty""#));
    assert_eq!(GeneratorConfig::from_json_str(&json).unwrap(), config);
    // every fixture dialect is reachable by its own name
    for dialect in common::all_dialects() {
        assert!(GeneratorConfig::new(dialect.name().as_str())
            .dialect(DialectRegistry::shared().unwrap())
            .is_ok());
    }
}
