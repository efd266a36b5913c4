//! Tests for configuration loading.

use std::io::Write;
use std::time::Duration;

use figment::{providers::Serialized, Figment};
use modkit_dsn::{DbConfig, DbError, PoolConfig};

fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_yaml_snake_case() {
    let file = write_yaml(
        r#"
database:
  url: "postgres://app:pw@db/app"
  conn_max_idle_time: 30s
  conn_max_lifetime: 1h
  max_open_conns: 20
  max_idle_conns: 5
"#,
    );

    let cfg = DbConfig::load_layered(Some(file.path())).unwrap();
    assert_eq!(cfg.url, "postgres://app:pw@db/app");
    assert_eq!(
        cfg.pool(),
        PoolConfig {
            conn_max_idle_time: Duration::from_secs(30),
            conn_max_lifetime: Duration::from_secs(3600),
            max_open_conns: 20,
            max_idle_conns: 5,
        }
    );
}

#[test]
fn test_load_yaml_camel_case_aliases() {
    let file = write_yaml(
        r#"
database:
  url: "mysql://u:p@db/app"
  connMaxIdleTime: 2m
  connMaxLifetime: 10m
  maxOpenConns: 8
  maxIdleConns: 2
"#,
    );

    let cfg = DbConfig::load_layered(Some(file.path())).unwrap();
    assert_eq!(cfg.conn_max_idle_time, Duration::from_secs(120));
    assert_eq!(cfg.conn_max_lifetime, Duration::from_secs(600));
    assert_eq!(cfg.max_open_conns, 8);
    assert_eq!(cfg.max_idle_conns, 2);
}

#[test]
fn test_unset_fields_default_to_zero() {
    let figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
        "database": { "url": "sqlite3:///a.db" }
    })));

    let cfg = DbConfig::from_figment(&figment).unwrap();
    assert_eq!(cfg.url, "sqlite3:///a.db");
    assert_eq!(cfg.pool(), PoolConfig::default());
}

#[test]
fn test_unknown_field_rejected() {
    let figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
        "database": { "url": "sqlite3:///a.db", "max_conns": 4 }
    })));

    let err = DbConfig::from_figment(&figment).unwrap_err();
    assert!(matches!(err, DbError::Config(_)), "{err:?}");
}

#[test]
fn test_bad_duration_rejected() {
    let file = write_yaml(
        r#"
database:
  url: "sqlite3:///a.db"
  conn_max_idle_time: "soon"
"#,
    );

    assert!(DbConfig::load_layered(Some(file.path())).is_err());
}

#[test]
fn test_serde_round_trip_through_yaml() {
    let cfg = DbConfig {
        url: "postgres://app:pw@db/app".into(),
        conn_max_idle_time: Duration::from_secs(45),
        ..Default::default()
    };
    let yaml = serde_yaml::to_string(&cfg).unwrap();
    assert!(yaml.contains("45s"), "{yaml}");
    let back: DbConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn test_load_without_file_yields_zero_pool() {
    let cfg = DbConfig::load_layered(None).unwrap();
    assert_eq!(cfg.max_idle_conns, 0);
    assert_eq!(cfg.conn_max_lifetime, Duration::ZERO);
}
