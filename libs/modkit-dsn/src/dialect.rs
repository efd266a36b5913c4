//! Dialect resolution and DSN rendering.
//!
//! The scheme of a [`ConnectionSpec`] selects one [`Dialect`]; each dialect
//! owns a [`Translate`] implementation that renders the driver-native DSN.

mod mysql;
mod postgres;
mod sqlite;

use std::fmt;

use crate::conn_url::ConnectionSpec;
use crate::{DbError, Result};

pub(crate) use mysql::PATH_SEGMENT as MYSQL_PATH_SEGMENT;
pub(crate) use postgres::escape_value as escape_postgres_value;

/// Placeholder that replaces passwords in log-safe renderings.
pub const REDACTED: &str = "redacted";

/// Uniform "parsed URL to DSN" capability implemented once per dialect.
pub(crate) trait Translate {
    fn translate(&self, spec: &ConnectionSpec) -> Result<String>;
}

/// Supported dialects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Resolve a URL scheme.
    ///
    /// Accepted aliases: `postgres`/`postgresql`, `mysql`/`mariadb`,
    /// `sqlite3`/`sqlite`.
    pub fn from_scheme(scheme: &str) -> Result<Self> {
        match scheme {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite3" | "sqlite" => Ok(Dialect::Sqlite),
            other => Err(DbError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Resolve the driver name the connection factory receives.
    pub fn from_driver(driver: &str) -> Option<Self> {
        match driver {
            "postgres" => Some(Dialect::Postgres),
            "mysql" => Some(Dialect::MySql),
            "sqlite3" | "sqlite" => Some(Dialect::Sqlite),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Port used when the URL does not carry one.
    pub fn default_port(self) -> Option<u16> {
        match self {
            Dialect::Postgres => Some(postgres::DEFAULT_PORT),
            Dialect::MySql => Some(mysql::DEFAULT_PORT),
            Dialect::Sqlite => None,
        }
    }

    /// Driver name for a URL of this dialect.
    ///
    /// SQLite keeps the literal scheme, so `sqlite3` and `sqlite` open through
    /// different driver names.
    pub fn driver_name(self, scheme: &str) -> &str {
        match self {
            Dialect::Sqlite => scheme,
            other => other.name(),
        }
    }

    /// Render the DSN for `spec`.
    pub fn translate(self, spec: &ConnectionSpec) -> Result<String> {
        self.translator().translate(spec)
    }

    fn translator(self) -> &'static dyn Translate {
        match self {
            Dialect::Postgres => &postgres::PostgresTranslator,
            Dialect::MySql => &mysql::MySqlTranslator,
            Dialect::Sqlite => &sqlite::SqliteTranslator,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of translating one URL: dialect, driver name and DSN.
///
/// `Display` and `Debug` only ever show the redacted DSN.
#[derive(Clone, PartialEq, Eq)]
pub struct DataSource {
    dialect: Dialect,
    driver: String,
    dsn: String,
    redacted: String,
}

impl DataSource {
    pub fn from_url(url: &str) -> Result<Self> {
        let spec = ConnectionSpec::parse(url)?;
        Self::from_spec(&spec)
    }

    pub fn from_spec(spec: &ConnectionSpec) -> Result<Self> {
        let dialect = Dialect::from_scheme(spec.scheme())?;
        let dsn = dialect.translate(spec)?;
        let redacted = if spec.has_secret() {
            dialect.translate(&spec.with_password(REDACTED))?
        } else {
            dsn.clone()
        };
        let driver = dialect.driver_name(spec.scheme()).to_string();

        tracing::debug!(%dialect, %driver, dsn = %redacted, "translated connection url");

        Ok(Self {
            dialect,
            driver,
            dsn,
            redacted,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    /// Full DSN including credentials.
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    /// DSN with the password replaced by [`REDACTED`].
    pub fn redacted(&self) -> &str {
        &self.redacted
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.driver, self.redacted)
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("dialect", &self.dialect)
            .field("driver", &self.driver)
            .field("dsn", &self.redacted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_resolution() {
        assert_eq!(Dialect::from_scheme("postgres").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_scheme("postgresql").unwrap(), Dialect::Postgres);
        assert_eq!(Dialect::from_scheme("mysql").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::from_scheme("mariadb").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::from_scheme("sqlite3").unwrap(), Dialect::Sqlite);
        assert_eq!(Dialect::from_scheme("sqlite").unwrap(), Dialect::Sqlite);

        for scheme in ["mssql", "http", "postgres+unix", ""] {
            assert!(matches!(
                Dialect::from_scheme(scheme),
                Err(DbError::UnsupportedScheme(s)) if s == scheme
            ));
        }
    }

    #[test]
    fn test_driver_names() {
        assert_eq!(Dialect::Postgres.driver_name("postgresql"), "postgres");
        assert_eq!(Dialect::MySql.driver_name("mariadb"), "mysql");
        assert_eq!(Dialect::Sqlite.driver_name("sqlite3"), "sqlite3");
        assert_eq!(Dialect::Sqlite.driver_name("sqlite"), "sqlite");

        assert_eq!(Dialect::from_driver("sqlite3"), Some(Dialect::Sqlite));
        assert_eq!(Dialect::from_driver("postgresql"), None);
    }

    #[test]
    fn test_default_ports() {
        assert_eq!(Dialect::Postgres.default_port(), Some(5432));
        assert_eq!(Dialect::MySql.default_port(), Some(3306));
        assert_eq!(Dialect::Sqlite.default_port(), None);
    }

    #[test]
    fn test_data_source_redacts_password() {
        let source = DataSource::from_url("postgres://app:hunter2@db/app").unwrap();
        assert!(source.dsn().contains("password=hunter2"));
        assert!(source.redacted().contains("password=redacted"));
        assert!(!source.to_string().contains("hunter2"));
        assert!(!format!("{source:?}").contains("hunter2"));
    }

    #[test]
    fn test_data_source_redacts_password_query_param() {
        let source = DataSource::from_url("postgres://u:p@h/d?password=secret&sslmode=disable").unwrap();
        assert!(source.dsn().contains("password=secret"));
        assert!(!source.redacted().contains("secret"), "{}", source.redacted());
        assert!(!source.to_string().contains("secret"));
        assert!(source.redacted().contains("sslmode=disable"));
    }

    #[test]
    fn test_data_source_sqlite_keeps_scheme_as_driver() {
        let source = DataSource::from_url("sqlite:///tmp/app.db").unwrap();
        assert_eq!(source.driver(), "sqlite");
        assert_eq!(source.dialect(), Dialect::Sqlite);
        assert_eq!(source.redacted(), source.dsn());
    }
}
