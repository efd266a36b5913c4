//! Connection factory.
//!
//! [`open`] takes a driver name and its native DSN, reads the DSN into typed
//! sqlx connect options and builds a lazy pool with the caller's limits.
//! Nothing touches the network here; the first acquire (or
//! [`crate::lifecycle::start`]) does.
//!
//! Known driver names: `postgres`, `mysql`, `sqlite3`, `sqlite`.

#[cfg(feature = "mysql")]
pub(crate) mod mysql;
#[cfg(feature = "pg")]
pub(crate) mod postgres;
#[cfg(feature = "sqlite")]
pub(crate) mod sqlite;

use crate::dialect::Dialect;
use crate::pool_opts::ApplyPoolOpts;
use crate::{DbError, DbHandle, DbPool, PoolConfig, Result};

/// Open a pool-configured handle for `driver` / `dsn`.
///
/// Any failure to read the DSN or build the pool is a
/// [`DbError::Connection`] naming the driver.
pub fn open(driver: &str, dsn: &str, pool: &PoolConfig) -> Result<DbHandle> {
    let dialect = Dialect::from_driver(driver).ok_or_else(|| {
        DbError::connection(
            driver,
            sqlx::Error::Configuration(format!("unknown driver `{driver}`").into()),
        )
    })?;

    let handle = match dialect {
        #[cfg(feature = "pg")]
        Dialect::Postgres => {
            let parsed = postgres::KeywordDsn::parse(dsn)
                .map_err(|e| DbError::connection(driver, e))?;
            let redacted = parsed.redacted();
            let opts = parsed
                .into_options()
                .map_err(|e| DbError::connection(driver, e))?;
            let sqlx_pool = sqlx::postgres::PgPoolOptions::new()
                .apply(pool)
                .connect_lazy_with(opts);
            DbHandle::new(dialect, driver, DbPool::Postgres(sqlx_pool), redacted, *pool)
        }
        #[cfg(feature = "mysql")]
        Dialect::MySql => {
            let parsed =
                mysql::TcpDsn::parse(dsn).map_err(|e| DbError::connection(driver, e))?;
            let redacted = parsed.redacted();
            let opts = parsed
                .into_options()
                .map_err(|e| DbError::connection(driver, e))?;
            let sqlx_pool = sqlx::mysql::MySqlPoolOptions::new()
                .apply(pool)
                .connect_lazy_with(opts);
            DbHandle::new(dialect, driver, DbPool::MySql(sqlx_pool), redacted, *pool)
        }
        #[cfg(feature = "sqlite")]
        Dialect::Sqlite => {
            let opts = sqlite::connect_options(dsn).map_err(|e| DbError::connection(driver, e))?;
            let sqlx_pool = sqlx::sqlite::SqlitePoolOptions::new()
                .apply(pool)
                .connect_lazy_with(opts);
            DbHandle::new(dialect, driver, DbPool::Sqlite(sqlx_pool), dsn.to_string(), *pool)
        }
        #[cfg(not(feature = "pg"))]
        Dialect::Postgres => return Err(DbError::FeatureDisabled("PostgreSQL feature not enabled")),
        #[cfg(not(feature = "mysql"))]
        Dialect::MySql => return Err(DbError::FeatureDisabled("MySQL feature not enabled")),
        #[cfg(not(feature = "sqlite"))]
        Dialect::Sqlite => return Err(DbError::FeatureDisabled("SQLite feature not enabled")),
    };

    tracing::debug!(
        driver,
        dsn = handle.dsn(),
        max_open = pool.max_open_conns,
        max_idle = pool.max_idle_conns,
        idle_time = ?pool.conn_max_idle_time,
        lifetime = ?pool.conn_max_lifetime,
        "opened database handle"
    );
    Ok(handle)
}

/// Shorthand for reader failures, reported the way sqlx reports bad options.
pub(crate) fn config_error(message: impl Into<String>) -> sqlx::Error {
    sqlx::Error::Configuration(message.into().into())
}

/// Boolean DSN flag (`1/0`, `true/false`, `on/off`, `yes/no`).
pub(crate) fn parse_flag(key: &str, value: &str) -> std::result::Result<bool, sqlx::Error> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(config_error(format!(
            "invalid boolean `{value}` for `{key}`"
        ))),
    }
}
