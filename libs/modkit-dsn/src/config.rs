//! Database configuration types.
//!
//! [`DbConfig`] is what callers hand to [`crate::open`]: the connection URL
//! plus the four pool limits. It deserializes from any Figment source; keys
//! are snake_case with camelCase aliases (`connMaxIdleTime`, `maxOpenConns`, ...).
//!
//! # Zero values
//!
//! | Field | Zero means |
//! |-------|------------|
//! | `conn_max_idle_time` | idle connections are never reaped |
//! | `conn_max_lifetime` | connections are reused forever |
//! | `max_open_conns` | the default cap of [`DEFAULT_MAX_OPEN_CONNS`] |
//! | `max_idle_conns` | no idle ceiling (same as any other value) |
//!
//! `max_idle_conns` is kept on [`PoolConfig`] but not applied: sqlx pools
//! have no idle-connection ceiling, only a floor that is filled eagerly.
//! Idle connections are closed once `conn_max_idle_time` elapses.
//!
//! # Layered loading
//!
//! [`DbConfig::load_layered`] merges defaults, an optional YAML file with a
//! `database:` section, then `DB__*` environment variables
//! (`DB__URL`, `DB__MAX_OPEN_CONNS`, ...).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::value::Dict;
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::dialect::REDACTED;
use crate::Result;

/// Open-connection cap used when `max_open_conns` is zero.
pub const DEFAULT_MAX_OPEN_CONNS: u32 = 10;

/// Figment key holding the database section.
pub const CONFIG_SECTION: &str = "database";

/// Pool limits applied to a freshly opened handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolConfig {
    pub conn_max_idle_time: Duration,
    pub conn_max_lifetime: Duration,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
}

impl PoolConfig {
    pub(crate) fn effective_max_open(&self) -> u32 {
        match self.max_open_conns {
            0 => DEFAULT_MAX_OPEN_CONNS,
            n => n,
        }
    }

    pub(crate) fn idle_timeout(&self) -> Option<Duration> {
        Some(self.conn_max_idle_time).filter(|d| !d.is_zero())
    }

    pub(crate) fn max_lifetime(&self) -> Option<Duration> {
        Some(self.conn_max_lifetime).filter(|d| !d.is_zero())
    }
}

/// Connection URL plus pool limits.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    #[serde(default)]
    pub url: String,
    #[serde(with = "humantime_serde", default, alias = "connMaxIdleTime")]
    pub conn_max_idle_time: Duration,
    #[serde(with = "humantime_serde", default, alias = "connMaxLifetime")]
    pub conn_max_lifetime: Duration,
    #[serde(default, alias = "maxOpenConns")]
    pub max_open_conns: u32,
    #[serde(default, alias = "maxIdleConns")]
    pub max_idle_conns: u32,
}

impl DbConfig {
    /// Pool limits as one record.
    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            conn_max_idle_time: self.conn_max_idle_time,
            conn_max_lifetime: self.conn_max_lifetime,
            max_open_conns: self.max_open_conns,
            max_idle_conns: self.max_idle_conns,
        }
    }

    /// Extract the `database` section of `figment`.
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        Ok(figment.extract_inner(CONFIG_SECTION)?)
    }

    /// Defaults, then the YAML file if given, then `DB__*` env vars.
    ///
    /// Unset fields keep their zero value. A field given under both its
    /// snake_case and camelCase name is rejected as a duplicate.
    pub fn load_layered(path: Option<&Path>) -> Result<Self> {
        // empty section so a missing file and env still yield defaults
        let mut figment = Figment::new().merge(Serialized::default(CONFIG_SECTION, Dict::new()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        // Example: DB__MAX_OPEN_CONNS=20 maps to database.max_open_conns
        figment = figment.merge(
            Env::prefixed("DB__")
                .map(|key| format!("{CONFIG_SECTION}.{}", key.as_str().replace("__", ".")).into()),
        );

        Self::from_figment(&figment)
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &redact_url(&self.url))
            .field("conn_max_idle_time", &self.conn_max_idle_time)
            .field("conn_max_lifetime", &self.conn_max_lifetime)
            .field("max_open_conns", &self.max_open_conns)
            .field("max_idle_conns", &self.max_idle_conns)
            .finish()
    }
}

/// URL with any password replaced; unparsable input is hidden entirely.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                // only fails for cannot-be-a-base URLs, which carry no password
                let _ = url.set_password(Some(REDACTED));
            }
            url.to_string()
        }
        Err(_) => "<unparsable url>".to_string(),
    }
}
