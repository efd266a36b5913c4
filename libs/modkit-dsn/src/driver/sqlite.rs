//! Reader for SQLite DSNs: a file path (optionally `file:`-prefixed) with an
//! optional `?key=value` query of open flags and PRAGMAs.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use url::form_urlencoded;

use super::{config_error, parse_flag};

const MEMORY: &str = ":memory:";

/// Build connect options for `dsn`.
///
/// Parameter names are case-insensitive; the `_`-prefixed spellings used by
/// Go drivers (`_busy_timeout`, `_journal_mode`, ...) are accepted too.
/// Unknown parameters are rejected.
pub(crate) fn connect_options(dsn: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    let (path, query) = dsn.split_once('?').unwrap_or((dsn, ""));
    let path = path.strip_prefix("file:").unwrap_or(path);

    let params: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
        .collect();

    let anonymous = path.is_empty() || path == MEMORY;
    let named_memory = params
        .iter()
        .any(|(k, v)| k.trim_start_matches('_') == "mode" && v.eq_ignore_ascii_case("memory"));

    let mut opts = if anonymous {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else if named_memory {
        // the name identifies the shared-cache database across connections
        SqliteConnectOptions::from_str(&format!("sqlite:{path}?mode=memory"))?
    } else {
        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
    };

    for (key, value) in &params {
        match key.trim_start_matches('_') {
            "mode" => {
                opts = match value.to_ascii_lowercase().as_str() {
                    "ro" => opts.read_only(true).create_if_missing(false),
                    "rw" => opts.read_only(false).create_if_missing(false),
                    "rwc" => opts.read_only(false).create_if_missing(true),
                    "memory" => opts,
                    _ => return Err(config_error(format!("invalid SQLite mode `{value}`"))),
                }
            }
            "cache" => {
                opts = match value.to_ascii_lowercase().as_str() {
                    "shared" => opts.shared_cache(true),
                    "private" => opts.shared_cache(false),
                    _ => return Err(config_error(format!("invalid SQLite cache `{value}`"))),
                }
            }
            "immutable" => opts = opts.immutable(parse_flag(key, value)?),
            "busy_timeout" => {
                let ms = value
                    .parse::<u64>()
                    .map_err(|_| config_error(format!("invalid busy_timeout `{value}`")))?;
                opts = opts.busy_timeout(Duration::from_millis(ms));
            }
            "journal_mode" => opts = opts.journal_mode(SqliteJournalMode::from_str(value)?),
            // legacy toggle
            "wal" => {
                let mode = if parse_flag(key, value)? {
                    SqliteJournalMode::Wal
                } else {
                    SqliteJournalMode::Delete
                };
                opts = opts.journal_mode(mode);
            }
            "synchronous" => opts = opts.synchronous(SqliteSynchronous::from_str(value)?),
            "foreign_keys" | "fk" => opts = opts.foreign_keys(parse_flag(key, value)?),
            _ => {
                return Err(config_error(format!(
                    "unsupported SQLite DSN parameter `{key}`"
                )))
            }
        }
    }

    Ok(opts)
}
