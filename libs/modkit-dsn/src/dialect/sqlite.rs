//! SQLite file DSN.
//!
//! `sqlite3:///abs/app.db` keeps the leading slash of the path. A host other
//! than `localhost` is read as the start of a relative path, so
//! `sqlite3://./rel/app.db` becomes `./rel/app.db`. The raw query is passed
//! through untouched.

use super::Translate;
use crate::conn_url::ConnectionSpec;
use crate::Result;

pub(super) struct SqliteTranslator;

impl Translate for SqliteTranslator {
    fn translate(&self, spec: &ConnectionSpec) -> Result<String> {
        let host = spec.host();
        let mut dsn = if !host.is_empty() && host != "localhost" {
            format!("{host}{}", spec.path())
        } else {
            spec.path().to_string()
        };

        if let Some(raw) = spec.raw_query() {
            dsn.push('?');
            dsn.push_str(raw);
        }
        Ok(dsn)
    }
}
