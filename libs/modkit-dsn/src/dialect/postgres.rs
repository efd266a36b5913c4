//! PostgreSQL keyword/value DSN.

use std::borrow::Cow;

use super::Translate;
use crate::conn_url::ConnectionSpec;
use crate::Result;

pub(super) const DEFAULT_PORT: u16 = 5432;

pub(super) struct PostgresTranslator;

impl Translate for PostgresTranslator {
    fn translate(&self, spec: &ConnectionSpec) -> Result<String> {
        let (user, password) = spec.credentials()?;
        let port = spec.port().unwrap_or(DEFAULT_PORT).to_string();

        let fixed = [
            ("host", spec.host()),
            ("port", port.as_str()),
            ("user", user),
            ("password", password),
            ("dbname", spec.database()),
        ];

        let dsn = fixed
            .into_iter()
            .chain(spec.query().iter())
            .map(|(key, value)| format!("{key}={}", escape_value(value)))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(dsn)
    }
}

/// Quote a keyword/value DSN value when it needs it.
///
/// Values with whitespace, `'` or `\` are wrapped in single quotes with
/// backslashes doubled first and single quotes doubled second. Empty values
/// become `''` so the next pair is not read as the value.
pub(crate) fn escape_value(value: &str) -> Cow<'_, str> {
    if value.is_empty() {
        return Cow::Borrowed("''");
    }
    if !value.chars().any(needs_quoting) {
        return Cow::Borrowed(value);
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "''");
    Cow::Owned(format!("'{escaped}'"))
}

fn needs_quoting(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C' | '\'' | '\\')
}
