//! MySQL / MariaDB `user:pass@tcp(host:port)/db?params` DSN.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::Translate;
use crate::conn_url::ConnectionSpec;
use crate::Result;

pub(super) const DEFAULT_PORT: u16 = 3306;

/// Parameters applied when the URL leaves them unset or empty.
pub(crate) const DEFAULT_PARAMS: &[(&str, &str)] = &[
    ("charset", "utf8mb4"),
    ("parseTime", "True"),
    ("loc", "Local"),
];

/// Path-segment escaping: unreserved characters plus `$&+:=@` pass through.
pub(crate) const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

pub(super) struct MySqlTranslator;

impl Translate for MySqlTranslator {
    fn translate(&self, spec: &ConnectionSpec) -> Result<String> {
        let (user, password) = spec.credentials()?;
        let port = spec.port().unwrap_or(DEFAULT_PORT);

        let host = spec.host();
        let address = if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };

        let params = spec.query().clone().with_defaults(DEFAULT_PARAMS);

        Ok(format!(
            "{}:{}@tcp({address})/{}?{}",
            utf8_percent_encode(user, PATH_SEGMENT),
            utf8_percent_encode(password, PATH_SEGMENT),
            spec.database(),
            params.encode_sorted(),
        ))
    }
}
