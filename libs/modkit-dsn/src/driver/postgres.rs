//! Reader for PostgreSQL keyword/value DSNs.
//!
//! Grammar: pairs `key=value` separated by whitespace, optional whitespace
//! around `=`. A value is either bare (up to the next whitespace, `\` escapes
//! one character) or single-quoted, where `\x` yields `x` and `''` yields `'`.
//! This is the exact inverse of the dialect's value escaping.

use std::str::FromStr;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use super::config_error;
use crate::dialect::{escape_postgres_value, REDACTED};

/// libpq client options sqlx has no counterpart for; dropped with a warning.
const UNSUPPORTED_CLIENT_KEYS: &[&str] = &[
    "channel_binding",
    "connect_timeout",
    "fallback_application_name",
    "gssdelegation",
    "gssencmode",
    "gsslib",
    "hostaddr",
    "keepalives",
    "keepalives_count",
    "keepalives_idle",
    "keepalives_interval",
    "krbsrvname",
    "load_balance_hosts",
    "passfile",
    "replication",
    "require_auth",
    "requirepeer",
    "service",
    "ssl_max_protocol_version",
    "ssl_min_protocol_version",
    "sslcertmode",
    "sslcompression",
    "sslcrl",
    "sslcrldir",
    "sslnegotiation",
    "sslpassword",
    "sslsni",
    "target_session_attrs",
    "tcp_user_timeout",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeywordDsn {
    pairs: Vec<(String, String)>,
}

impl KeywordDsn {
    pub(crate) fn parse(dsn: &str) -> Result<Self, sqlx::Error> {
        let mut pairs = Vec::new();
        let mut chars = dsn.chars().peekable();

        loop {
            skip_whitespace(&mut chars);
            if chars.peek().is_none() {
                break;
            }

            let mut key = String::new();
            while let Some(&c) = chars.peek() {
                if c == '=' || c.is_whitespace() {
                    break;
                }
                key.push(c);
                chars.next();
            }
            skip_whitespace(&mut chars);
            if chars.next() != Some('=') {
                return Err(config_error(format!(
                    "missing `=` after `{key}` in connection string"
                )));
            }
            if key.is_empty() {
                return Err(config_error("empty key in connection string"));
            }
            skip_whitespace(&mut chars);

            let mut value = String::new();
            if chars.peek() == Some(&'\'') {
                chars.next();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(c) => value.push(c),
                            None => break,
                        },
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            value.push('\'');
                        }
                        Some('\'') => break,
                        Some(c) => value.push(c),
                        None => {
                            return Err(config_error(format!(
                                "unterminated quoted value for `{key}`"
                            )))
                        }
                    }
                }
            } else {
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    chars.next();
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            value.push(escaped);
                        }
                    } else {
                        value.push(c);
                    }
                }
            }

            pairs.push((key, value));
        }

        Ok(Self { pairs })
    }

    /// Last value of `key`, matching libpq's "later settings win".
    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Same DSN with the password value replaced.
    pub(crate) fn redacted(&self) -> String {
        self.pairs()
            .map(|(key, value)| {
                let value = if key == "password" { REDACTED } else { value };
                format!("{key}={}", escape_postgres_value(value))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub(crate) fn into_options(self) -> Result<PgConnectOptions, sqlx::Error> {
        let mut opts = PgConnectOptions::new_without_pgpass();
        let mut runtime_params: Vec<(String, String)> = Vec::new();

        for (key, value) in self.pairs {
            match key.as_str() {
                "host" if !value.is_empty() => opts = opts.host(&value),
                "host" => {}
                "port" => {
                    let port = value
                        .parse::<u16>()
                        .map_err(|_| config_error(format!("invalid port `{value}`")))?;
                    opts = opts.port(port);
                }
                "user" => opts = opts.username(&value),
                "password" => opts = opts.password(&value),
                "dbname" if !value.is_empty() => opts = opts.database(&value),
                "dbname" => {}
                "sslmode" => opts = opts.ssl_mode(PgSslMode::from_str(&value)?),
                "sslrootcert" => opts = opts.ssl_root_cert(value.as_str()),
                "sslcert" => opts = opts.ssl_client_cert(value.as_str()),
                "sslkey" => opts = opts.ssl_client_key(value.as_str()),
                "options" => runtime_params.extend(parse_command_line_options(&value)?),
                "application_name" => opts = opts.application_name(&value),
                "statement_cache_capacity" => {
                    let capacity = value.parse::<usize>().map_err(|_| {
                        config_error(format!("invalid statement_cache_capacity `{value}`"))
                    })?;
                    opts = opts.statement_cache_capacity(capacity);
                }
                k if UNSUPPORTED_CLIENT_KEYS.contains(&k) => {
                    tracing::warn!(key = k, "PostgreSQL client option not supported by sqlx, ignoring");
                }
                _ => runtime_params.push((key, value)),
            }
        }

        if !runtime_params.is_empty() {
            tracing::debug!(
                params = ?runtime_params.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
                "forwarding PostgreSQL runtime parameters"
            );
            opts = opts.options(runtime_params);
        }
        Ok(opts)
    }
}

/// Reads libpq's `options` value (`-c key=value`, `-ckey=value` or
/// `--key=value`, whitespace separated) into runtime parameters.
fn parse_command_line_options(raw: &str) -> Result<Vec<(String, String)>, sqlx::Error> {
    let mut params = Vec::new();
    let mut words = raw.split_whitespace();
    while let Some(word) = words.next() {
        let setting = if word == "-c" {
            words
                .next()
                .ok_or_else(|| config_error("`-c` without a setting in `options`"))?
        } else if let Some(rest) = word.strip_prefix("-c").or_else(|| word.strip_prefix("--")) {
            rest
        } else {
            return Err(config_error(format!("unsupported switch `{word}` in `options`")));
        };
        let (key, value) = setting
            .split_once('=')
            .ok_or_else(|| config_error(format!("expected key=value in `options`, got `{setting}`")))?;
        params.push((key.to_string(), value.to_string()));
    }
    Ok(params)
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}
