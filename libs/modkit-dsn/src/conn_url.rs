//! Parsed connection URL.
//!
//! [`ConnectionSpec`] is the structured form of the input URL before any
//! dialect-specific rendering. Userinfo, host and path are percent-decoded;
//! the raw query is kept next to the decoded pairs for dialects that pass it
//! through untouched.

use std::borrow::Cow;
use std::fmt;

use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Host, Url};

use crate::{DbError, Result};

const PASSWORD_PARAM: &str = "password";

/// Ordered multimap of query parameters.
///
/// Duplicate keys keep every value, in the order they were encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Pairs in encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Merge `defaults` under the caller's values.
    ///
    /// A default is applied only when the key is absent or its first value is
    /// empty; in that case it replaces every value of the key. Keys the
    /// caller set are never touched.
    pub fn with_defaults(mut self, defaults: &[(&str, &str)]) -> Self {
        for (key, value) in defaults {
            if self.get(key).is_some_and(|v| !v.is_empty()) {
                continue;
            }
            self.pairs.retain(|(k, _)| k != key);
            self.pairs.push(((*key).to_string(), (*value).to_string()));
        }
        self
    }

    /// Form-encode with keys in lexicographic order.
    ///
    /// Values of one key stay together and keep their relative order.
    pub fn encode_sorted(&self) -> String {
        let mut sorted: Vec<&(String, String)> = self.pairs.iter().collect();
        // stable: values of a key keep encounter order
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in sorted {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl FromIterator<(String, String)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Structured form of a connection URL.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSpec {
    scheme: String,
    username: Option<String>,
    password: Option<String>,
    host: String,
    port: Option<u16>,
    path: String,
    query: QueryParams,
    raw_query: Option<String>,
}

impl ConnectionSpec {
    /// Parse `input` as `scheme://[user[:password]@]host[:port][/path][?query]`.
    pub fn parse(input: &str) -> Result<Self> {
        // The input may carry a password, so only the parser's reason is reported.
        let url = Url::parse(input.trim()).map_err(|e| DbError::MalformedUrl(e.to_string()))?;

        let username = match url.username() {
            "" => None,
            raw => Some(decode(raw, "username")?),
        };
        let password = url
            .password()
            .map(|raw| decode(raw, "password"))
            .transpose()?;

        let host = match url.host() {
            Some(Host::Domain(domain)) => decode(domain, "host")?,
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            None => String::new(),
        };

        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        Ok(Self {
            scheme: url.scheme().to_string(),
            username,
            password,
            host,
            port: url.port(),
            path: decode(url.path(), "path")?,
            query,
            raw_query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Host without IPv6 brackets; empty when the URL has no authority.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path with exactly one leading slash removed.
    pub fn database(&self) -> &str {
        self.path.strip_prefix('/').unwrap_or(&self.path)
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Query string exactly as it appeared in the URL.
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// Username and non-empty password, or [`DbError::InvalidConfig`].
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let (user, password) = match (self.username(), self.password()) {
            (None, None) => {
                return Err(DbError::InvalidConfig(
                    "missing username and password".to_string(),
                ))
            }
            (user, password) => (user, password),
        };
        let user =
            user.ok_or_else(|| DbError::InvalidConfig("missing username".to_string()))?;
        match password {
            Some(password) if !password.is_empty() => Ok((user, password)),
            _ => Err(DbError::InvalidConfig("missing password".to_string())),
        }
    }

    /// Whether the URL carries a password in its userinfo or its query.
    pub(crate) fn has_secret(&self) -> bool {
        self.password.is_some() || self.query.contains_key(PASSWORD_PARAM)
    }

    /// Copy with every password replaced, used to render log-safe DSNs.
    ///
    /// Covers the userinfo password and `password` query pairs; the raw
    /// query is rebuilt from the redacted pairs.
    pub(crate) fn with_password(&self, password: &str) -> Self {
        let query: QueryParams = self
            .query
            .iter()
            .map(|(k, v)| {
                let v = if k == PASSWORD_PARAM { password } else { v };
                (k.to_string(), v.to_string())
            })
            .collect();
        let raw_query = match &self.raw_query {
            Some(_) if self.query.contains_key(PASSWORD_PARAM) => Some(
                form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(query.iter())
                    .finish(),
            ),
            other => other.clone(),
        };
        Self {
            password: self.password.as_ref().map(|_| password.to_string()),
            query,
            raw_query,
            ..self.clone()
        }
    }
}

impl fmt::Debug for ConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSpec")
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("path", &self.path)
            .field("query", &self.query)
            .finish()
    }
}

fn decode(raw: &str, what: &str) -> Result<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| DbError::MalformedUrl(format!("{what} is not valid UTF-8 once decoded")))
}
