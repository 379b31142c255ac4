use std::borrow::Cow;
use std::fmt;

use serde::Deserialize;
use serde_json::Value as JsonValue;
use url::Url;

use crate::error::Error;

/// Already-parsed server location.
///
/// `scheme` may be given with or without the trailing colon (`"http"` or
/// `"http:"`). `host` includes the port when one is needed. `auth` is the raw
/// `user:pass` segment, if any.
///
/// Deserializes from JSON objects using either these names or the
/// `protocol`/`pathname` spellings. Missing fields are empty, and an `auth`
/// value that is not a string counts as no auth.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct LocationParts {
    #[serde(default, alias = "protocol")]
    pub scheme: String,
    #[serde(default)]
    pub host: String,
    #[serde(default, alias = "pathname")]
    pub path: String,
    #[serde(default, deserialize_with = "string_or_none")]
    pub auth: Option<String>,
}

fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(auth) => Ok(Some(auth)),
        _ => Ok(None),
    }
}

impl LocationParts {
    #[must_use]
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            path: path.into(),
            auth: None,
        }
    }

    /// Set the embedded `user:pass` segment.
    #[must_use]
    pub fn with_auth(mut self, auth: impl Into<String>) -> Self {
        self.auth = Some(auth.into());
        self
    }
}

impl fmt::Debug for LocationParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationParts")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl From<&Url> for LocationParts {
    fn from(url: &Url) -> Self {
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_owned(),
            (None, _) => String::new(),
        };

        Self {
            scheme: url.scheme().to_owned(),
            host,
            path: url.path().to_owned(),
            auth: userinfo(url),
        }
    }
}

/// Rebuilds the decoded `user[:pass]` segment of a parsed URL.
fn userinfo(url: &Url) -> Option<String> {
    let username = percent_decode(url.username());
    match url.password() {
        Some(password) => Some(format!("{username}:{}", percent_decode(password))),
        None if username.is_empty() => None,
        None => Some(username.into_owned()),
    }
}

fn percent_decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Server location as handed to [`SessionConfig::new`](crate::SessionConfig::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationInput {
    /// URL string, parsed with [`url::Url`].
    Text(String),
    /// Pre-parsed URL fields.
    Parts(LocationParts),
}

impl From<&str> for LocationInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for LocationInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<LocationParts> for LocationInput {
    fn from(parts: LocationParts) -> Self {
        Self::Parts(parts)
    }
}

impl From<&Url> for LocationInput {
    fn from(url: &Url) -> Self {
        Self::Parts(LocationParts::from(url))
    }
}

impl From<Url> for LocationInput {
    fn from(url: Url) -> Self {
        Self::from(&url)
    }
}

impl TryFrom<JsonValue> for LocationInput {
    type Error = Error;

    /// Accepts a JSON string or object. Every other JSON type is rejected.
    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::String(text) => Ok(Self::Text(text)),
            JsonValue::Object(map) => serde_json::from_value(JsonValue::Object(map))
                .map(Self::Parts)
                .map_err(|e| Error::InvalidLocation(e.to_string())),
            other => Err(Error::InvalidLocation(format!(
                "expected a URL string or object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Canonical server location every session is built from.
#[derive(Clone, PartialEq, Eq)]
pub struct ServerLocation {
    scheme: String,
    host: String,
    path: String,
    auth: Option<String>,
}

impl ServerLocation {
    /// Normalizes either input form into a `ServerLocation`.
    ///
    /// Strings must parse as absolute URLs; structured input is taken as-is
    /// apart from the scheme colon. An empty scheme stays empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLocation`] if a string input is not an
    /// absolute URL.
    pub fn resolve(input: LocationInput) -> Result<Self, Error> {
        let parts = match input {
            LocationInput::Text(text) => {
                // the message must not echo the input, it may carry a password
                let url = Url::parse(text.trim())
                    .map_err(|e| Error::InvalidLocation(e.to_string()))?;
                LocationParts::from(&url)
            }
            LocationInput::Parts(parts) => parts,
        };

        Ok(Self {
            scheme: normalize_scheme(&parts.scheme),
            host: parts.host,
            path: parts.path,
            auth: parts.auth,
        })
    }

    /// Scheme with its trailing colon, e.g. `"https:"`, or empty when the
    /// structured input had none.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host plus explicit port. Default ports (`:80` for http, `:443` for
    /// https) are dropped from string input.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `scheme//host/path`, without auth, query or fragment.
    #[must_use]
    pub fn login_url(&self) -> String {
        format!("{}//{}{}", self.scheme, self.host, self.path)
    }

    /// Credentials from the embedded auth segment.
    ///
    /// `None` unless the segment exists and contains a `:`.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.auth.as_deref().and_then(Credentials::from_auth)
    }
}

fn normalize_scheme(scheme: &str) -> String {
    match scheme.trim_end_matches(':') {
        "" => String::new(),
        name => format!("{name}:"),
    }
}

impl fmt::Debug for ServerLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerLocation")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("path", &self.path)
            .field("auth", &self.auth.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// HTTP credentials embedded in the server URL.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Splits a `user:pass` segment on its first colon.
    ///
    /// Returns `None` when the segment has no colon.
    #[must_use]
    pub fn from_auth(auth: &str) -> Option<Self> {
        let (username, password) = auth.split_once(':')?;
        Some(Self::new(username, password))
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
