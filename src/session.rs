use std::collections::BTreeMap;

use crate::digest;
use crate::error::Error;
use crate::location::{Credentials, LocationInput, ServerLocation};
use crate::options::{SessionOptions, UserAgentIdentity};

pub const RETS_UA_AUTHORIZATION: &str = "RETS-UA-Authorization";
pub const RETS_VERSION: &str = "RETS-Version";
pub const USER_AGENT: &str = "User-Agent";

/// Capability name of the login transaction.
pub const LOGIN: &str = "Login";

/// Headers sent with the RETS login request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headers {
    ua_authorization: String,
    version: String,
    user_agent: String,
}

impl Headers {
    /// Derives the login headers for `identity`.
    ///
    /// Pure; call again to regenerate headers after an identity change.
    #[must_use]
    pub fn for_identity(identity: &UserAgentIdentity) -> Self {
        Self {
            ua_authorization: digest::ua_authorization(identity),
            version: identity.version().to_owned(),
            user_agent: identity.user_agent().to_owned(),
        }
    }

    #[must_use]
    pub fn ua_authorization(&self) -> &str {
        &self.ua_authorization
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Looks up a header by name, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// All `(name, value)` pairs, always exactly three.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (RETS_UA_AUTHORIZATION, self.ua_authorization.as_str()),
            (RETS_VERSION, self.version.as_str()),
            (USER_AGENT, self.user_agent.as_str()),
        ]
        .into_iter()
    }

    /// Converts to an [`http::HeaderMap`] for the transport layer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if a value contains bytes not allowed
    /// in an HTTP header, such as a newline in a configured user agent.
    #[cfg(feature = "http")]
    pub fn to_header_map(&self) -> Result<http::HeaderMap, Error> {
        let mut map = http::HeaderMap::with_capacity(3);
        for (name, value) in self.iter() {
            let value = http::HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader {
                name,
                reason: e.to_string(),
            })?;
            let key = http::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::InvalidHeader {
                    name,
                    reason: e.to_string(),
                }
            })?;
            map.insert(key, value);
        }
        Ok(map)
    }
}

/// Capability URLs known for a session, keyed by transaction name.
///
/// Always contains [`LOGIN`]. Further entries are added once the login
/// response has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    urls: BTreeMap<String, String>,
}

impl Capabilities {
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            urls: BTreeMap::from([(LOGIN.to_owned(), login.into())]),
        }
    }

    /// Adds or replaces a capability. The `Login` entry can be replaced but
    /// never removed.
    #[must_use]
    pub fn with_capability(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.urls.insert(name.into(), url.into());
        self
    }

    #[must_use]
    pub fn login(&self) -> &str {
        self.urls.get(LOGIN).map_or("", String::as_str)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.urls.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.urls.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Always `false`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Everything needed to send a RETS login request.
///
/// Built once per login attempt and never mutated.
///
/// ```rust,ignore
/// use rets_session::{SessionConfig, SessionOptions};
///
/// let session = SessionConfig::new("https://rets.example.com/login", SessionOptions::new())?;
/// let request = http_client
///     .get(session.capabilities().login())
///     .headers(session.headers().to_header_map()?);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    identity: UserAgentIdentity,
    credentials: Option<Credentials>,
    location: ServerLocation,
    headers: Headers,
    capabilities: Capabilities,
}

impl SessionConfig {
    /// Builds a session configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLocation`] if `location` cannot be resolved to
    /// an absolute URL.
    pub fn new(
        location: impl Into<LocationInput>,
        options: SessionOptions,
    ) -> Result<Self, Error> {
        let location = ServerLocation::resolve(location.into())?;
        let identity = UserAgentIdentity::resolve(&options);
        let credentials = location.credentials();
        let headers = Headers::for_identity(&identity);
        let capabilities = Capabilities::new(location.login_url());

        tracing::debug!(
            login = %capabilities.login(),
            user_agent = %identity.user_agent(),
            has_credentials = credentials.is_some(),
            "RETS session configured"
        );

        Ok(Self {
            identity,
            credentials,
            location,
            headers,
            capabilities,
        })
    }

    /// Builds a session configuration with default options.
    ///
    /// # Errors
    ///
    /// See [`SessionConfig::new`].
    pub fn from_location(location: impl Into<LocationInput>) -> Result<Self, Error> {
        Self::new(location, SessionOptions::default())
    }

    #[must_use]
    pub fn identity(&self) -> &UserAgentIdentity {
        &self.identity
    }

    /// Credentials embedded in the server URL, for the transport's own
    /// HTTP authentication.
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    #[must_use]
    pub fn location(&self) -> &ServerLocation {
        &self.location
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[must_use]
    pub fn version(&self) -> &str {
        self.identity.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationParts;

    const URL: &str = "https://alice:s3cr3t:extra@rets.example.com:6103/rets/login?q=1#frag";

    #[test]
    fn test_default_session() {
        let session = SessionConfig::from_location("http://rets.example.com/login").unwrap();

        assert_eq!(
            session.headers().ua_authorization(),
            "Digest 953145fba2e1945ead64a5c27334d474"
        );
        assert_eq!(session.headers().version(), "RETS/1.7.2");
        assert_eq!(session.headers().user_agent(), "RETS-Connector1/2");
        assert_eq!(session.version(), "RETS/1.7.2");
        assert!(session.credentials().is_none());
    }

    #[test]
    fn test_headers_have_exactly_three_keys() {
        let session = SessionConfig::new(URL, SessionOptions::new().with_user_agent("X/1")).unwrap();
        let names: Vec<_> = session.headers().iter().map(|(name, _)| name).collect();

        assert_eq!(names, ["RETS-UA-Authorization", "RETS-Version", "User-Agent"]);
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let session = SessionConfig::from_location(URL).unwrap();

        assert_eq!(session.headers().get("user-agent"), Some("RETS-Connector1/2"));
        assert_eq!(session.headers().get("RETS-VERSION"), Some("RETS/1.7.2"));
        assert_eq!(session.headers().get("Authorization"), None);
    }

    #[test]
    fn test_login_capability() {
        let session = SessionConfig::from_location(URL).unwrap();

        assert_eq!(
            session.capabilities().login(),
            "https://rets.example.com:6103/rets/login"
        );
        assert_eq!(session.capabilities().len(), 1);
    }

    #[test]
    fn test_login_capability_from_parts() {
        let parts = LocationParts::new("http:", "rets.example.com", "/Login.asmx/Login")
            .with_auth("bob:pw");
        let session = SessionConfig::from_location(parts).unwrap();

        assert_eq!(
            session.capabilities().login(),
            "http://rets.example.com/Login.asmx/Login"
        );
        assert_eq!(session.credentials().unwrap().username(), "bob");
    }

    #[test]
    fn test_credentials_from_url() {
        let session = SessionConfig::from_location(URL).unwrap();
        let creds = session.credentials().unwrap();

        assert_eq!(creds.username(), "alice");
        assert_eq!(creds.password(), "s3cr3t:extra");
    }

    #[test]
    fn test_user_agent_options_reach_headers() {
        let options = SessionOptions::new()
            .with_user_agent("MyAgent/1.0")
            .with_user_agent_password("s3cret");
        let session = SessionConfig::new(URL, options).unwrap();

        assert_eq!(session.headers().user_agent(), "MyAgent/1.0");
        assert_eq!(
            session.headers().ua_authorization(),
            "Digest d8cff17eb84632af7be447a8564fa9f1"
        );
    }

    #[test]
    fn test_repeated_construction_is_stable() {
        let a = SessionConfig::from_location(URL).unwrap();
        let b = SessionConfig::from_location(URL).unwrap();

        assert_eq!(a.headers(), b.headers());
        assert_eq!(a.capabilities(), b.capabilities());
    }

    #[test]
    fn test_headers_regenerate_for_new_identity() {
        let session = SessionConfig::from_location(URL).unwrap();
        let identity =
            UserAgentIdentity::resolve(&SessionOptions::new().with_user_agent("Other/2"));
        let regenerated = Headers::for_identity(&identity);

        assert_ne!(regenerated.ua_authorization(), session.headers().ua_authorization());
        assert_eq!(Headers::for_identity(session.identity()), *session.headers());
    }

    #[test]
    fn test_invalid_location() {
        let err = SessionConfig::from_location("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidLocation(_)));
    }

    #[test]
    fn test_invalid_json_location() {
        let err = LocationInput::try_from(serde_json::json!(7)).unwrap_err();
        assert!(matches!(err, Error::InvalidLocation(_)));
    }

    #[test]
    fn test_extra_capabilities_keep_login() {
        let caps = SessionConfig::from_location(URL)
            .unwrap()
            .capabilities()
            .clone()
            .with_capability("Search", "https://rets.example.com:6103/rets/search");

        assert_eq!(caps.len(), 2);
        assert_eq!(caps.login(), "https://rets.example.com:6103/rets/login");
        assert_eq!(
            caps.get("Search"),
            Some("https://rets.example.com:6103/rets/search")
        );
        assert!(!caps.is_empty());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_to_header_map() {
        let map = SessionConfig::from_location(URL)
            .unwrap()
            .headers()
            .to_header_map()
            .unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map["rets-version"], "RETS/1.7.2");
        assert_eq!(map["user-agent"], "RETS-Connector1/2");
        assert_eq!(
            map["rets-ua-authorization"],
            "Digest 953145fba2e1945ead64a5c27334d474"
        );
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_to_header_map_keeps_each_name() {
        let headers = SessionConfig::from_location(URL).unwrap().headers().clone();
        let map = headers.to_header_map().unwrap();

        for (name, value) in headers.iter() {
            let key = http::HeaderName::from_bytes(name.as_bytes()).unwrap();
            assert_eq!(map.get_all(&key).iter().count(), 1, "{name}");
            assert_eq!(map[&key], value, "{name}");
        }
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_to_header_map_rejects_newlines() {
        let identity =
            UserAgentIdentity::resolve(&SessionOptions::new().with_user_agent("Bad\r\nAgent"));
        let err = Headers::for_identity(&identity).to_header_map().unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidHeader {
                name: USER_AGENT,
                ..
            }
        ));
    }
}
