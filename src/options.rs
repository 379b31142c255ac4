use serde::Deserialize;

use crate::error::Error;

/// User agent sent when the caller does not configure one.
pub const DEFAULT_USER_AGENT: &str = "RETS-Connector1/2";

/// User agent password used when the caller does not configure one.
pub const DEFAULT_USER_AGENT_PASSWORD: &str = "";

/// RETS protocol version spoken on login.
pub const DEFAULT_VERSION: &str = "RETS/1.7.2";

/// Caller-supplied session options.
///
/// Every field is optional; unset fields fall back to the defaults above when
/// the session is built. Deserializes from `{"userAgent": .., "userAgentPassword": ..}`.
///
/// ```rust,ignore
/// use rets_session::SessionOptions;
///
/// let options = SessionOptions::new()
///     .with_user_agent("MyClient/1.0")
///     .with_user_agent_password("ua-secret");
/// ```
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct SessionOptions {
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub user_agent_password: Option<String>,
}

impl SessionOptions {
    /// Options with nothing set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options from environment variables.
    ///
    /// # Optional env vars
    /// - `RETS_USER_AGENT`: user agent to present
    /// - `RETS_USER_AGENT_PASSWORD`: password shared with the RETS server for the UA digest
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but not valid unicode.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => {
                Err(Error::Config(format!("{key} is not valid unicode")))
            }
        })
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by `lookup`.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self, Error>
    where
        F: FnMut(&'static str) -> Result<Option<String>, Error>,
    {
        Ok(Self {
            user_agent: lookup("RETS_USER_AGENT")?,
            user_agent_password: lookup("RETS_USER_AGENT_PASSWORD")?,
        })
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub fn with_user_agent_password(mut self, password: impl Into<String>) -> Self {
        self.user_agent_password = Some(password.into());
        self
    }
}

impl std::fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("user_agent", &self.user_agent)
            .field(
                "user_agent_password",
                &self.user_agent_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Resolved user agent identity of one session.
#[derive(Clone, PartialEq, Eq)]
pub struct UserAgentIdentity {
    user_agent: String,
    user_agent_password: String,
    version: String,
}

impl UserAgentIdentity {
    /// Merges `options` over the defaults. Caller values win.
    ///
    /// An empty user agent is replaced by [`DEFAULT_USER_AGENT`]; the version is
    /// always [`DEFAULT_VERSION`].
    #[must_use]
    pub fn resolve(options: &SessionOptions) -> Self {
        let user_agent = match options.user_agent.as_deref() {
            Some("") => {
                tracing::warn!(
                    default = DEFAULT_USER_AGENT,
                    "Empty user agent configured, using default"
                );
                DEFAULT_USER_AGENT.to_owned()
            }
            Some(ua) => ua.to_owned(),
            None => DEFAULT_USER_AGENT.to_owned(),
        };

        Self {
            user_agent,
            user_agent_password: options
                .user_agent_password
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT_PASSWORD.to_owned()),
            version: DEFAULT_VERSION.to_owned(),
        }
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn user_agent_password(&self) -> &str {
        &self.user_agent_password
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Default for UserAgentIdentity {
    fn default() -> Self {
        Self::resolve(&SessionOptions::default())
    }
}

impl std::fmt::Debug for UserAgentIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAgentIdentity")
            .field("user_agent", &self.user_agent)
            .field("user_agent_password", &"<redacted>")
            .field("version", &self.version)
            .finish()
    }
}
