#![doc = include_str!("../README.md")]

pub mod digest;
pub mod error;
pub mod location;
pub mod options;
pub mod session;

// Re-exports for convenient access
pub use digest::{authorization_token, ua_authorization};
pub use error::Error;
pub use location::{Credentials, LocationInput, LocationParts, ServerLocation};
pub use options::{
    DEFAULT_USER_AGENT, DEFAULT_USER_AGENT_PASSWORD, DEFAULT_VERSION, SessionOptions,
    UserAgentIdentity,
};
pub use session::{Capabilities, Headers, SessionConfig};
