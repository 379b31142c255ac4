#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid server location: {0}")]
    InvalidLocation(String),
    #[cfg(feature = "http")]
    #[error("Invalid header value for {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },
    #[error("Configuration error: {0}")]
    Config(String),
}
