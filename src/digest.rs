use md5::{Digest, Md5};

use crate::options::UserAgentIdentity;

/// Lowercase hex MD5 of `input`.
#[must_use]
pub fn md5_hex(input: &str) -> String {
    hex::encode(Md5::digest(input.as_bytes()))
}

/// Computes the RETS user agent digest token.
///
/// `token = MD5(MD5(trim(ua ":" ua_password)) ":" request_id ":" session_id ":" version)`
///
/// The initial login passes empty `request_id` and `session_id`.
#[must_use]
pub fn authorization_token(
    identity: &UserAgentIdentity,
    request_id: &str,
    session_id: &str,
) -> String {
    let a1 = md5_hex(
        format!(
            "{}:{}",
            identity.user_agent(),
            identity.user_agent_password()
        )
        .trim(),
    );
    md5_hex(&format!(
        "{a1}:{request_id}:{session_id}:{}",
        identity.version()
    ))
}

/// `RETS-UA-Authorization` header value for the initial login.
#[must_use]
pub fn ua_authorization(identity: &UserAgentIdentity) -> String {
    format!("Digest {}", authorization_token(identity, "", ""))
}
