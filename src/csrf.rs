//! CSRF (Cross-Site Request Forgery) protection.
//!
//! The token is:
//! - Generated once per session (32 random bytes, hex encoded)
//! - Stored in the session cookie
//! - Included in the form as a hidden field named "csrf"
//! - Checked on every POST before the submission is accepted

use actix_session::Session;
use actix_web::{error, Error};
use rand::Rng;

/// Random bytes per token; the hex encoding is twice this long.
pub const CSRF_TOKEN_BYTES: usize = 32;
const CSRF_SESSION_KEY: &str = "csrf";

/// Generate a new CSRF token.
pub fn generate_csrf_token() -> String {
    let bytes: [u8; CSRF_TOKEN_BYTES] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Get the session's CSRF token, creating one only when absent.
pub fn get_or_create_csrf_token(session: &Session) -> Result<String, Error> {
    match session.get::<String>(CSRF_SESSION_KEY) {
        Ok(Some(token)) => Ok(token),
        _ => {
            let token = generate_csrf_token();
            session
                .insert(CSRF_SESSION_KEY, token.clone())
                .map_err(|_| error::ErrorInternalServerError("Failed to store CSRF token"))?;
            Ok(token)
        }
    }
}

/// Whether the submitted token matches the session's token.
///
/// False when the session holds no token or the field is missing/empty.
/// The comparison goes through BLAKE3 digests, which compare in constant
/// time, so the token contents never leak through timing.
pub fn csrf_token_is_valid(session: &Session, provided: &str) -> bool {
    if provided.is_empty() {
        return false;
    }
    match session.get::<String>(CSRF_SESSION_KEY) {
        Ok(Some(expected)) => {
            blake3::hash(provided.as_bytes()) == blake3::hash(expected.as_bytes())
        }
        _ => false,
    }
}
