//! Submitter fingerprinting for rate limiting and abuse attribution.
//!
//! Fingerprints are one-way hashes of the raw peer address. Proxy headers
//! (X-Forwarded-For, X-Real-IP) are deliberately not trusted, so behind a
//! reverse proxy every request shares one fingerprint. Known limitation,
//! kept simple on purpose.

use actix_web::http::header;
use actix_web::HttpRequest;

/// Raw client address as seen on the socket.
pub fn client_ip(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "0.0.0.0".to_string())
}

/// User agent header value, or empty when absent or not valid UTF-8.
pub fn user_agent(req: &HttpRequest) -> String {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Stable key naming the cooldown marker for a submitter.
pub fn rate_limit_key(ip: &str) -> String {
    blake3::hash(ip.as_bytes()).to_hex().to_string()
}

/// Truncated hash stored on each entry, mixing in the user agent so shared
/// addresses still attribute somewhat distinctly. 16 hex characters.
pub fn entry_fingerprint(ip: &str, user_agent: &str) -> String {
    let digest = blake3::hash(format!("{}|{}", ip, user_agent).as_bytes());
    digest.to_hex()[..16].to_string()
}
