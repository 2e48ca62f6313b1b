//! Cross-origin headers.
//!
//! Origins are matched exactly against the configured list. Allowed origins
//! are echoed back with credentials enabled; everything else gets no CORS
//! headers, and a disallowed preflight is answered with 400.

use sa_common::http::HeaderList;
use sa_common::CorsConfig;

pub const ALLOW_METHODS: &str = "DELETE, GET, HEAD, OPTIONS, PATCH, POST, PUT";
const MAX_AGE_SECS: &str = "600";

/// Headers for a regular (non-preflight) response.
pub fn response_headers(cors: &CorsConfig, origin: Option<&str>) -> HeaderList {
    match origin {
        Some(o) if cors.is_allowed(o) => vec![
            ("Access-Control-Allow-Origin", o.to_string()),
            ("Access-Control-Allow-Credentials", "true".to_string()),
            ("Vary", "Origin".to_string()),
        ],
        _ => Vec::new(),
    }
}

/// Outcome of an `OPTIONS` preflight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    Allowed(HeaderList),
    Denied(HeaderList),
}

pub fn preflight(cors: &CorsConfig, origin: &str, requested_headers: Option<&str>) -> Preflight {
    let mut headers: HeaderList = vec![
        ("Access-Control-Allow-Methods", ALLOW_METHODS.to_string()),
        ("Access-Control-Max-Age", MAX_AGE_SECS.to_string()),
        ("Vary", "Origin".to_string()),
    ];
    if let Some(requested) = requested_headers.filter(|h| !h.trim().is_empty()) {
        headers.push(("Access-Control-Allow-Headers", requested.to_string()));
    }

    if !cors.is_allowed(origin) {
        return Preflight::Denied(headers);
    }
    headers.push(("Access-Control-Allow-Origin", origin.to_string()));
    headers.push(("Access-Control-Allow-Credentials", "true".to_string()));
    Preflight::Allowed(headers)
}
