//! yatube/crates/yt-api/src/middleware.rs Middleware
//!
//! Custom middleware for security, logging, and URL normalisation.

use actix_web::middleware::{DefaultHeaders, Logger, NormalizePath, TrailingSlash};

/// Returns a standard set of middleware for the Yatube site.
pub fn standard_middleware() -> Logger {
    // We use the 'default' logger which outputs:
    // remote-ip "request-line" status-code response-size "referrer" "user-agent"
    Logger::default()
}

/// Every route ends in '/', so `/group/cats` is served as `/group/cats/`.
pub fn normalize_path() -> NormalizePath {
    NormalizePath::new(TrailingSlash::Always)
}

pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "same-origin"))
}
