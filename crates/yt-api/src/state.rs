//! State shared across all actix-web workers.

use std::time::Duration;

use yt_core::Yatube;

use crate::cache::PageCache;

pub struct AppState {
    pub service: Yatube,
    /// Rendered index pages, served until their TTL runs out.
    pub index_cache: PageCache,
    /// Mark the session cookie `Secure`.
    pub secure_cookie: bool,
}

impl AppState {
    pub fn new(service: Yatube, index_cache_ttl: Duration, secure_cookie: bool) -> Self {
        Self {
            service,
            index_cache: PageCache::new(index_cache_ttl),
            secure_cookie,
        }
    }
}
