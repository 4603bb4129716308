//! Shared fixture: a full Yatube stack on in-memory SQLite and a temp media dir.

#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::Cookie;
use actix_web::web;
use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use tempfile::TempDir;
use uuid::Uuid;
use yt_api::auth::SESSION_COOKIE;
use yt_api::AppState;
use yt_auth_simple::SimpleAuthProvider;
use yt_core::models::{Group, Identity, Post, User};
use yt_core::{ContentRepo, UserRepo, Yatube};
use yt_db_sqlite::SqliteRepo;
use yt_storage_local::LocalMediaStore;

pub const PAGE_SIZE: u64 = 10;

/// 1x1 GIF, small enough to inline.
pub const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\
\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

pub struct TestApp {
    pub repo: Arc<SqliteRepo>,
    pub state: web::Data<AppState>,
    pub media_dir: TempDir,
    clock: AtomicI64,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_cache_ttl(Duration::from_secs(20)).await
    }

    pub async fn with_cache_ttl(ttl: Duration) -> Self {
        let repo = Arc::new(SqliteRepo::new("sqlite::memory:").await.unwrap());
        let media_dir = tempfile::tempdir().unwrap();
        let media = Arc::new(LocalMediaStore::new(media_dir.path().to_path_buf(), "/media/"));
        let auth = Arc::new(SimpleAuthProvider::new(SecretString::from(
            "integration-test-secret".to_string(),
        )));
        let service = Yatube::new(repo.clone(), repo.clone(), media, auth, PAGE_SIZE);
        Self {
            repo,
            state: web::Data::new(AppState::new(service, ttl, false)),
            media_dir,
            clock: AtomicI64::new(0),
        }
    }

    /// Inserts a user directly; the hash is not a valid PHC string, so it cannot log in.
    pub async fn user(&self, username: &str) -> Identity {
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: "!".to_string(),
            created_at: Utc::now(),
        };
        self.repo.create_user(user.clone()).await.unwrap();
        user.identity()
    }

    pub fn session(&self, identity: &Identity) -> Cookie<'static> {
        Cookie::new(SESSION_COOKIE, self.state.service.session_token(identity).unwrap())
    }

    pub async fn group(&self, slug: &str) -> Group {
        let group = Group {
            id: Uuid::now_v7(),
            slug: slug.to_string(),
            title: format!("Group {slug}"),
            description: String::new(),
        };
        self.repo.create_group(group.clone()).await.unwrap();
        group
    }

    /// Each post is one second newer than the previous one.
    pub async fn post(&self, author: &Identity, group: Option<&Group>, text: &str) -> Post {
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        let post = Post {
            id: Uuid::now_v7(),
            author_id: author.id,
            group_id: group.map(|g| g.id),
            text: text.to_string(),
            image: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + tick, 0).unwrap(),
        };
        self.repo.create_post(post.clone()).await.unwrap();
        post
    }

    pub async fn get_post(&self, id: Uuid) -> Post {
        self.repo.get_post(id).await.unwrap().unwrap().post
    }
}

/// Builds the app under test; routes are mounted without path normalisation.
macro_rules! init_app {
    ($app:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($app.state.clone())
                .configure(yt_api::configure_routes),
        )
        .await
    };
}

/// Number of post cards on a rendered feed page.
pub fn card_count(body: &str) -> usize {
    body.matches("<article>").count()
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub const BOUNDARY: &str = "yatube-test-boundary";

/// A `multipart/form-data` body with text fields and an optional image part.
pub fn multipart_body(fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}
