//! # Yatube Binary
//!
//! The entry point that assembles the site from configuration and plugins.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use yt_api::middleware::{normalize_path, security_headers, standard_middleware};
use yt_api::{configure_routes, AppState};
use yt_auth_simple::SimpleAuthProvider;
use yt_config::Settings;
use yt_core::Yatube;
use yt_db_sqlite::SqliteRepo;
use yt_storage_local::LocalMediaStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().context("loading configuration")?;
    if settings.uses_dev_secret() {
        log::warn!("using the built-in development session secret; set YATUBE__AUTH__SESSION_SECRET");
    }

    let (host, port) = settings.bind_address();

    // 1. Database
    let repo = Arc::new(
        SqliteRepo::new(&settings.database.url)
            .await
            .with_context(|| format!("opening database {}", settings.database.url))?,
    );

    // 2. Media storage
    tokio::fs::create_dir_all(&settings.media.root)
        .await
        .with_context(|| format!("creating media root {}", settings.media.root.display()))?;
    let media = Arc::new(LocalMediaStore::new(
        settings.media.root.clone(),
        settings.media.url_prefix.clone(),
    ));

    // 3. Auth
    let session_ttl = settings.auth.session_ttl();
    let auth = Arc::new(
        SimpleAuthProvider::new(settings.auth.session_secret).with_session_ttl(session_ttl),
    );

    let service = Yatube::new(repo.clone(), repo, media, auth, settings.feed.page_size);
    let state = web::Data::new(AppState::new(
        service,
        settings.feed.index_cache_ttl(),
        settings.auth.secure_cookie,
    ));

    log::info!("Yatube starting on http://{host}:{port}");
    let media_root = settings.media.root;
    let media_prefix = settings.media.url_prefix;
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(security_headers())
            .wrap(normalize_path())
            .wrap(standard_middleware())
            .service(actix_files::Files::new(&media_prefix, &media_root))
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;
    Ok(())
}
