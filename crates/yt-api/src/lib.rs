//! # yt-api
//!
//! The web routing and orchestration layer for Yatube.

pub mod auth;
pub mod cache;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod state;

use actix_web::web;

pub use error::ApiError;
pub use state::AppState;

/// Configures every Yatube route.
///
/// Media files are not served from here; the binary mounts them next to these
/// routes so a different store can serve them from elsewhere.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login/", web::get().to(auth::login_form))
            .route("/login/", web::post().to(auth::login_submit))
            .route("/signup/", web::get().to(auth::signup_form))
            .route("/signup/", web::post().to(auth::signup_submit))
            .route("/logout/", web::post().to(auth::logout))
            .default_service(web::to(handlers::not_found)),
    )
    .service(
        web::scope("")
            // The global feed
            .route("/", web::get().to(handlers::index))
            .route("/group/{slug}/", web::get().to(handlers::group_posts))
            .route("/follow/", web::get().to(handlers::follow_index))
            .route("/create/", web::get().to(handlers::create_form))
            .route("/create/", web::post().to(handlers::create_submit))
            .route("/profile/{username}/", web::get().to(handlers::profile))
            .route("/profile/{username}/follow/", web::get().to(handlers::profile_follow))
            .route("/profile/{username}/unfollow/", web::get().to(handlers::profile_unfollow))
            .route("/posts/{post_id}/", web::get().to(handlers::post_detail))
            .route("/posts/{post_id}/edit/", web::get().to(handlers::edit_form))
            .route("/posts/{post_id}/edit/", web::post().to(handlers::edit_submit))
            .route("/posts/{post_id}/comment/", web::post().to(handlers::add_comment))
            .default_service(web::to(handlers::not_found)),
    );
}
