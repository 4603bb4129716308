//! Maps service failures onto HTTP responses.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use askama::Template;
use thiserror::Error;
use yt_core::AppError;
use yt_ui::{NotFoundTemplate, ServerErrorTemplate};

use crate::auth::login_url;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    /// Anonymous request to a protected route; carries the path to come back to.
    #[error("login required for {0}")]
    LoginRequired(String),

    #[error("template rendering failed: {0}")]
    Render(#[from] askama::Error),

    #[error("bad request: {0}")]
    BadRequest(String),
}

fn html(status: StatusCode, body: Result<String, askama::Error>) -> HttpResponse {
    match body {
        Ok(body) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("rendering error page failed: {err}");
            HttpResponse::build(status).finish()
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::App(AppError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::App(AppError::Validation(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::App(AppError::Unauthorized(_)) => StatusCode::FORBIDDEN,
            ApiError::LoginRequired(_) => StatusCode::FOUND,
            ApiError::App(AppError::Internal(_)) | ApiError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::LoginRequired(next) => HttpResponse::Found()
                .insert_header((header::LOCATION, login_url(next)))
                .finish(),
            ApiError::App(AppError::NotFound(kind, key)) => {
                let what = format!("{kind} {key}");
                html(
                    StatusCode::NOT_FOUND,
                    NotFoundTemplate { viewer: None, what: &what }.render(),
                )
            }
            ApiError::App(AppError::Internal(_)) | ApiError::Render(_) => {
                log::error!("{self}");
                html(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ServerErrorTemplate { viewer: None }.render(),
                )
            }
            other => HttpResponse::build(other.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(other.to_string()),
        }
    }
}
