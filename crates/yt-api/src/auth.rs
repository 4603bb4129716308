//! # Sessions
//!
//! Request extractors for the current identity, plus the signup/login/logout pages.

use std::future::{ready, Ready};

use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use askama::Template;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use yt_core::forms::{FieldErrors, SignupForm};
use yt_core::{AppError, Identity};
use yt_ui::{LoginTemplate, SignupTemplate};

use crate::error::ApiError;
use crate::handlers::html;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "yt_session";
pub const LOGIN_PATH: &str = "/auth/login/";

/// RFC 3986 unreserved characters stay as they are.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A `next` value: `/` stays readable, query delimiters do not.
const NEXT_PARAM: &AsciiSet = &UNRESERVED.remove(b'/').remove(b'%');

/// A username inside a path segment.
pub(crate) const PATH_SEGMENT: &AsciiSet = &UNRESERVED.remove(b'@').remove(b'+');

/// `/auth/login/?next=<path>`
pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", utf8_percent_encode(next, NEXT_PARAM))
}

/// Only local absolute paths are followed after login.
fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        next
    } else {
        "/"
    }
}

fn identity_of(req: &HttpRequest) -> Option<Identity> {
    let state = req.app_data::<web::Data<AppState>>()?;
    let cookie = req.cookie(SESSION_COOKIE)?;
    state.service.identity_from_session(cookie.value())
}

/// The viewer when logged in, `None` otherwise. Never rejects.
pub struct MaybeViewer(pub Option<Identity>);

impl FromRequest for MaybeViewer {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybeViewer(identity_of(req))))
    }
}

/// The logged-in viewer; anonymous requests are redirected to the login page.
pub struct Viewer(pub Identity);

impl FromRequest for Viewer {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(match identity_of(req) {
            Some(identity) => Ok(Viewer(identity)),
            None => {
                let next = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(ApiError::LoginRequired(next.to_string()))
            }
        })
    }
}

fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish()
}

fn redirect_with_session(
    state: &AppState,
    identity: &Identity,
    to: &str,
) -> Result<HttpResponse, ApiError> {
    let token = state.service.session_token(identity)?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, to.to_string()))
        .cookie(session_cookie(token, state.secure_cookie))
        .finish())
}

#[derive(Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    next: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    next: String,
}

pub async fn login_form(
    viewer: MaybeViewer,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse, ApiError> {
    let body = LoginTemplate {
        viewer: viewer.0.as_ref(),
        username: "",
        next: &query.next,
        error: None,
    }
    .render()?;
    Ok(html(body))
}

pub async fn login_submit(
    data: web::Data<AppState>,
    input: web::Form<LoginInput>,
) -> Result<HttpResponse, ApiError> {
    match data.service.login(&input.username, &input.password).await {
        Ok(identity) => {
            log::info!("{} logged in", identity.username);
            redirect_with_session(&data, &identity, safe_next(&input.next))
        }
        Err(AppError::Unauthorized(message)) => {
            let body = LoginTemplate {
                viewer: None,
                username: &input.username,
                next: &input.next,
                error: Some(&message),
            }
            .render()?;
            Ok(html(body))
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password1: String,
    #[serde(default)]
    password2: String,
}

pub async fn signup_form(viewer: MaybeViewer) -> Result<HttpResponse, ApiError> {
    let errors = FieldErrors::new();
    let body = SignupTemplate {
        viewer: viewer.0.as_ref(),
        username: "",
        errors: &errors,
    }
    .render()?;
    Ok(html(body))
}

pub async fn signup_submit(
    data: web::Data<AppState>,
    input: web::Form<SignupInput>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    let username = input.username.clone();
    let form = SignupForm {
        username: input.username,
        password1: input.password1,
        password2: input.password2,
    };
    match data.service.signup(form).await {
        Ok(identity) => redirect_with_session(&data, &identity, "/"),
        Err(AppError::Validation(errors)) => {
            let body = SignupTemplate {
                viewer: None,
                username: &username,
                errors: &errors,
            }
            .render()?;
            Ok(html(body))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn logout(data: web::Data<AppState>) -> HttpResponse {
    let mut cookie = session_cookie(String::new(), data.secure_cookie);
    cookie.make_removal();
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish()
}
