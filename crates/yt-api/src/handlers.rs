//! # yt-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core services.

use actix_multipart::Multipart;
use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use askama::Template;
use bytes::Bytes;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;
use uuid::Uuid;
use yt_core::forms::{CommentForm, FieldErrors};
use yt_core::models::{Identity, PostEntry};
use yt_core::services::{EditAccess, EditOutcome, PostDetail};
use yt_core::{AppError, Page, Yatube};
use yt_ui::{
    FollowTemplate, GroupOption, GroupTemplate, IndexTemplate, NotFoundTemplate, PostCard,
    PostDetailTemplate, PostFormTemplate, ProfileTemplate,
};

use crate::auth::{MaybeViewer, Viewer, PATH_SEGMENT};
use crate::error::ApiError;
use crate::multipart::read_post_form;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

pub(crate) fn html(body: impl Into<Bytes>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body.into())
}

fn redirect(to: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, to))
        .finish()
}

fn profile_url(username: &str) -> String {
    format!("/profile/{}/", utf8_percent_encode(username, PATH_SEGMENT))
}

fn detail_url(id: Uuid) -> String {
    format!("/posts/{id}/")
}

fn card(service: &Yatube, entry: PostEntry) -> PostCard {
    let media = service.media();
    PostCard {
        image_url: entry.post.image.as_deref().map(|key| media.url(key)),
        thumb_url: entry.post.image.as_deref().map(|key| media.thumbnail_url(key)),
        entry,
    }
}

fn cards(service: &Yatube, page: Page<PostEntry>) -> Page<PostCard> {
    page.map(|entry| card(service, entry))
}

/// Keyed on the page number, not the raw query, so unrelated parameters share
/// an entry. Pages show who is logged in, so each viewer gets their own.
pub(crate) fn index_cache_key(page: Option<&str>, viewer: Option<&Identity>) -> String {
    let page = page
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .map_or_else(|| "1".to_string(), |n| n.to_string());
    match viewer {
        Some(identity) => format!("index:{page}:{}", identity.id),
        None => format!("index:{page}:anon"),
    }
}

/// Renders the global feed (`/`), served from the page cache when fresh.
pub async fn index(
    data: web::Data<AppState>,
    viewer: MaybeViewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let key = index_cache_key(query.page.as_deref(), viewer.0.as_ref());
    if let Some(body) = data.index_cache.get(&key) {
        return Ok(html(body));
    }

    let page = data.service.index_feed(query.page.as_deref()).await?;
    let page = cards(&data.service, page);
    let body = Bytes::from(
        IndexTemplate {
            viewer: viewer.0.as_ref(),
            page: &page,
        }
        .render()?,
    );
    data.index_cache.insert(key, body.clone());
    Ok(html(body))
}

/// Renders a group feed (e.g., /group/cats/)
pub async fn group_posts(
    data: web::Data<AppState>,
    path: web::Path<String>,
    viewer: MaybeViewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let feed = data
        .service
        .group_feed(&path.into_inner(), query.page.as_deref())
        .await?;
    let page = cards(&data.service, feed.page);
    let body = GroupTemplate {
        viewer: viewer.0.as_ref(),
        group: &feed.group,
        page: &page,
    }
    .render()?;
    Ok(html(body))
}

pub async fn profile(
    data: web::Data<AppState>,
    path: web::Path<String>,
    viewer: MaybeViewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let viewer = viewer.0;
    let feed = data
        .service
        .profile_feed(&path.into_inner(), viewer.as_ref(), query.page.as_deref())
        .await?;
    let page = cards(&data.service, feed.page);
    let can_follow = viewer.as_ref().is_some_and(|v| v.id != feed.author.id);
    let body = ProfileTemplate {
        viewer: viewer.as_ref(),
        author: &feed.author,
        page: &page,
        following: feed.following,
        can_follow,
    }
    .render()?;
    Ok(html(body))
}

fn render_detail(
    service: &Yatube,
    viewer: Option<&Identity>,
    detail: PostDetail,
    comment_text: &str,
    errors: &FieldErrors,
) -> Result<String, ApiError> {
    let can_edit = viewer.is_some_and(|v| v.id == detail.entry.post.author_id);
    let card = card(service, detail.entry);
    Ok(PostDetailTemplate {
        viewer,
        card: &card,
        comments: &detail.comments,
        author_post_count: detail.author_post_count,
        can_edit,
        comment_text,
        errors,
    }
    .render()?)
}

pub async fn post_detail(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    viewer: MaybeViewer,
) -> Result<HttpResponse, ApiError> {
    let detail = data.service.post_detail(path.into_inner()).await?;
    let body = render_detail(&data.service, viewer.0.as_ref(), detail, "", &FieldErrors::new())?;
    Ok(html(body))
}

struct FormPage<'a> {
    post_id: Option<Uuid>,
    text: &'a str,
    group: &'a str,
    current_image: Option<String>,
    errors: &'a FieldErrors,
}

async fn render_post_form(
    service: &Yatube,
    viewer: &Identity,
    form: FormPage<'_>,
) -> Result<String, ApiError> {
    let groups = service.list_groups().await?;
    let options = GroupOption::list(&groups, form.group);
    Ok(PostFormTemplate {
        viewer: Some(viewer),
        is_edit: form.post_id.is_some(),
        post_id: form.post_id,
        text: form.text,
        groups: &options,
        current_image: form.current_image,
        errors: form.errors,
    }
    .render()?)
}

pub async fn create_form(
    data: web::Data<AppState>,
    viewer: Viewer,
) -> Result<HttpResponse, ApiError> {
    let errors = FieldErrors::new();
    let page = FormPage {
        post_id: None,
        text: "",
        group: "",
        current_image: None,
        errors: &errors,
    };
    Ok(html(render_post_form(&data.service, &viewer.0, page).await?))
}

/// Orchestrates the creation of a new post.
pub async fn create_submit(
    data: web::Data<AppState>,
    viewer: Viewer,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let viewer = viewer.0;
    let form = read_post_form(payload).await?;
    let (text, group) = (form.text.clone(), form.group.clone());

    match data.service.create_post(&viewer, form).await {
        Ok(_) => Ok(redirect(profile_url(&viewer.username))),
        Err(AppError::Validation(errors)) => {
            let page = FormPage {
                post_id: None,
                text: &text,
                group: &group,
                current_image: None,
                errors: &errors,
            };
            Ok(html(render_post_form(&data.service, &viewer, page).await?))
        }
        Err(err) => Err(err.into()),
    }
}

fn current_thumb(service: &Yatube, entry: &PostEntry) -> Option<String> {
    entry
        .post
        .image
        .as_deref()
        .map(|key| service.media().thumbnail_url(key))
}

pub async fn edit_form(
    data: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let viewer = viewer.0;
    let entry = match data.service.edit_access(&viewer, id).await? {
        EditAccess::Allowed(entry) => entry,
        EditAccess::NotOwner => return Ok(redirect(detail_url(id))),
    };
    let errors = FieldErrors::new();
    let group = entry.post.group_id.map(|g| g.to_string()).unwrap_or_default();
    let current_image = current_thumb(&data.service, &entry);
    let page = FormPage {
        post_id: Some(id),
        text: &entry.post.text,
        group: &group,
        current_image,
        errors: &errors,
    };
    Ok(html(render_post_form(&data.service, &viewer, page).await?))
}

/// Only the author gets the form back; everyone else lands on the post page.
pub async fn edit_submit(
    data: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let viewer = viewer.0;
    // Checked before the body is read, so non-owners never reach the upload.
    let entry = match data.service.edit_access(&viewer, id).await? {
        EditAccess::Allowed(entry) => entry,
        EditAccess::NotOwner => return Ok(redirect(detail_url(id))),
    };
    let form = read_post_form(payload).await?;
    let (text, group) = (form.text.clone(), form.group.clone());

    match data.service.edit_post(&viewer, id, form).await {
        Ok(EditOutcome::Updated(_)) | Ok(EditOutcome::NotOwner) => Ok(redirect(detail_url(id))),
        Err(AppError::Validation(errors)) => {
            let page = FormPage {
                post_id: Some(id),
                text: &text,
                group: &group,
                current_image: current_thumb(&data.service, &entry),
                errors: &errors,
            };
            Ok(html(render_post_form(&data.service, &viewer, page).await?))
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    text: String,
}

/// Saves a comment and goes back to the post; an invalid one re-renders the post page.
pub async fn add_comment(
    data: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<Uuid>,
    input: web::Form<CommentInput>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let viewer = viewer.0;
    let text = input.into_inner().text;
    let form = CommentForm { text: text.clone() };

    match data.service.add_comment(&viewer, id, form).await {
        Ok(_) => Ok(redirect(detail_url(id))),
        Err(AppError::Validation(errors)) => {
            let detail = data.service.post_detail(id).await?;
            let body = render_detail(&data.service, Some(&viewer), detail, &text, &errors)?;
            Ok(html(body))
        }
        Err(err) => Err(err.into()),
    }
}

/// Posts by authors the viewer follows.
pub async fn follow_index(
    data: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let page = data.service.follow_feed(&viewer.0, query.page.as_deref()).await?;
    let page = cards(&data.service, page);
    let body = FollowTemplate {
        viewer: Some(&viewer.0),
        page: &page,
    }
    .render()?;
    Ok(html(body))
}

pub async fn profile_follow(
    data: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    data.service.follow(&viewer.0, &username).await?;
    Ok(redirect(profile_url(&username)))
}

pub async fn profile_unfollow(
    data: web::Data<AppState>,
    viewer: Viewer,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let username = path.into_inner();
    data.service.unfollow(&viewer.0, &username).await?;
    Ok(redirect(profile_url(&username)))
}

/// Fallback for every unknown route.
pub async fn not_found(req: HttpRequest, viewer: MaybeViewer) -> Result<HttpResponse, ApiError> {
    let body = NotFoundTemplate {
        viewer: viewer.0.as_ref(),
        what: req.path(),
    }
    .render()?;
    Ok(HttpResponse::build(StatusCode::NOT_FOUND)
        .content_type("text/html; charset=utf-8")
        .body(body))
}
