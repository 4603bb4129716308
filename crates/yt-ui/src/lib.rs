//! # yt-ui
//!
//! Askama templates for every Yatube page, plus the small view models they render.

use askama::Template;
use serde::Serialize;
use uuid::Uuid;
use yt_core::forms::FieldErrors;
use yt_core::models::{CommentEntry, Group, Identity, PostEntry, User};
use yt_core::pagination::Page;

mod filters {
    /// Escapes the text, then turns newlines into `<br>`.
    pub fn linebreaksbr<T: std::fmt::Display>(s: T) -> ::askama::Result<String> {
        let escaped = html_escape::encode_text(&s.to_string()).into_owned();
        Ok(escaped.replace("\r\n", "\n").replace('\n', "<br>"))
    }
}

/// A post as a feed shows it, with media keys already turned into URLs.
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub entry: PostEntry,
    pub image_url: Option<String>,
    pub thumb_url: Option<String>,
}

/// One `<option>` of the group select.
#[derive(Debug, Clone, Serialize)]
pub struct GroupOption {
    pub id: String,
    pub title: String,
    pub selected: bool,
}

impl GroupOption {
    /// `selected` is the raw submitted value (or the post's current group id).
    pub fn list(groups: &[Group], selected: &str) -> Vec<GroupOption> {
        groups
            .iter()
            .map(|g| {
                let id = g.id.to_string();
                GroupOption {
                    selected: id == selected,
                    id,
                    title: g.title.clone(),
                }
            })
            .collect()
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    pub page: &'a Page<PostCard>,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    pub group: &'a Group,
    pub page: &'a Page<PostCard>,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    pub author: &'a User,
    pub page: &'a Page<PostCard>,
    pub following: bool,
    /// False on your own profile and for anonymous viewers.
    pub can_follow: bool,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    pub page: &'a Page<PostCard>,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    pub card: &'a PostCard,
    pub comments: &'a [CommentEntry],
    pub author_post_count: u64,
    pub can_edit: bool,
    /// Comment form state: what was typed and what was wrong with it.
    pub comment_text: &'a str,
    pub errors: &'a FieldErrors,
}

#[derive(Template)]
#[template(path = "create_post.html")]
pub struct PostFormTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    pub is_edit: bool,
    pub post_id: Option<Uuid>,
    pub text: &'a str,
    pub groups: &'a [GroupOption],
    pub current_image: Option<String>,
    pub errors: &'a FieldErrors,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    pub username: &'a str,
    pub next: &'a str,
    pub error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    pub username: &'a str,
    pub errors: &'a FieldErrors,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate<'a> {
    pub viewer: Option<&'a Identity>,
    /// The missing thing: a path, or e.g. "post 0190…".
    pub what: &'a str,
}

#[derive(Template)]
#[template(path = "server_error.html")]
pub struct ServerErrorTemplate<'a> {
    pub viewer: Option<&'a Identity>,
}
