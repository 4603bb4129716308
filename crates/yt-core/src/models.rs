//! # Domain Models
//!
//! These structs represent the core entities of Yatube.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Created by signup, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2 PHC string; never rendered.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// The authenticated actor of a request, as carried by the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
}

/// A topical category posts can be filed under (e.g. "cats").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    /// The URL slug (e.g. "cats" for /group/cats/)
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// Just enough of a group to link to it from a post card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub slug: String,
    pub title: String,
}

/// The fundamental unit of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    pub text: String,
    /// Key of the attached image in the `MediaStore`
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Length of the label used when a post is shown in lists and titles.
    pub const LABEL_LEN: usize = 15;

    /// First characters of the text, counted in chars rather than bytes.
    pub fn label(&self) -> String {
        self.text.chars().take(Self::LABEL_LEN).collect()
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A post joined with what a feed needs to render it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEntry {
    pub post: Post,
    pub author_username: String,
    pub group: Option<GroupRef>,
}

/// A reply attached to exactly one post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author_username: String,
}

/// Directed subscription: `user_id` follows `author_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub user_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Selects which posts a feed is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by every author the given user follows.
    FollowedBy(Uuid),
}
