//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Comment, CommentEntry, Follow, Group, Identity, Post, PostEntry, PostFilter, User,
};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// Data persistence contract for groups, posts, comments and follows.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait ContentRepo: Send + Sync {
    // Group Operations
    async fn get_group_by_slug(&self, slug: &str) -> anyhow::Result<Option<Group>>;
    async fn get_group(&self, id: Uuid) -> anyhow::Result<Option<Group>>;
    async fn list_groups(&self) -> anyhow::Result<Vec<Group>>;
    async fn create_group(&self, group: Group) -> anyhow::Result<()>;

    // Post Operations
    async fn create_post(&self, post: Post) -> anyhow::Result<()>;
    /// Overwrites text, group and image of an existing post.
    async fn update_post(&self, post: Post) -> anyhow::Result<()>;
    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostEntry>>;
    async fn count_posts(&self, filter: PostFilter) -> anyhow::Result<u64>;
    /// Newest first.
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<Vec<PostEntry>>;

    // Comment Operations
    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()>;
    /// Newest first.
    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentEntry>>;

    // Follow Operations
    /// Inserts the pair unless it already exists. Returns whether a row was created.
    async fn create_follow(&self, follow: Follow) -> anyhow::Result<bool>;
    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool>;
    /// Returns whether a row was deleted.
    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool>;
}

/// Account persistence.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: User) -> anyhow::Result<()>;
    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
}

/// Why an upload was refused by a `MediaStore`.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The bytes are not an image the store can handle.
    #[error("unsupported upload: {0}")]
    Unsupported(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Media storage contract for handling uploads and thumbnails.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Saves raw bytes and returns a media key for the Post model.
    async fn save_upload(&self, data: Bytes, content_type: &str) -> Result<String, UploadError>;
    /// Returns the URL of the original media.
    fn url(&self, key: &str) -> String;
    /// Returns the URL of the thumbnail.
    fn thumbnail_url(&self, key: &str) -> String;
}

/// Credentials and session contract.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produces a salted hash suitable for `User::password_hash`.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Issues a tamper-evident, expiring session token for the identity.
    fn issue_session(&self, identity: &Identity) -> anyhow::Result<String>;

    /// Recovers the identity from a session token, if the token is genuine and unexpired.
    fn verify_session(&self, token: &str) -> Option<Identity>;
}
