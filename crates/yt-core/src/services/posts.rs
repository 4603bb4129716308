//! Post and comment lifecycle.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::forms::{self, CommentForm, FieldErrors, PostForm};
use crate::models::{Comment, CommentEntry, Group, Identity, Post, PostEntry, PostFilter};
use crate::traits::UploadError;

use super::Yatube;

/// Everything the post page shows.
pub struct PostDetail {
    pub entry: PostEntry,
    pub comments: Vec<CommentEntry>,
    /// Number of posts written by the same author.
    pub author_post_count: u64,
}

/// Outcome of opening the edit form.
pub enum EditAccess {
    Allowed(PostEntry),
    NotOwner,
}

/// Outcome of submitting the edit form.
pub enum EditOutcome {
    Updated(Post),
    NotOwner,
}

impl Yatube {
    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        Ok(self.content.list_groups().await?)
    }

    async fn get_entry(&self, id: Uuid) -> Result<PostEntry> {
        self.content
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::not_found("post", id.to_string()))
    }

    pub async fn post_detail(&self, id: Uuid) -> Result<PostDetail> {
        let entry = self.get_entry(id).await?;
        let comments = self.content.list_comments(id).await?;
        let author_post_count = self
            .content
            .count_posts(PostFilter::Author(entry.post.author_id))
            .await?;
        Ok(PostDetail {
            entry,
            comments,
            author_post_count,
        })
    }

    /// Validates the form, then stores the image if one was sent.
    /// Nothing is written when any field is invalid.
    async fn clean_post_form(&self, form: PostForm) -> Result<(Option<Uuid>, Option<String>)> {
        let mut errors = FieldErrors::new();
        let group_id = form.clean(&mut errors);
        if let Some(id) = group_id {
            if self.content.get_group(id).await?.is_none() {
                errors.add("group", forms::INVALID_CHOICE);
            }
        }
        errors.into_result()?;

        let image = match form.image {
            Some(upload) => {
                match self.media.save_upload(upload.data, &upload.content_type).await {
                    Ok(key) => Some(key),
                    Err(UploadError::Unsupported(reason)) => {
                        log::info!("rejected upload {:?}: {reason}", upload.filename);
                        let mut errors = FieldErrors::new();
                        errors.add("image", forms::INVALID_IMAGE);
                        return Err(AppError::Validation(errors));
                    }
                    Err(UploadError::Storage(err)) => return Err(err.into()),
                }
            }
            None => None,
        };
        Ok((group_id, image))
    }

    pub async fn create_post(&self, viewer: &Identity, form: PostForm) -> Result<Post> {
        let text = form.text.trim().to_string();
        let (group_id, image) = self.clean_post_form(form).await?;
        let post = Post {
            id: Uuid::now_v7(),
            author_id: viewer.id,
            group_id,
            text,
            image,
            created_at: Utc::now(),
        };
        self.content.create_post(post.clone()).await?;
        log::info!("post {} created by {}", post.id, viewer.username);
        Ok(post)
    }

    pub async fn edit_access(&self, viewer: &Identity, id: Uuid) -> Result<EditAccess> {
        let entry = self.get_entry(id).await?;
        if entry.post.author_id != viewer.id {
            return Ok(EditAccess::NotOwner);
        }
        Ok(EditAccess::Allowed(entry))
    }

    /// Only the author may edit; an upload replaces the image, no upload keeps it.
    pub async fn edit_post(&self, viewer: &Identity, id: Uuid, form: PostForm) -> Result<EditOutcome> {
        let mut post = match self.edit_access(viewer, id).await? {
            EditAccess::Allowed(entry) => entry.post,
            EditAccess::NotOwner => return Ok(EditOutcome::NotOwner),
        };
        let text = form.text.trim().to_string();
        let (group_id, image) = self.clean_post_form(form).await?;
        post.text = text;
        post.group_id = group_id;
        if image.is_some() {
            post.image = image;
        }
        self.content.update_post(post.clone()).await?;
        log::info!("post {} edited by {}", post.id, viewer.username);
        Ok(EditOutcome::Updated(post))
    }

    pub async fn add_comment(&self, viewer: &Identity, post_id: Uuid, form: CommentForm) -> Result<Comment> {
        let entry = self.get_entry(post_id).await?;
        let text = form.validate()?;
        let comment = Comment {
            id: Uuid::now_v7(),
            post_id: entry.post.id,
            author_id: viewer.id,
            text,
            created_at: Utc::now(),
        };
        self.content.create_comment(comment.clone()).await?;
        log::info!("comment {} on post {} by {}", comment.id, post_id, viewer.username);
        Ok(comment)
    }
}
