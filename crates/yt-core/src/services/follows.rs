//! Follow / unfollow.

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Follow, Identity, User};

use super::Yatube;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    /// Following yourself is silently ignored.
    SelfFollow,
}

impl Yatube {
    async fn author(&self, username: &str) -> Result<User> {
        self.users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("user", username))
    }

    pub async fn follow(&self, viewer: &Identity, username: &str) -> Result<FollowOutcome> {
        let author = self.author(username).await?;
        if author.id == viewer.id {
            return Ok(FollowOutcome::SelfFollow);
        }
        let created = self
            .content
            .create_follow(Follow {
                user_id: viewer.id,
                author_id: author.id,
                created_at: Utc::now(),
            })
            .await?;
        if created {
            log::info!("{} now follows {}", viewer.username, author.username);
            Ok(FollowOutcome::Created)
        } else {
            Ok(FollowOutcome::AlreadyFollowing)
        }
    }

    /// Not found when the viewer does not follow `username`.
    pub async fn unfollow(&self, viewer: &Identity, username: &str) -> Result<()> {
        let author = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("follow", username))?;
        if !self.content.delete_follow(viewer.id, author.id).await? {
            return Err(AppError::not_found("follow", username));
        }
        log::info!("{} unfollowed {}", viewer.username, author.username);
        Ok(())
    }
}
