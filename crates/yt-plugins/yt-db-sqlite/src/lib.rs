//! # yt-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `yt-core` domain models.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;
use yt_core::models::{
    Comment, CommentEntry, Follow, Group, GroupRef, Post, PostEntry, PostFilter, User,
};
use yt_core::traits::{ContentRepo, UserRepo};

static MIGRATOR: Migrator = sqlx::migrate!();

const POST_COLUMNS: &str = "SELECT p.id, p.author_id, p.group_id, p.text, p.image, p.created_at, \
     u.username AS author_username, g.slug AS group_slug, g.title AS group_title \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id";

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Opens (creating if needed) the database at `url` and applies pending migrations.
    ///
    /// An in-memory database lives in a single connection, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let in_memory = url.contains(":memory:");
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        }
        .connect_with(options)
        .await?;

        MIGRATOR.run(&pool).await?;
        log::info!("sqlite database ready at {url}");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// WHERE clause for a feed filter plus the id it binds, if any.
fn filter_clause(filter: PostFilter) -> (&'static str, Option<Uuid>) {
    match filter {
        PostFilter::All => ("1 = 1", None),
        PostFilter::Group(id) => ("p.group_id = ?", Some(id)),
        PostFilter::Author(id) => ("p.author_id = ?", Some(id)),
        PostFilter::FollowedBy(id) => (
            "p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)",
            Some(id),
        ),
    }
}

fn post_entry_from_row(row: &SqliteRow) -> Result<PostEntry, sqlx::Error> {
    let group_slug: Option<String> = row.try_get("group_slug")?;
    let group_title: Option<String> = row.try_get("group_title")?;
    Ok(PostEntry {
        post: Post {
            id: row.try_get("id")?,
            author_id: row.try_get("author_id")?,
            group_id: row.try_get("group_id")?,
            text: row.try_get("text")?,
            image: row.try_get("image")?,
            created_at: row.try_get("created_at")?,
        },
        author_username: row.try_get("author_username")?,
        group: group_slug
            .zip(group_title)
            .map(|(slug, title)| GroupRef { slug, title }),
    })
}

fn group_from_row(row: &SqliteRow) -> Result<Group, sqlx::Error> {
    Ok(Group {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
    })
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ContentRepo for SqliteRepo {
    async fn get_group_by_slug(&self, slug: &str) -> anyhow::Result<Option<Group>> {
        let row = sqlx::query("SELECT id, slug, title, description FROM post_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(group_from_row).transpose()?)
    }

    async fn get_group(&self, id: Uuid) -> anyhow::Result<Option<Group>> {
        let row = sqlx::query("SELECT id, slug, title, description FROM post_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(group_from_row).transpose()?)
    }

    async fn list_groups(&self) -> anyhow::Result<Vec<Group>> {
        let rows = sqlx::query("SELECT id, slug, title, description FROM post_groups ORDER BY title")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(group_from_row).collect::<Result<_, _>>()?)
    }

    async fn create_group(&self, group: Group) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO post_groups (id, slug, title, description) VALUES (?, ?, ?, ?)")
            .bind(group.id)
            .bind(group.slug)
            .bind(group.title)
            .bind(group.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO posts (id, author_id, group_id, text, image, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(post.id)
            .bind(post.author_id)
            .bind(post.group_id)
            .bind(post.text)
            .bind(post.image)
            .bind(post.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_post(&self, post: Post) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE posts SET text = ?, group_id = ?, image = ? WHERE id = ?")
            .bind(post.text)
            .bind(post.group_id)
            .bind(post.image)
            .bind(post.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("post {} vanished before update", post.id);
        }
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<PostEntry>> {
        let row = sqlx::query(&format!("{POST_COLUMNS} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(post_entry_from_row).transpose()?)
    }

    async fn count_posts(&self, filter: PostFilter) -> anyhow::Result<u64> {
        let (clause, param) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM posts p WHERE {clause}");
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(id) = param {
            query = query.bind(id);
        }
        let count = query.fetch_one(&self.pool).await?;
        Ok(u64::try_from(count)?)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<Vec<PostEntry>> {
        let (clause, param) = filter_clause(filter);
        let sql = format!(
            "{POST_COLUMNS} WHERE {clause} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
        );
        let mut query = sqlx::query(&sql);
        if let Some(id) = param {
            query = query.bind(id);
        }
        let rows = query
            .bind(i64::try_from(limit)?)
            .bind(i64::try_from(offset)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(post_entry_from_row).collect::<Result<_, _>>()?)
    }

    async fn create_comment(&self, comment: Comment) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO comments (id, post_id, author_id, text, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(comment.id)
            .bind(comment.post_id)
            .bind(comment.author_id)
            .bind(comment.text)
            .bind(comment.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<CommentEntry>> {
        let rows = sqlx::query(
            "SELECT c.id, c.post_id, c.author_id, c.text, c.created_at, u.username AS author_username \
             FROM comments c JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ? ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        let comments = rows
            .iter()
            .map(|row| {
                Ok(CommentEntry {
                    comment: Comment {
                        id: row.try_get("id")?,
                        post_id: row.try_get("post_id")?,
                        author_id: row.try_get("author_id")?,
                        text: row.try_get("text")?,
                        created_at: row.try_get("created_at")?,
                    },
                    author_username: row.try_get("author_username")?,
                })
            })
            .collect::<Result<_, sqlx::Error>>()?;
        Ok(comments)
    }

    /// Idempotent: a second call for the same pair inserts nothing.
    async fn create_follow(&self, follow: Follow) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO follows (user_id, author_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT (user_id, author_id) DO NOTHING",
        )
        .bind(follow.user_id)
        .bind(follow.author_id)
        .bind(follow.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn is_following(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn delete_follow(&self, user_id: Uuid, author_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepo for SqliteRepo {
    async fn create_user(&self, user: User) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id)
            .bind(user.username)
            .bind(user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, password_hash, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }
}
