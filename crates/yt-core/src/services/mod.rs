//! # Services
//!
//! Everything a request handler asks of the domain goes through [`Yatube`].
//! It owns the ports and the feed page size; handlers never touch a repo directly.

mod accounts;
mod feeds;
mod follows;
mod posts;

use std::sync::Arc;

use crate::traits::{AuthProvider, ContentRepo, MediaStore, UserRepo};

pub use feeds::{GroupFeed, ProfileFeed};
pub use follows::FollowOutcome;
pub use posts::{EditAccess, EditOutcome, PostDetail};

pub struct Yatube {
    content: Arc<dyn ContentRepo>,
    users: Arc<dyn UserRepo>,
    media: Arc<dyn MediaStore>,
    auth: Arc<dyn AuthProvider>,
    page_size: u64,
}

impl Yatube {
    pub fn new(
        content: Arc<dyn ContentRepo>,
        users: Arc<dyn UserRepo>,
        media: Arc<dyn MediaStore>,
        auth: Arc<dyn AuthProvider>,
        page_size: u64,
    ) -> Self {
        Self {
            content,
            users,
            media,
            auth,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// The media store, for turning image keys into URLs at render time.
    pub fn media(&self) -> &dyn MediaStore {
        self.media.as_ref()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Builders shared by the service tests.

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::models::{Identity, Post, PostEntry, User};
    use crate::traits::{MockAuthProvider, MockContentRepo, MockMediaStore, MockUserRepo};

    pub struct Mocks {
        pub content: MockContentRepo,
        pub users: MockUserRepo,
        pub media: MockMediaStore,
        pub auth: MockAuthProvider,
    }

    impl Mocks {
        pub fn new() -> Self {
            Self {
                content: MockContentRepo::new(),
                users: MockUserRepo::new(),
                media: MockMediaStore::new(),
                auth: MockAuthProvider::new(),
            }
        }

        pub fn build(self) -> Yatube {
            Yatube::new(
                Arc::new(self.content),
                Arc::new(self.users),
                Arc::new(self.media),
                Arc::new(self.auth),
                10,
            )
        }
    }

    pub fn user(username: &str) -> User {
        User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn identity(user: &User) -> Identity {
        user.identity()
    }

    pub fn entry(author: &User, text: &str) -> PostEntry {
        PostEntry {
            post: Post {
                id: Uuid::now_v7(),
                author_id: author.id,
                group_id: None,
                text: text.to_string(),
                image: None,
                created_at: Utc::now(),
            },
            author_username: author.username.clone(),
            group: None,
        }
    }
}
