//! Feed composition: global, group, profile and follow feeds.

use crate::error::{AppError, Result};
use crate::models::{Group, Identity, PostEntry, PostFilter, User};
use crate::pagination::{Page, Paginator};

use super::Yatube;

pub struct GroupFeed {
    pub group: Group,
    pub page: Page<PostEntry>,
}

pub struct ProfileFeed {
    pub author: User,
    pub page: Page<PostEntry>,
    /// Whether the viewer follows `author`; false for anonymous viewers.
    pub following: bool,
}

impl Yatube {
    async fn page_of(&self, filter: PostFilter, requested: Option<&str>) -> Result<Page<PostEntry>> {
        let count = self.content.count_posts(filter).await?;
        let paginator = Paginator::new(self.page_size, count);
        let number = paginator.resolve(requested);
        let (offset, limit) = paginator.bounds(number);
        let items = if limit == 0 {
            Vec::new()
        } else {
            self.content.list_posts(filter, limit, offset).await?
        };
        Ok(Page::new(items, number, &paginator))
    }

    /// All posts, newest first.
    pub async fn index_feed(&self, page: Option<&str>) -> Result<Page<PostEntry>> {
        self.page_of(PostFilter::All, page).await
    }

    pub async fn group_feed(&self, slug: &str, page: Option<&str>) -> Result<GroupFeed> {
        let group = self
            .content
            .get_group_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("group", slug))?;
        let page = self.page_of(PostFilter::Group(group.id), page).await?;
        Ok(GroupFeed { group, page })
    }

    pub async fn profile_feed(
        &self,
        username: &str,
        viewer: Option<&Identity>,
        page: Option<&str>,
    ) -> Result<ProfileFeed> {
        let author = self
            .users
            .get_user_by_username(username)
            .await?
            .ok_or_else(|| AppError::not_found("user", username))?;
        let following = match viewer {
            Some(viewer) => self.content.is_following(viewer.id, author.id).await?,
            None => false,
        };
        let page = self.page_of(PostFilter::Author(author.id), page).await?;
        Ok(ProfileFeed {
            author,
            page,
            following,
        })
    }

    /// Posts of every author the viewer follows.
    pub async fn follow_feed(&self, viewer: &Identity, page: Option<&str>) -> Result<Page<PostEntry>> {
        self.page_of(PostFilter::FollowedBy(viewer.id), page).await
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::*;

    use super::super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_index_second_page_of_thirteen() {
        let author = user("leo");
        let tail: Vec<_> = (0..3).map(|i| entry(&author, &format!("post {i}"))).collect();

        let mut mocks = Mocks::new();
        mocks
            .content
            .expect_count_posts()
            .with(eq(PostFilter::All))
            .returning(|_| Ok(13));
        mocks
            .content
            .expect_list_posts()
            .with(eq(PostFilter::All), eq(3), eq(10))
            .times(1)
            .returning(move |_, _, _| Ok(tail.clone()));

        let page = mocks.build().index_feed(Some("2")).await.unwrap();
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.number, 2);
        assert_eq!(page.num_pages, 2);
    }

    #[tokio::test]
    async fn test_empty_feed_skips_listing() {
        let mut mocks = Mocks::new();
        mocks.content.expect_count_posts().returning(|_| Ok(0));
        mocks.content.expect_list_posts().never();

        let page = mocks.build().index_feed(Some("7")).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.number, 1);
    }

    #[tokio::test]
    async fn test_unknown_group_is_not_found() {
        let mut mocks = Mocks::new();
        mocks
            .content
            .expect_get_group_by_slug()
            .with(eq("missing"))
            .returning(|_| Ok(None));

        let err = mocks.build().group_feed("missing", None).await.err().unwrap();
        assert!(matches!(err, AppError::NotFound("group", _)));
    }

    #[tokio::test]
    async fn test_profile_for_anonymous_never_checks_follow() {
        let author = user("leo");
        let author_id = author.id;
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_get_user_by_username()
            .returning(move |_| Ok(Some(author.clone())));
        mocks.content.expect_is_following().never();
        mocks
            .content
            .expect_count_posts()
            .with(eq(PostFilter::Author(author_id)))
            .returning(|_| Ok(0));

        let feed = mocks.build().profile_feed("leo", None, None).await.unwrap();
        assert!(!feed.following);
        assert_eq!(feed.author.username, "leo");
    }

    #[tokio::test]
    async fn test_profile_reports_follow_status() {
        let author = user("leo");
        let reader = user("anna");
        let viewer = identity(&reader);
        let (author_id, reader_id) = (author.id, reader.id);

        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_get_user_by_username()
            .returning(move |_| Ok(Some(author.clone())));
        mocks
            .content
            .expect_is_following()
            .with(eq(reader_id), eq(author_id))
            .returning(|_, _| Ok(true));
        mocks.content.expect_count_posts().returning(|_| Ok(0));

        let feed = mocks.build().profile_feed("leo", Some(&viewer), None).await.unwrap();
        assert!(feed.following);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let mut mocks = Mocks::new();
        mocks.users.expect_get_user_by_username().returning(|_| Ok(None));

        let err = mocks.build().profile_feed("ghost", None, None).await.err().unwrap();
        assert!(matches!(err, AppError::NotFound("user", _)));
    }

    #[tokio::test]
    async fn test_follow_feed_filters_by_viewer() {
        let reader = user("anna");
        let viewer = identity(&reader);
        let mut mocks = Mocks::new();
        mocks
            .content
            .expect_count_posts()
            .with(eq(PostFilter::FollowedBy(reader.id)))
            .returning(|_| Ok(0));

        let page = mocks.build().follow_feed(&viewer, None).await.unwrap();
        assert!(page.items.is_empty());
    }
}
