#[macro_use]
mod common;

use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test;
use common::{card_count, TestApp};

async fn body_of<B: MessageBody>(resp: ServiceResponse<B>) -> String {
    String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
}

#[actix_web::test]
async fn test_group_page_holds_all_nine_posts() {
    let app = TestApp::new().await;
    let author = app.user("leo").await;
    let cats = app.group("cats").await;
    for i in 0..9 {
        app.post(&author, Some(&cats), &format!("cat post {i}")).await;
    }
    // Noise outside the group.
    app.post(&author, None, "no group").await;
    let svc = init_app!(app);

    let resp = test::call_service(&svc, test::TestRequest::get().uri("/group/cats/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_of(resp).await;
    assert_eq!(card_count(&body), 9);
    assert!(!body.contains("no group"));
    assert!(!body.contains("Page 1 of"));
}

#[actix_web::test]
async fn test_second_index_page_holds_the_remainder() {
    let app = TestApp::with_cache_ttl(Duration::ZERO).await;
    let author = app.user("leo").await;
    for i in 0..13 {
        app.post(&author, None, &format!("post number {i:02}")).await;
    }
    let svc = init_app!(app);

    let first = test::call_and_read_body(&svc, test::TestRequest::get().uri("/").to_request()).await;
    let first = String::from_utf8(first.to_vec()).unwrap();
    assert_eq!(card_count(&first), 10);
    assert!(first.contains("post number 12"));
    assert!(first.contains("Page 1 of 2"));

    let second =
        test::call_and_read_body(&svc, test::TestRequest::get().uri("/?page=2").to_request()).await;
    let second = String::from_utf8(second.to_vec()).unwrap();
    assert_eq!(card_count(&second), 3);
    assert!(second.contains("post number 00"));
    assert!(!second.contains("post number 03"));
}

#[actix_web::test]
async fn test_bad_page_numbers_fall_back() {
    let app = TestApp::with_cache_ttl(Duration::ZERO).await;
    let author = app.user("leo").await;
    for i in 0..13 {
        app.post(&author, None, &format!("post number {i:02}")).await;
    }
    let svc = init_app!(app);

    let garbage =
        test::call_and_read_body(&svc, test::TestRequest::get().uri("/?page=abc").to_request()).await;
    assert!(String::from_utf8(garbage.to_vec()).unwrap().contains("Page 1 of 2"));

    let beyond =
        test::call_and_read_body(&svc, test::TestRequest::get().uri("/?page=99").to_request()).await;
    let beyond = String::from_utf8(beyond.to_vec()).unwrap();
    assert!(beyond.contains("Page 2 of 2"));
    assert_eq!(card_count(&beyond), 3);

    for uri in ["/?page=0", "/?page=-1"] {
        let body = test::call_and_read_body(&svc, test::TestRequest::get().uri(uri).to_request()).await;
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Page 2 of 2"), "{uri}");
        assert_eq!(card_count(&body), 3, "{uri}");
    }
}

#[actix_web::test]
async fn test_index_is_served_from_cache_within_ttl() {
    let app = TestApp::new().await;
    let author = app.user("leo").await;
    app.post(&author, None, "soon to be gone").await;
    let svc = init_app!(app);

    let before = test::call_and_read_body(&svc, test::TestRequest::get().uri("/").to_request()).await;
    assert!(String::from_utf8(before.to_vec()).unwrap().contains("soon to be gone"));

    sqlx::query("DELETE FROM posts")
        .execute(app.repo.pool())
        .await
        .unwrap();

    let after = test::call_and_read_body(&svc, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(before, after);

    // Other pages are rendered fresh.
    let profile =
        test::call_and_read_body(&svc, test::TestRequest::get().uri("/profile/leo/").to_request()).await;
    assert!(!String::from_utf8(profile.to_vec()).unwrap().contains("soon to be gone"));
}

#[actix_web::test]
async fn test_unrelated_query_parameters_share_the_cache_entry() {
    let app = TestApp::new().await;
    let author = app.user("leo").await;
    app.post(&author, None, "first post").await;
    let svc = init_app!(app);

    for i in 0..50 {
        let uri = format!("/?junk={i}");
        test::call_service(&svc, test::TestRequest::get().uri(&uri).to_request()).await;
    }
    test::call_service(&svc, test::TestRequest::get().uri("/?page=1").to_request()).await;
    assert_eq!(app.state.index_cache.len(), 1);
}

#[actix_web::test]
async fn test_index_cache_is_kept_per_viewer() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let svc = init_app!(app);

    let anonymous = test::call_and_read_body(&svc, test::TestRequest::get().uri("/").to_request()).await;
    let logged_in = test::call_and_read_body(
        &svc,
        test::TestRequest::get().uri("/").cookie(app.session(&leo)).to_request(),
    )
    .await;
    let logged_in = String::from_utf8(logged_in.to_vec()).unwrap();
    assert!(logged_in.contains("/auth/logout/"));
    assert!(!String::from_utf8(anonymous.to_vec()).unwrap().contains("/auth/logout/"));
}

#[actix_web::test]
async fn test_unknown_group_is_not_found() {
    let app = TestApp::new().await;
    let svc = init_app!(app);

    let resp = test::call_service(&svc, test::TestRequest::get().uri("/group/nope/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_of(resp).await.contains("group nope"));
}

#[actix_web::test]
async fn test_unknown_profile_is_not_found() {
    let app = TestApp::new().await;
    let svc = init_app!(app);

    let resp = test::call_service(&svc, test::TestRequest::get().uri("/profile/ghost/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;
    let svc = init_app!(app);

    let resp =
        test::call_service(&svc, test::TestRequest::get().uri("/unexisting_page/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_of(resp).await.contains("/unexisting_page/"));
}

#[actix_web::test]
async fn test_unknown_auth_route_is_not_found() {
    let app = TestApp::new().await;
    let svc = init_app!(app);

    let resp = test::call_service(&svc, test::TestRequest::get().uri("/auth/nope/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_of(resp).await.contains("/auth/nope/"));
}

#[actix_web::test]
async fn test_profile_shows_follow_link_to_other_users_only() {
    let app = TestApp::new().await;
    let leo = app.user("leo").await;
    let mia = app.user("mia").await;
    app.post(&leo, None, "hello").await;
    let svc = init_app!(app);

    let other = test::call_and_read_body(
        &svc,
        test::TestRequest::get().uri("/profile/leo/").cookie(app.session(&mia)).to_request(),
    )
    .await;
    let other = String::from_utf8(other.to_vec()).unwrap();
    assert!(other.contains("/profile/leo/follow/"));
    assert!(other.contains("Posts: 1"));

    let own = test::call_and_read_body(
        &svc,
        test::TestRequest::get().uri("/profile/leo/").cookie(app.session(&leo)).to_request(),
    )
    .await;
    assert!(!String::from_utf8(own.to_vec()).unwrap().contains("/profile/leo/follow/"));

    let anonymous =
        test::call_and_read_body(&svc, test::TestRequest::get().uri("/profile/leo/").to_request()).await;
    assert!(!String::from_utf8(anonymous.to_vec()).unwrap().contains("/profile/leo/follow/"));
}

#[actix_web::test]
async fn test_follow_feed_requires_login() {
    let app = TestApp::new().await;
    let svc = init_app!(app);

    let resp = test::call_service(&svc, test::TestRequest::get().uri("/follow/?page=2").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        common::location(&resp),
        "/auth/login/?next=/follow/%3Fpage%3D2"
    );
}
