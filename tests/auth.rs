//! HTTP tests for sign-up, login and logout

mod common;

use axum::http::{header, HeaderValue, StatusCode};
use common::{location, TestApp};

const PASSWORD: &str = "correct-horse-42";

fn session_from(response: &axum_test::TestResponse) -> HeaderValue {
    let set_cookie = response.header("set-cookie");
    let pair = set_cookie
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    HeaderValue::from_str(&pair).unwrap()
}

#[tokio::test]
async fn test_auth_pages_are_public() {
    let app = TestApp::new().await;
    for path in ["/auth/signup/", "/auth/login/", "/auth/logout/"] {
        assert_eq!(app.get_as(path, None).await.status_code(), StatusCode::OK, "{}", path);
    }
}

#[tokio::test]
async fn test_signup_then_login_returns_to_next() {
    let app = TestApp::new().await;

    let response = app
        .post_as(
            "/auth/signup/",
            None,
            &[("username", "newcomer"), ("password1", PASSWORD), ("password2", PASSWORD)],
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/");

    let response = app
        .post_as(
            "/auth/login/",
            None,
            &[("username", "newcomer"), ("password", PASSWORD), ("next", "/notes/add/")],
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/notes/add/");

    let cookie = session_from(&response);
    let page = app
        .server
        .get("/notes/add/")
        .add_header(header::COOKIE, cookie)
        .await;
    assert_eq!(page.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_signup_rejects_duplicate_and_mismatch() {
    let app = TestApp::new().await;
    app.create_user("taken").await;

    let response = app
        .post_as(
            "/auth/signup/",
            None,
            &[("username", "taken"), ("password1", PASSWORD), ("password2", "different-1")],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let page = response.text();
    assert!(page.contains(r#"id="signup-form""#));
    assert_eq!(page.matches(r#"class="error""#).count(), 2);
}

#[tokio::test]
async fn test_wrong_password_rerenders_login() {
    let app = TestApp::new().await;
    app.post_as(
        "/auth/signup/",
        None,
        &[("username", "member"), ("password1", PASSWORD), ("password2", PASSWORD)],
    )
    .await;

    let response = app
        .post_as("/auth/login/", None, &[("username", "member"), ("password", "wrong-password")])
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.maybe_header("set-cookie").is_none());
    assert!(response.text().contains(r#"class="error""#));
}

#[tokio::test]
async fn test_login_ignores_offsite_next() {
    let app = TestApp::new().await;
    app.post_as(
        "/auth/signup/",
        None,
        &[("username", "member"), ("password1", PASSWORD), ("password2", PASSWORD)],
    )
    .await;

    let response = app
        .post_as(
            "/auth/login/",
            None,
            &[("username", "member"), ("password", PASSWORD), ("next", "//evil.example/")],
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/news/");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new().await;
    let user = app.create_user("member").await;
    let (name, cookie) = app.login(&user).await;

    let response = app
        .server
        .post("/auth/logout/")
        .add_header(name.clone(), cookie.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response
        .header("set-cookie")
        .to_str()
        .unwrap()
        .contains("Max-Age=0"));

    let response = app
        .server
        .get("/notes/list/")
        .add_header(name, cookie)
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login/?next=/notes/list/");
}

#[tokio::test]
async fn test_unknown_session_is_anonymous() {
    let app = TestApp::new().await;
    let response = app
        .server
        .get("/notes/list/")
        .add_header(header::COOKIE, HeaderValue::from_static("session=no-such-session"))
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
}
