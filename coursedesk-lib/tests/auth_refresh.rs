//! Token refresh behavior of the admin client against a scripted backend.

mod common;

use common::FakeBackend;
use common::REFRESH_PATH;
use common::client_at;
use coursedesk_lib::Error;
use coursedesk_lib::api::ListQuery;
use coursedesk_lib::api::Resource;
use coursedesk_lib::error::ApiError;
use coursedesk_lib::error::AuthError;
use coursedesk_lib::model::UserProfile;
use futures::future::join_all;
use serde_json::Value;
use serde_json::json;

// =============================================================================
// Single-flight refresh
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_concurrent_unauthorized_share_one_refresh() {
    let backend = FakeBackend::new("fresh", "fresh");
    let (client, navigator) = client_at(&backend, Some("stale"), "/admin/users").await;

    let paths: Vec<String> = (0..5).map(|i| format!("/api/roles/{}", i)).collect();
    let results = join_all(paths.iter().map(|p| client.get::<Value>(p))).await;

    for (result, path) in results.into_iter().zip(&paths) {
        assert_eq!(result.unwrap()["path"], path.as_str());
    }
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(client.session().token().as_deref(), Some("fresh"));
    assert!(navigator.history().is_empty());

    // Every request went out once with the stale token and once replayed.
    for path in &paths {
        let sent: Vec<_> = backend
            .requests_to(path)
            .into_iter()
            .map(|r| r.bearer)
            .collect();
        assert_eq!(sent, vec![Some("stale".to_string()), Some("fresh".to_string())]);
    }
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_rejects_all_and_redirects() {
    let backend = FakeBackend::new("fresh", "fresh");
    backend.fail_refresh();
    let (client, navigator) = client_at(&backend, Some("stale"), "/admin/users").await;

    let results = join_all((0..3).map(|_| client.get::<Value>("/api/users"))).await;

    for result in results {
        let err = result.unwrap_err();
        assert!(err.requires_login(), "unexpected error: {}", err);
    }
    assert_eq!(backend.refresh_calls(), 1);
    assert!(client.session().token().is_none());
    assert!(!client.restore_session().await.unwrap());
    assert_eq!(navigator.history(), vec!["/login".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_failure_outside_admin_does_not_redirect() {
    let backend = FakeBackend::new("fresh", "fresh");
    backend.fail_refresh();
    let (client, navigator) = client_at(&backend, Some("stale"), "/courses/intro").await;

    let err = client.get::<Value>("/api/courses").await.unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
    assert!(client.session().token().is_none());
    assert!(navigator.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_endpoint_unauthorized_does_not_loop() {
    let backend = FakeBackend::new("fresh", "fresh");
    backend.fail_refresh();
    let (client, navigator) = client_at(&backend, Some("stale"), "/admin").await;

    let err = client
        .post::<Value>(REFRESH_PATH, &json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::SessionExpired)));
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(backend.refresh_calls(), 1);
    assert!(client.session().token().is_none());
    assert_eq!(navigator.history(), vec!["/login".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_call_carries_no_bearer() {
    let backend = FakeBackend::new("fresh", "fresh");
    let (client, _navigator) = client_at(&backend, Some("stale"), "/admin").await;

    client.get::<Value>("/api/medias").await.unwrap();

    let refresh = backend.requests_to(REFRESH_PATH);
    assert_eq!(refresh.len(), 1);
    assert!(refresh[0].bearer.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_replayed_request_is_not_refreshed_again() {
    let backend = FakeBackend::new("fresh", "fresh");
    backend.reject_all_tokens();
    let (client, _navigator) = client_at(&backend, Some("stale"), "/admin").await;

    let err = client.get::<Value>("/api/users").await.unwrap_err();

    assert_eq!(err.status_code(), Some(401));
    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.requests_to("/api/users").len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_later_requests_use_refreshed_token() {
    let backend = FakeBackend::new("fresh", "fresh");
    let (client, _navigator) = client_at(&backend, Some("stale"), "/admin").await;

    client.get::<Value>("/api/roles").await.unwrap();
    client.get::<Value>("/api/roles").await.unwrap();

    assert_eq!(backend.refresh_calls(), 1);
    assert_eq!(backend.requests_to("/api/roles").len(), 3);
}

// =============================================================================
// Login, logout and plain requests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_login_then_list_users() {
    let backend = FakeBackend::new("none", "none");
    let (client, _navigator) = client_at(&backend, None, "/login").await;

    let user = client.login("ada@example.com", "secret").await.unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.role_label().as_deref(), Some("admin"));
    assert_eq!(client.current_user().map(|u| u.id), Some("u1".to_string()));
    assert_eq!(client.session().token().as_deref(), Some("login-token"));

    let query = ListQuery::new(0, 20).search("ada").search_fields(&["email"]);
    let page = client
        .list::<UserProfile>(Resource::Users, &query)
        .await
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.total(), 42);

    let sent = backend.requests_to("/api/users");
    assert_eq!(
        sent[0].url.query(),
        Some("page=1&limit=20&search=ada&searchFields=email")
    );
    assert_eq!(backend.refresh_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_login_rejected_without_refresh() {
    let backend = FakeBackend::new("none", "none");
    let (client, _navigator) = client_at(&backend, None, "/login").await;

    let err = client.login("ada@example.com", "wrong").await.unwrap_err();

    match err {
        Error::Auth(AuthError::InvalidCredentials { message }) => {
            assert_eq!(message, "Invalid email or password");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(backend.refresh_calls(), 0);
    assert!(client.current_user().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_logout_clears_session() {
    let backend = FakeBackend::new("none", "none");
    let (client, _navigator) = client_at(&backend, None, "/admin").await;
    client.login("ada@example.com", "secret").await.unwrap();

    client.logout().await.unwrap();

    assert!(client.session().token().is_none());
    assert!(client.current_user().is_none());
    assert_eq!(backend.requests_to("/api/auth/logout").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_errors_are_not_retried() {
    let backend = FakeBackend::new("stale", "fresh");
    let (client, navigator) = client_at(&backend, Some("stale"), "/admin/users").await;
    backend.go_offline();

    let err = client.get::<Value>("/api/users").await.unwrap_err();

    assert!(matches!(err, Error::Api(ApiError::Transport(_))), "unexpected error: {}", err);
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(backend.refresh_calls(), 0);
    assert_eq!(client.session().token().as_deref(), Some("stale"));
    assert!(navigator.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_business_errors_pass_through() {
    let backend = FakeBackend::new("token", "token");
    let (client, _navigator) = client_at(&backend, Some("token"), "/admin/courses").await;

    let err = client
        .patch::<Value>("/api/courses/c1", &json!({ "title": "" }))
        .await
        .unwrap_err();

    match err {
        Error::Api(ApiError::Http { status, message, body }) => {
            assert_eq!(status, 422);
            assert_eq!(message, "Title is required");
            assert!(body.is_some());
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(backend.refresh_calls(), 0);
}
