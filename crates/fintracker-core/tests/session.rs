//! Integration tests for the session controller lifecycle.

mod fixtures;

use fintracker_core::auth::CredentialPair;
use fintracker_core::models::Identity;
use fintracker_core::navigation::Route;
use fintracker_core::SessionPhase;
use fixtures::{bearer, identity, tokens, unauthorized, Harness};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn user(id: &str, email: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: email.to_string(),
        name: None,
    }
}

async fn mount_login(h: &Harness, access: &str, refresh: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "secret1"})))
        .respond_with(tokens(access, refresh))
        .expect(1)
        .mount(&h.server)
        .await;
}

#[tokio::test]
async fn test_startup_with_valid_credential_is_authenticated() {
    let mut h = Harness::new(Some(("a1", "r1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", bearer("a1").as_str()))
        .respond_with(identity("u1", "a@b.com"))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    assert_eq!(session.phase(), SessionPhase::Initializing);

    let phase = session.initialize().await;

    assert_eq!(phase, SessionPhase::Authenticated(user("u1", "a@b.com")));
    assert_eq!(session.identity(), Some(user("u1", "a@b.com")));
    assert!(h.redirects().is_empty());
}

#[tokio::test]
async fn test_startup_with_expired_credential_uses_retried_identity() {
    let mut h = Harness::new(Some(("a1", "r1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", bearer("a1").as_str()))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(tokens("a2", "r2"))
        .expect(1)
        .mount(&h.server)
        .await;
    // Only the retried call; no separate identity round trip afterwards
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", bearer("a2").as_str()))
        .respond_with(identity("u1", "a@b.com"))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    let phase = session.initialize().await;

    assert_eq!(phase, SessionPhase::Authenticated(user("u1", "a@b.com")));
    assert_eq!(h.stored_pair(), Some(CredentialPair::new("a2", "r2")));
    assert!(h.redirects().is_empty());
}

#[tokio::test]
async fn test_startup_with_unrenewable_credential_is_anonymous() {
    let mut h = Harness::new(Some(("a1", "r1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(unauthorized())
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();

    assert_eq!(session.initialize().await, SessionPhase::Anonymous);
    assert!(h.store_is_empty());
    assert_eq!(h.redirects(), vec![Route::SignIn]);
}

#[tokio::test]
async fn test_startup_with_server_error_clears_credentials() {
    let h = Harness::new(Some(("a1", "r1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Internal server error"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();

    assert_eq!(session.initialize().await, SessionPhase::Anonymous);
    assert!(h.store_is_empty());
}

#[tokio::test]
async fn test_startup_without_credentials_makes_no_request() {
    let h = Harness::new(None).await;
    let session = h.session();

    assert_eq!(session.initialize().await, SessionPhase::Anonymous);
    assert_eq!(h.request_count().await, 0);
}

#[tokio::test]
async fn test_concurrent_initialize_resolves_once() {
    let h = Harness::new(Some(("a1", "r1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(identity("u1", "a@b.com"))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    let (first, second) = futures::join!(session.initialize(), session.initialize());

    assert_eq!(first, SessionPhase::Authenticated(user("u1", "a@b.com")));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_sign_in_stores_credentials_then_authenticates() {
    let h = Harness::new(None).await;
    mount_login(&h, "a1", "r1").await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", bearer("a1").as_str()))
        .respond_with(identity("u1", "a@b.com"))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    session.initialize().await;
    let mut rx = session.subscribe();

    let signed_in = session.sign_in("a@b.com", "secret1").await.unwrap();

    assert_eq!(signed_in, user("u1", "a@b.com"));
    assert_eq!(h.stored_pair(), Some(CredentialPair::new("a1", "r1")));

    // Exactly one transition, straight to a populated identity
    assert!(rx.has_changed().unwrap());
    assert_eq!(
        *rx.borrow_and_update(),
        SessionPhase::Authenticated(user("u1", "a@b.com"))
    );
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_sign_in_with_wrong_password_stays_anonymous() {
    let mut h = Harness::new(None).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid credentials"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(tokens("a2", "r2"))
        .expect(0)
        .mount(&h.server)
        .await;

    let session = h.session();
    session.initialize().await;

    let err = session.sign_in("a@b.com", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(session.phase(), SessionPhase::Anonymous);
    assert!(h.store_is_empty());
    assert!(h.redirects().is_empty());
}

#[tokio::test]
async fn test_sign_in_without_server_message_uses_generic_message() {
    let h = Harness::new(None).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    session.initialize().await;

    let err = session.sign_in("a@b.com", "secret1").await.unwrap_err();

    assert_eq!(err.to_string(), fintracker_core::api::GENERIC_ERROR_MESSAGE);
    assert_eq!(session.phase(), SessionPhase::Anonymous);
}

#[tokio::test]
async fn test_sign_in_identity_failure_does_not_authenticate() {
    let h = Harness::new(None).await;
    mount_login(&h, "a1", "r1").await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    session.initialize().await;

    assert!(session.sign_in("a@b.com", "secret1").await.is_err());
    assert_eq!(session.phase(), SessionPhase::Anonymous);
    assert!(h.store_is_empty());
}

#[tokio::test]
async fn test_sign_in_identity_failure_ends_existing_session() {
    let h = Harness::new(Some(("a0", "r0"))).await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", bearer("a0").as_str()))
        .respond_with(identity("u0", "old@b.com"))
        .expect(1)
        .mount(&h.server)
        .await;
    mount_login(&h, "a1", "r1").await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("authorization", bearer("a1").as_str()))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    assert_eq!(
        session.initialize().await,
        SessionPhase::Authenticated(user("u0", "old@b.com"))
    );

    assert!(session.sign_in("a@b.com", "secret1").await.is_err());
    assert_eq!(session.phase(), SessionPhase::Anonymous);
    assert!(h.store_is_empty());
}

#[tokio::test]
async fn test_sign_up_leaves_session_unchanged() {
    let h = Harness::new(None).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({"email": "a@b.com", "password": "secret1", "name": "Ana"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "u1", "email": "a@b.com", "name": "Ana"
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    session.initialize().await;

    let created = session
        .sign_up("a@b.com", "secret1", Some("Ana"))
        .await
        .unwrap();

    assert_eq!(created.name.as_deref(), Some("Ana"));
    assert_eq!(session.phase(), SessionPhase::Anonymous);
    assert!(h.store_is_empty());
}

#[tokio::test]
async fn test_sign_up_rejection_is_surfaced() {
    let h = Harness::new(None).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Email already registered"})),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    let err = session.sign_up("a@b.com", "secret1", None).await.unwrap_err();

    assert_eq!(err.to_string(), "Email already registered");
}

#[tokio::test]
async fn test_sign_out_is_local_and_immediate() {
    let h = Harness::new(Some(("a1", "r1"))).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(identity("u1", "a@b.com"))
        .expect(1)
        .mount(&h.server)
        .await;

    let session = h.session();
    session.initialize().await;
    let before = h.request_count().await;

    session.sign_out();

    assert_eq!(session.phase(), SessionPhase::Anonymous);
    assert!(h.store_is_empty());
    assert_eq!(h.request_count().await, before);
}
