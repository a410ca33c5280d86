use super::*;
use axum::http::HeaderValue;
use shared::domain::Role;

fn leader() -> Identity {
    Identity::new("lina", Role::Leader)
}

#[tokio::test]
async fn created_session_resolves_to_identity() {
    let store = SessionStore::new(60);
    let id = store.create(leader()).await;
    assert_eq!(store.lookup(&id).await, Some(leader()));
    assert_eq!(store.lookup("unknown").await, None);
}

#[tokio::test]
async fn expired_session_is_evicted_on_lookup() {
    let store = SessionStore::new(60);
    let start = Utc::now();
    let id = store.create_at(leader(), start).await;

    assert!(store.lookup_at(&id, start + Duration::seconds(59)).await.is_some());
    assert!(store.lookup_at(&id, start + Duration::seconds(60)).await.is_none());
    assert!(!store.destroy(&id).await, "entry should already be gone");
}

#[tokio::test]
async fn destroy_ends_the_session() {
    let store = SessionStore::new(60);
    let id = store.create(leader()).await;
    assert!(store.destroy(&id).await);
    assert_eq!(store.lookup(&id).await, None);
}

#[tokio::test]
async fn purge_removes_only_expired_entries() {
    let store = SessionStore::new(60);
    let start = Utc::now();
    store.create_at(leader(), start - Duration::seconds(120)).await;
    let live = store.create_at(leader(), start).await;

    assert_eq!(store.purge_expired_at(start).await, 1);
    assert!(store.lookup_at(&live, start).await.is_some());
}

#[tokio::test]
async fn session_cookie_is_found_among_others() {
    let store = SessionStore::new(60);
    let id = store.create(leader()).await;

    let mut headers = HeaderMap::new();
    headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
    headers.append(
        header::COOKIE,
        HeaderValue::from_str(&format!("lang=en; {SESSION_COOKIE}={id}")).expect("header"),
    );

    assert_eq!(session_id_from_headers(&headers), Some(id));
    assert_eq!(store.identity_from_headers(&headers).await, Some(leader()));
}

#[test]
fn cookies_carry_ttl_and_expiry() {
    let store = SessionStore::new(86_400);
    let cookie = store.cookie("abc");
    assert!(cookie.starts_with("iot_sid=abc;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(SessionStore::expired_cookie().contains("Max-Age=0"));

    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("iot_sid="));
    assert_eq!(session_id_from_headers(&headers), None);
}
