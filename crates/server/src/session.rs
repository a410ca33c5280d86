use std::{collections::HashMap, sync::Arc};

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use shared::domain::Identity;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "iot_sid";
const MAX_TTL_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone)]
struct SessionEntry {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

/// Server-side session map keyed by the opaque id carried in the session cookie.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_seconds.clamp(1, MAX_TTL_SECONDS)),
        }
    }

    pub async fn create(&self, identity: Identity) -> String {
        self.create_at(identity, Utc::now()).await
    }

    pub(crate) async fn create_at(&self, identity: Identity, now: DateTime<Utc>) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(
            session_id.clone(),
            SessionEntry {
                identity,
                expires_at: now + self.ttl,
            },
        );
        session_id
    }

    pub async fn lookup(&self, session_id: &str) -> Option<Identity> {
        self.lookup_at(session_id, Utc::now()).await
    }

    pub(crate) async fn lookup_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<Identity> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_id) {
                Some(entry) if entry.expires_at > now => return Some(entry.identity.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.sessions.write().await.remove(session_id);
        None
    }

    pub async fn destroy(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Drops every expired session and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    pub(crate) async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }

    pub async fn identity_from_headers(&self, headers: &HeaderMap) -> Option<Identity> {
        let session_id = session_id_from_headers(headers)?;
        self.lookup(&session_id).await
    }

    pub fn cookie(&self, session_id: &str) -> String {
        format!(
            "{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.ttl.num_seconds()
        )
    }

    pub fn expired_cookie() -> String {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
