use axum::http::{header, HeaderMap};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sid";

/// How long a session stays valid after login.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct Session {
    email: String,
    created: Instant,
}

/// Maps opaque session tokens to the email of the signed-in user.
/// Sessions older than the TTL are treated as absent and dropped on the next login.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self, email: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.write().await;
        let ttl = self.ttl;
        sessions.retain(|_, session| session.created.elapsed() < ttl);
        sessions.insert(
            token.clone(),
            Session {
                email: email.to_string(),
                created: Instant::now(),
            },
        );
        token
    }

    pub async fn email(&self, token: &str) -> Option<String> {
        self.sessions
            .read()
            .await
            .get(token)
            .filter(|session| session.created.elapsed() < self.ttl)
            .map(|session| session.email.clone())
    }

    pub async fn remove(&self, token: &str) -> Option<String> {
        self.sessions.write().await.remove(token).map(|session| session.email)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

pub fn session_cookie(token: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

pub fn expired_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}

/// Pulls the session token out of any `Cookie` header.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = SessionStore::default();
        let token = store.create("jane@example.com").await;
        assert_eq!(store.email(&token).await.as_deref(), Some("jane@example.com"));
        assert_eq!(store.len().await, 1);

        store.remove(&token).await;
        assert!(store.email(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_rejected_and_evicted() {
        let store = SessionStore::with_ttl(Duration::ZERO);
        let first = store.create("jane@example.com").await;
        assert!(store.email(&first).await.is_none());

        store.create("john@example.com").await;
        store.create("jane@example.com").await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_session_expires_after_ttl() {
        let store = SessionStore::with_ttl(Duration::from_millis(200));
        let token = store.create("jane@example.com").await;
        assert!(store.email(&token).await.is_some());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(store.email(&token).await.is_none());
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; sid=abc123; lang=en"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sid="));
        assert!(token_from_headers(&headers).is_none());

        assert!(token_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_cookie_format() {
        assert!(session_cookie("abc").starts_with("sid=abc;"));
        assert!(expired_cookie().contains("Max-Age=0"));
    }
}
