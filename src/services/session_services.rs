// src/services/session_services.rs
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use actix_web::cookie::{Cookie, SameSite};
use log::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub issued_at: Instant,
}

/// Server-side session table: opaque token -> logged-in user.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            secure_cookies: true,
        }
    }

    /// Plain-HTTP development setups need this off or browsers drop the cookie.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    /// The cookie carrying `token` back to the client.
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .finish()
    }

    /// A cookie that makes the client forget its session.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut removal = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.secure_cookies)
            .same_site(SameSite::Lax)
            .finish();
        removal.make_removal();
        removal
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Session>> {
        self.sessions.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.sessions.write().unwrap_or_else(|p| p.into_inner())
    }

    fn is_expired(&self, session: &Session) -> bool {
        session.issued_at.elapsed() >= self.ttl
    }

    /// Start a session and return its token.
    pub fn issue(&self, user_id: i64, username: &str) -> String {
        self.purge_expired();

        let token = Uuid::new_v4().simple().to_string();
        self.write().insert(
            token.clone(),
            Session {
                user_id,
                username: username.to_string(),
                issued_at: Instant::now(),
            },
        );
        debug!("session issued for '{}'", username);
        token
    }

    /// Look up a live session. An expired one is dropped and reported as absent.
    pub fn resolve(&self, token: &str) -> Option<Session> {
        let session = self.read().get(token).cloned()?;
        if self.is_expired(&session) {
            self.write().remove(token);
            return None;
        }
        Some(session)
    }

    /// End a session. Returns whether it existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.write().remove(token).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, s| s.issued_at.elapsed() < self.ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }
}
