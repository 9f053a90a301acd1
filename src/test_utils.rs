use crate::config::SessionConfig;
use crate::database::session::SessionStore;
use crate::error::app_error::AppError;
use crate::models::session::Session;
use crate::service::session::SessionAuthenticator;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        secret: TEST_SECRET.to_string(),
        ..SessionConfig::default()
    }
}

pub fn test_authenticator() -> SessionAuthenticator {
    SessionAuthenticator::new(&test_session_config()).expect("valid test session config")
}

/// Session store backed by a map, with a counter of live-session lookups.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    lookups: AtomicUsize,
}

impl MemorySessionStore {
    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        self.sessions.lock().await.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_live_session(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(id).filter(|session| session.expires_at > now).cloned())
    }

    async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        self.sessions.lock().await.remove(id);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        // A session expiring exactly at `now` is neither live nor swept yet.
        sessions.retain(|_, session| session.expires_at >= now);
        Ok((before - sessions.len()) as u64)
    }
}

/// Store whose every call fails the way an unreachable database does.
pub struct FailingSessionStore;

#[async_trait::async_trait]
impl SessionStore for FailingSessionStore {
    async fn insert_session(&self, _session: &Session) -> Result<(), AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn find_live_session(&self, _id: &str, _now: DateTime<Utc>) -> Result<Option<Session>, AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn delete_session(&self, _id: &str) -> Result<(), AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }

    async fn delete_expired_sessions(&self, _now: DateTime<Utc>) -> Result<u64, AppError> {
        Err(sqlx::Error::PoolTimedOut.into())
    }
}
