use crate::config::SessionConfig;
use crate::database::session::SessionStore;
use crate::error::app_error::AppError;
use crate::models::session::Session;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use rand::Rng;
use rocket::http::{Cookie, SameSite};
use sha2::Sha256;
use std::fmt;
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// `__Host-` prefix: the browser only accepts it with Secure, Path=/ and no Domain.
pub const SESSION_COOKIE: &str = "__Host-sn_session";

const SESSION_ID_BYTES: usize = 32;
const MIN_SECRET_LEN: usize = 32;

/// Client-held bearer credential: `<session id>.<base64url HMAC-SHA256 of the id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub session_id: String,
    pub signature: String,
}

impl SessionToken {
    /// Splits on the first `.`. Both halves must be non-empty.
    pub fn parse(value: &str) -> Option<Self> {
        let (session_id, signature) = value.split_once('.')?;
        if session_id.is_empty() || signature.is_empty() {
            return None;
        }

        Some(Self {
            session_id: session_id.to_string(),
            signature: signature.to_string(),
        })
    }

    pub fn encode(&self) -> String {
        format!("{}.{}", self.session_id, self.signature)
    }
}

/// Mints, verifies and revokes admin sessions.
///
/// Holds the keyed HMAC and the session lifetime; the store and the current
/// instant are passed into every call so tests can use fixture stores and clocks.
#[derive(Clone)]
pub struct SessionAuthenticator {
    mac: HmacSha256,
    ttl: Duration,
}

impl fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAuthenticator").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl SessionAuthenticator {
    pub fn new(config: &SessionConfig) -> Result<Self, AppError> {
        if config.secret.is_empty() {
            return Err(AppError::configuration("Session secret is not configured"));
        }
        if config.ttl_seconds <= 0 {
            return Err(AppError::configuration("Session TTL must be positive"));
        }
        if config.secret.len() < MIN_SECRET_LEN {
            warn!(min_len = MIN_SECRET_LEN, "session secret is shorter than recommended");
        }

        let mac = HmacSha256::new_from_slice(config.secret.as_bytes()).map_err(|e| AppError::configuration(format!("Invalid session secret: {e}")))?;

        Ok(Self {
            mac,
            ttl: Duration::seconds(config.ttl_seconds),
        })
    }

    pub fn sign(&self, session_id: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(session_id.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    /// Constant-time check of the supplied signature against the id it claims to sign.
    fn signature_matches(&self, token: &SessionToken) -> bool {
        let Ok(supplied) = URL_SAFE_NO_PAD.decode(&token.signature) else {
            return false;
        };

        let mut mac = self.mac.clone();
        mac.update(token.session_id.as_bytes());
        mac.verify_slice(&supplied).is_ok()
    }

    /// Persists a new session and returns the cookie carrying its signed token.
    pub async fn issue(&self, store: &dyn SessionStore, now: DateTime<Utc>) -> Result<Cookie<'static>, AppError> {
        let session = Session::new(generate_session_id(), now, self.ttl);
        store.insert_session(&session).await?;

        let token = SessionToken {
            signature: self.sign(&session.id),
            session_id: session.id,
        };

        info!(expires_at = %session.expires_at, "admin session issued");

        Ok(self.session_cookie(token.encode()))
    }

    /// `cookie` is the value of the session cookie, if the request carried one.
    /// `Ok(true)` only when the token parses, its signature matches and a live row exists.
    /// Store failures are returned as errors and must never be read as success.
    pub async fn verify(&self, store: &dyn SessionStore, cookie: Option<&str>, now: DateTime<Utc>) -> Result<bool, AppError> {
        let Some(token) = cookie.and_then(SessionToken::parse) else {
            debug!(reason = "missing_or_malformed", "session rejected");
            return Ok(false);
        };

        if !self.signature_matches(&token) {
            debug!(reason = "bad_signature", "session rejected");
            return Ok(false);
        }

        let live = store.find_live_session(&token.session_id, now).await?.is_some();
        if !live {
            debug!(reason = "unknown_or_expired", "session rejected");
        }

        Ok(live)
    }

    /// Deletes the session named by the cookie, if any, and returns the cookie that clears it.
    /// Logout always succeeds from the client's side; a row left behind by a store failure is swept later.
    pub async fn revoke(&self, store: &dyn SessionStore, cookie: Option<&str>) -> Cookie<'static> {
        if let Some(token) = cookie.and_then(SessionToken::parse) {
            match store.delete_session(&token.session_id).await {
                Ok(()) => info!("admin session revoked"),
                Err(err) => warn!(error = ?err, "failed to delete session on logout"),
            }
        }

        clearing_cookie()
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(rocket::time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }
}

pub fn clearing_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(rocket::time::Duration::ZERO)
        .build()
}

fn generate_session_id() -> String {
    let bytes: [u8; SESSION_ID_BYTES] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

/// Deletes every session whose expiry has passed. Safe to run repeatedly and alongside request traffic.
pub async fn sweep_expired_sessions(store: &dyn SessionStore, now: DateTime<Utc>) -> Result<u64, AppError> {
    let removed = store.delete_expired_sessions(now).await?;
    info!(removed, "expired sessions swept");
    Ok(removed)
}
