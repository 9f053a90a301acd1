use chrono::{DateTime, Duration, Utc};

/// Server-side session row. A session grants access while `expires_at` is in the future.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: String, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id,
            created_at,
            expires_at: created_at + ttl,
        }
    }
}
