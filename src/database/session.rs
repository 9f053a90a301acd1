use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::session::Session;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Persistence for session rows. Single-row operations rely on the backend's own atomicity.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError>;
    /// Returns the session only if it exists and `expires_at > now`.
    async fn find_live_session(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>, AppError>;
    /// Deleting an unknown id is not an error.
    async fn delete_session(&self, id: &str) -> Result<(), AppError>;
    /// Removes every session with `expires_at < now` and returns how many were removed.
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

/// Store handle kept in Rocket managed state.
pub type SharedSessionStore = Arc<dyn SessionStore>;

#[async_trait::async_trait]
impl SessionStore for PostgresRepository {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, created_at, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&session.id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_live_session(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, created_at, expires_at
            FROM sessions
            WHERE id = $1
              AND expires_at > $2
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn delete_session(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1").bind(id).execute(&self.pool).await?;

        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < $1").bind(now).execute(&self.pool).await?;

        Ok(result.rows_affected())
    }
}
