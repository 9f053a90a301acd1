use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::session::SharedSessionStore;
use crate::db::init_pool;
use crate::service::session::sweep_expired_sessions;
use chrono::Utc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
pub struct SweepSessionsResult {
    pub removed: u64,
}

/// One-shot sweep for external schedulers.
pub async fn sweep_sessions(config: &Config) -> Result<SweepSessionsResult, String> {
    let pool = init_pool(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repo = PostgresRepository { pool: pool.clone() };
    let removed = sweep_expired_sessions(&repo, Utc::now())
        .await
        .map_err(|err| format!("Failed to sweep expired sessions: {err:?}"));

    pool.close().await;

    Ok(SweepSessionsResult { removed: removed? })
}

/// Sweeps expired sessions every `interval_secs` for the lifetime of the process.
pub(crate) fn spawn_session_sweeper(store: SharedSessionStore, interval_secs: u64) {
    let period = Duration::from_secs(interval_secs.max(1));
    info!(interval_secs = period.as_secs(), "session sweeper started");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately; skip it so startup does not race migrations.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(err) = sweep_expired_sessions(store.as_ref(), Utc::now()).await {
                error!(error = ?err, "scheduled session sweep failed");
            }
        }
    });
}
