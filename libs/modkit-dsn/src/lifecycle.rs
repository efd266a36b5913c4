//! Start/stop hooks for an opened handle.
//!
//! `open` builds a lazy pool, so nothing has talked to the server yet.
//! [`start`] runs one liveness probe bounded by a timeout; [`stop`] closes
//! the pool and waits for checked-out connections to come back.

use std::time::Duration;

use crate::{DbError, DbHandle, Result};

/// Probe liveness within `timeout`.
#[tracing::instrument(skip(handle, timeout), fields(driver = handle.driver_name()), level = "debug")]
pub async fn start(handle: &DbHandle, timeout: Duration) -> Result<()> {
    tracing::info!(dsn = handle.dsn(), "starting database");
    match tokio::time::timeout(timeout, handle.ping()).await {
        Ok(Ok(())) => {
            tracing::info!("database started");
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "database liveness probe failed");
            Err(e)
        }
        Err(_) => {
            tracing::error!(?timeout, "database liveness probe timed out");
            Err(DbError::PingTimeout(timeout))
        }
    }
}

/// Close the pool.
#[tracing::instrument(skip(handle), fields(driver = handle.driver_name()), level = "debug")]
pub async fn stop(handle: DbHandle) {
    tracing::info!("stopping database");
    handle.close().await;
    tracing::info!("database stopped");
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::DbConfig;

    #[tokio::test]
    async fn test_start_and_stop_in_memory() {
        let cfg = DbConfig {
            url: "sqlite::memory:".into(),
            ..Default::default()
        };
        let handle = crate::open(&cfg).unwrap();
        start(&handle, Duration::from_secs(5)).await.unwrap();

        let pool = handle.sqlx_sqlite().unwrap().clone();
        stop(handle).await;
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn test_start_fails_on_unreachable_file() {
        let dir = tempfile::tempdir().unwrap();
        // read-only open of a file that does not exist
        let url = format!(
            "sqlite3://{}?mode=ro",
            dir.path().join("missing.db").display()
        );
        let handle = crate::open(&DbConfig {
            url,
            ..Default::default()
        })
        .unwrap();

        let err = start(&handle, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx(_)), "unexpected error: {err:?}");
    }
}
