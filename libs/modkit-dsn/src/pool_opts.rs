//! Pool options application trait shared by every backend.

use sqlx::pool::PoolOptions;

use crate::PoolConfig;

/// Trait for applying [`PoolConfig`] to pool builders.
pub(crate) trait ApplyPoolOpts {
    /// Apply the pool limits in one pass.
    fn apply(self, cfg: &PoolConfig) -> Self;
}

impl<DB: sqlx::Database> ApplyPoolOpts for PoolOptions<DB> {
    fn apply(self, cfg: &PoolConfig) -> Self {
        if cfg.max_idle_conns > 0 {
            // min_connections is a floor that the pool fills eagerly, not a ceiling
            tracing::debug!(
                max_idle = cfg.max_idle_conns,
                "sqlx pools have no idle-connection ceiling, max_idle_conns not applied"
            );
        }
        self.max_connections(cfg.effective_max_open())
            .idle_timeout(cfg.idle_timeout())
            .max_lifetime(cfg.max_lifetime())
    }
}
