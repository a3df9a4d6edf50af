//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::db::{CustomerRepository, OrderRepository, ProductRepository};
use crate::services::OrderService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: SqlitePool,
}

impl AppState {
    /// Build the shared state from loaded config and a connected pool.
    #[must_use]
    pub fn new(config: ServerConfig, pool: SqlitePool) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pool }),
        }
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Order service (validation + orchestration).
    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(&self.inner.pool)
    }

    /// Order repository (reads and direct updates).
    #[must_use]
    pub fn order_repo(&self) -> OrderRepository<'_> {
        OrderRepository::new(&self.inner.pool)
    }

    /// Customer repository.
    #[must_use]
    pub fn customer_repo(&self) -> CustomerRepository<'_> {
        CustomerRepository::new(&self.inner.pool)
    }

    /// Product repository.
    #[must_use]
    pub fn product_repo(&self) -> ProductRepository<'_> {
        ProductRepository::new(&self.inner.pool)
    }
}
