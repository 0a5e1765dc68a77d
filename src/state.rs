use axum::extract::FromRef;
use crate::config::Config;
use crate::gamification::XpRewards;
use crate::models::badge::BadgeCatalog;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub catalog: Arc<BadgeCatalog>,
    pub rewards: Arc<XpRewards>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config,
            catalog: Arc::new(BadgeCatalog::standard()),
            rewards: Arc::new(XpRewards::default()),
        }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<BadgeCatalog> {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for Arc<XpRewards> {
    fn from_ref(state: &AppState) -> Self {
        state.rewards.clone()
    }
}
