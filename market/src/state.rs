// galleria-market/src/state.rs
use crate::activity::{ActivityLogger, PgActivityLog};
use crate::config::{AppConfig, StoreBackend};
use crate::errors::{MarketError, Result};
use crate::manager::OrderCartManager;
use crate::store::{MarketStore, MemoryStore, PgStore};
use std::sync::Arc;
use tracing::{info, instrument};

/// Shared with every request handler through `web::Data`.
#[derive(Clone)]
pub struct MarketState {
  pub manager: Arc<OrderCartManager>,
  pub config: Arc<AppConfig>,
}

impl MarketState {
  pub fn new(manager: OrderCartManager, config: AppConfig) -> Self {
    Self {
      manager: Arc::new(manager),
      config: Arc::new(config),
    }
  }

  /// Connects the configured store and wires the manager on top of it.
  #[instrument(name = "MarketState::from_config", skip_all, fields(backend = ?config.store_backend), err(Display))]
  pub async fn from_config(config: AppConfig) -> Result<Self> {
    let (store, activity): (Arc<dyn MarketStore>, Arc<dyn ActivityLogger>) = match config.store_backend {
      StoreBackend::Postgres => {
        let url = config
          .database_url
          .as_deref()
          .ok_or_else(|| MarketError::Config("DATABASE_URL is not set".to_string()))?;
        let pg = PgStore::connect(url, config.db_max_connections).await?;
        if config.run_migrations {
          pg.migrate().await?;
        }
        let activity = Arc::new(PgActivityLog::new(pg.pool().clone()));
        (Arc::new(pg), activity)
      }
      StoreBackend::Memory => {
        let memory = MemoryStore::new();
        (Arc::new(memory.clone()), Arc::new(memory))
      }
    };
    info!(backend = store.backend(), "Store ready.");
    Ok(Self::new(OrderCartManager::new(store, activity), config))
  }
}
