// galleria-market/src/store/unit_of_work.rs

//! `UnitOfWork`: the transaction scope shared by the steps of one pipeline run.
//!
//! A run opens it in its first transactional step and commits it in its last.
//! Whatever path leaves the run early (an error, a `Stop`, a panic that drops
//! the context) never commits, and the underlying `StoreTx` discards its
//! writes when it is rolled back or dropped.

use super::{MarketStore, StoreError, StoreResult, StoreTx};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMappedMutexGuard, OwnedMutexGuard};
use tracing::{event, Level};

pub type Slot = Option<Box<dyn StoreTx>>;

#[derive(Clone)]
pub struct UnitOfWork {
  store: Arc<dyn MarketStore>,
  slot: Arc<Mutex<Slot>>,
}

impl std::fmt::Debug for UnitOfWork {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("UnitOfWork").field("backend", &self.store.backend()).finish()
  }
}

impl UnitOfWork {
  /// A unit of work that has not opened its transaction yet.
  pub fn new(store: Arc<dyn MarketStore>) -> Self {
    Self {
      store,
      slot: Arc::new(Mutex::new(None)),
    }
  }

  /// Opens the transaction. Beginning twice is an error.
  pub async fn begin(&self) -> StoreResult<()> {
    let mut slot = self.slot.lock().await;
    if slot.is_some() {
      return Err(StoreError::AlreadyOpen);
    }
    *slot = Some(self.store.begin().await?);
    event!(Level::DEBUG, backend = self.store.backend(), "Transaction opened.");
    Ok(())
  }

  pub async fn is_open(&self) -> bool {
    self.slot.lock().await.is_some()
  }

  /// Exclusive access to the open transaction.
  ///
  /// Fails with `StoreError::Finished` when nothing is open.
  pub async fn tx(&self) -> StoreResult<OwnedMappedMutexGuard<Slot, Box<dyn StoreTx>>> {
    let guard = Arc::clone(&self.slot).lock_owned().await;
    OwnedMutexGuard::try_map(guard, |slot| slot.as_mut()).map_err(|_| StoreError::Finished)
  }

  pub async fn commit(&self) -> StoreResult<()> {
    let tx = self.slot.lock().await.take().ok_or(StoreError::Finished)?;
    tx.commit().await?;
    event!(Level::DEBUG, "Transaction committed.");
    Ok(())
  }

  /// Discards the open transaction, if any.
  pub async fn rollback(&self) -> StoreResult<()> {
    let open = self.slot.lock().await.take();
    if let Some(tx) = open {
      tx.rollback().await?;
      event!(Level::DEBUG, "Transaction rolled back.");
    }
    Ok(())
  }
}
