// galleria-market/src/manager.rs

//! `OrderCartManager`: the public face of the cart, checkout and deletion flows.
//!
//! Every mutating operation runs one registered pipeline over a fresh
//! `UnitOfWork`. Whatever that pipeline did not commit is rolled back before
//! the operation returns, whether it failed, stopped early or finished.

use crate::activity::ActivityLogger;
use crate::errors::{MarketError, Result};
use crate::identity::AuthenticatedUser;
use crate::models::{Address, AddressSelection, CartView, OrderDetail, OrderSummary};
use crate::pipelines::contexts::{
  AddToCartCtxData, CascadeCtxData, CheckoutCtxData, RemoveItemCtxData, Transactional, UpdateCartCtxData,
};
use crate::pipelines::register_all_pipelines;
use crate::store::{CascadeReport, CascadeTarget, MarketStore, UnitOfWork};
use galleria_flow::{ContextData, FlowRegistry, PipelineResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddToCartOutcome {
  pub cart_item_count: i64,
  /// The artwork was already in the cart and nothing changed.
  pub already_in_cart: bool,
}

pub struct OrderCartManager {
  store: Arc<dyn MarketStore>,
  activity: Arc<dyn ActivityLogger>,
  flows: FlowRegistry<MarketError>,
}

impl OrderCartManager {
  pub fn new(store: Arc<dyn MarketStore>, activity: Arc<dyn ActivityLogger>) -> Self {
    let flows = FlowRegistry::new();
    register_all_pipelines(&flows);
    Self { store, activity, flows }
  }

  pub fn backend(&self) -> &'static str {
    self.store.backend()
  }

  fn unit_of_work(&self) -> UnitOfWork {
    UnitOfWork::new(self.store.clone())
  }

  async fn run_flow<T: Transactional>(&self, ctx_data: ContextData<T>) -> Result<PipelineResult> {
    let uow = ctx_data.read().unit_of_work().clone();
    let outcome = self.flows.run(ctx_data).await;
    if let Err(err) = uow.rollback().await {
      warn!(error = %err, "Rolling back an unfinished unit of work failed.");
    }
    outcome
  }

  // --- Cart ---

  /// Adds one copy of an artwork to the caller's cart, creating the cart on
  /// first use. Adding an artwork that is already there changes nothing.
  #[instrument(skip(self), fields(user_id = user.user_id), err(Display))]
  pub async fn add_to_cart(&self, user: AuthenticatedUser, artwork_id: i64) -> Result<AddToCartOutcome> {
    let ctx_data = ContextData::new(AddToCartCtxData::new(
      self.unit_of_work(),
      self.activity.clone(),
      user,
      artwork_id,
    ));
    match self.run_flow(ctx_data.clone()).await? {
      PipelineResult::Completed => {
        let guard = ctx_data.read();
        Ok(AddToCartOutcome {
          cart_item_count: guard.cart_item_count,
          already_in_cart: guard.already_in_cart,
        })
      }
      PipelineResult::Stopped => Err(MarketError::Internal("add to cart was halted".to_string())),
    }
  }

  /// Applies `cart_item_id -> quantity` changes; quantities `<= 0` remove the
  /// item. Returns the cart as it stands afterwards.
  #[instrument(skip(self, quantities), fields(user_id = user.user_id, changes = quantities.len()), err(Display))]
  pub async fn update_cart(&self, user: AuthenticatedUser, quantities: BTreeMap<i64, i32>) -> Result<CartView> {
    let ctx_data = ContextData::new(UpdateCartCtxData::new(
      self.unit_of_work(),
      self.activity.clone(),
      user,
      quantities,
    ));
    match self.run_flow(ctx_data.clone()).await? {
      PipelineResult::Completed => {
        let view = ctx_data.write().view.take();
        view.ok_or_else(|| MarketError::Internal("cart totals were not loaded".to_string()))
      }
      PipelineResult::Stopped => Err(MarketError::Internal("cart update was halted".to_string())),
    }
  }

  #[instrument(skip(self), fields(user_id = user.user_id), err(Display))]
  pub async fn remove_from_cart(&self, user: AuthenticatedUser, cart_item_id: i64) -> Result<()> {
    let ctx_data = ContextData::new(RemoveItemCtxData::new(self.unit_of_work(), user, cart_item_id));
    self.run_flow(ctx_data).await?;
    Ok(())
  }

  #[instrument(skip(self), fields(user_id = user.user_id), err(Display))]
  pub async fn view_cart(&self, user: AuthenticatedUser) -> Result<CartView> {
    let mut tx = self.store.begin().await?;
    let lines = tx.cart_lines(user.user_id).await?;
    tx.rollback().await?;
    Ok(CartView::from_lines(lines))
  }

  // --- Checkout ---

  /// Turns the caller's cart into an order and returns the new order id.
  #[instrument(skip(self, selection), fields(user_id = user.user_id), err(Display))]
  pub async fn place_order(&self, user: AuthenticatedUser, selection: AddressSelection) -> Result<i64> {
    let ctx_data = ContextData::new(CheckoutCtxData::new(
      self.unit_of_work(),
      self.activity.clone(),
      user,
      selection,
    ));
    match self.run_flow(ctx_data.clone()).await? {
      PipelineResult::Completed => {
        let order_id = ctx_data.read().order.as_ref().map(|o| o.order_id);
        let order_id = order_id.ok_or_else(|| MarketError::Internal("checkout finished without an order".to_string()))?;
        info!(user_id = user.user_id, order_id, "Order placed.");
        Ok(order_id)
      }
      PipelineResult::Stopped => Err(MarketError::validation("cart", "Your cart is empty")),
    }
  }

  // --- Order history and addresses ---

  #[instrument(skip(self), fields(user_id = user.user_id), err(Display))]
  pub async fn list_orders(&self, user: AuthenticatedUser) -> Result<Vec<OrderSummary>> {
    let mut tx = self.store.begin().await?;
    let orders = tx.orders(user.user_id).await?;
    tx.rollback().await?;
    Ok(orders)
  }

  /// Orders of other users are reported as missing.
  #[instrument(skip(self), fields(user_id = user.user_id), err(Display))]
  pub async fn get_order(&self, user: AuthenticatedUser, order_id: i64) -> Result<OrderDetail> {
    let mut tx = self.store.begin().await?;
    let order = match tx.find_order(user.user_id, order_id).await? {
      Some(order) => order,
      None => {
        tx.rollback().await?;
        return Err(MarketError::not_found("Order not found"));
      }
    };
    let lines = tx.order_lines(order.order_id).await?;
    tx.rollback().await?;
    Ok(OrderDetail::new(order, lines))
  }

  #[instrument(skip(self), fields(user_id = user.user_id), err(Display))]
  pub async fn list_addresses(&self, user: AuthenticatedUser) -> Result<Vec<Address>> {
    let mut tx = self.store.begin().await?;
    let addresses = tx.addresses(user.user_id).await?;
    tx.rollback().await?;
    Ok(addresses)
  }

  // --- Deletion flows ---

  #[instrument(skip(self), fields(admin_id = admin.user_id), err(Display))]
  pub async fn cascade_delete_for_artwork(&self, admin: AuthenticatedUser, artwork_id: i64) -> Result<CascadeReport> {
    self.cascade(admin, CascadeTarget::Artwork(artwork_id), false).await
  }

  /// An artist removing one of their own listings. Anyone else's artwork is
  /// reported as missing.
  #[instrument(skip(self), fields(user_id = user.user_id), err(Display))]
  pub async fn delete_artwork_as_artist(&self, user: AuthenticatedUser, artwork_id: i64) -> Result<CascadeReport> {
    self.cascade(user, CascadeTarget::Artwork(artwork_id), true).await
  }

  #[instrument(skip(self), fields(admin_id = admin.user_id), err(Display))]
  pub async fn cascade_delete_for_user(&self, admin: AuthenticatedUser, user_id: i64) -> Result<CascadeReport> {
    self.cascade(admin, CascadeTarget::User(user_id), false).await
  }

  async fn cascade(&self, actor: AuthenticatedUser, target: CascadeTarget, require_owner: bool) -> Result<CascadeReport> {
    let ctx_data = ContextData::new(CascadeCtxData::new(
      self.unit_of_work(),
      self.activity.clone(),
      actor,
      target,
      require_owner,
    ));
    match self.run_flow(ctx_data.clone()).await? {
      PipelineResult::Completed => {
        let report = std::mem::take(&mut ctx_data.write().report);
        info!(?target, rows = report.total(), "Cascade delete finished.");
        Ok(report)
      }
      PipelineResult::Stopped => Err(MarketError::Internal("cascade delete was halted".to_string())),
    }
  }
}

impl std::fmt::Debug for OrderCartManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OrderCartManager").field("backend", &self.store.backend()).finish()
  }
}
