// galleria-market/src/pipelines/contexts.rs

//! The data each workflow pipeline runs over.
//! Handlers receive these wrapped in `galleria_flow::ContextData`.

use crate::activity::ActivityLogger;
use crate::identity::AuthenticatedUser;
use crate::models::{Address, AddressSelection, ArtworkSummary, CartLine, CartView, NewAddress, Order};
use crate::store::{CascadePlan, CascadeReport, CascadeTarget, UnitOfWork};
use galleria_flow::ContextData;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Contexts whose pipeline runs inside one `UnitOfWork`.
pub trait Transactional: Send + Sync + 'static {
  fn unit_of_work(&self) -> &UnitOfWork;
}

macro_rules! transactional {
  ($($ctx:ty),+ $(,)?) => {
    $(impl Transactional for $ctx {
      fn unit_of_work(&self) -> &UnitOfWork {
        &self.uow
      }
    })+
  };
}

transactional!(AddToCartCtxData, UpdateCartCtxData, RemoveItemCtxData, CheckoutCtxData, CascadeCtxData);

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub uow: UnitOfWork,
  pub activity: Arc<dyn ActivityLogger>,
  pub user: AuthenticatedUser,
  pub artwork_id: i64,
  pub artwork: Option<ArtworkSummary>,
  pub cart_id: Option<i64>,
  pub already_in_cart: bool,
  pub cart_item_count: i64,
}

impl AddToCartCtxData {
  pub fn new(uow: UnitOfWork, activity: Arc<dyn ActivityLogger>, user: AuthenticatedUser, artwork_id: i64) -> Self {
    Self {
      uow,
      activity,
      user,
      artwork_id,
      artwork: None,
      cart_id: None,
      already_in_cart: false,
      cart_item_count: 0,
    }
  }
}

#[derive(Clone)]
pub struct UpdateCartCtxData {
  pub uow: UnitOfWork,
  pub activity: Arc<dyn ActivityLogger>,
  pub user: AuthenticatedUser,
  /// cart_item_id -> requested quantity; `<= 0` removes the item.
  pub quantities: BTreeMap<i64, i32>,
  pub updated: usize,
  pub removed: usize,
  pub ignored: usize,
  pub view: Option<CartView>,
}

impl UpdateCartCtxData {
  pub fn new(
    uow: UnitOfWork,
    activity: Arc<dyn ActivityLogger>,
    user: AuthenticatedUser,
    quantities: BTreeMap<i64, i32>,
  ) -> Self {
    Self {
      uow,
      activity,
      user,
      quantities,
      updated: 0,
      removed: 0,
      ignored: 0,
      view: None,
    }
  }
}

#[derive(Clone)]
pub struct RemoveItemCtxData {
  pub uow: UnitOfWork,
  pub user: AuthenticatedUser,
  pub cart_item_id: i64,
  pub removed: bool,
}

impl RemoveItemCtxData {
  pub fn new(uow: UnitOfWork, user: AuthenticatedUser, cart_item_id: i64) -> Self {
    Self {
      uow,
      user,
      cart_item_id,
      removed: false,
    }
  }
}

// --- Checkout ---

/// Scoped data for the address-resolution branch of checkout.
#[derive(Clone)]
pub struct AddressCtxData {
  pub uow: UnitOfWork,
  pub user_id: i64,
  pub saved_address_id: Option<i64>,
  pub fresh: Option<NewAddress>,
  pub save_fresh: bool,
  /// The address row the order ships to, when it is stored.
  pub resolved: Option<Address>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub uow: UnitOfWork,
  pub activity: Arc<dyn ActivityLogger>,
  pub user: AuthenticatedUser,
  pub selection: AddressSelection,
  pub address: ContextData<AddressCtxData>,
  pub cart_id: Option<i64>,
  pub lines: Vec<CartLine>,
  pub total: Decimal,
  pub address_id: Option<i64>,
  pub order: Option<Order>,
  pub items_copied: usize,
}

impl CheckoutCtxData {
  pub fn new(
    uow: UnitOfWork,
    activity: Arc<dyn ActivityLogger>,
    user: AuthenticatedUser,
    selection: AddressSelection,
  ) -> Self {
    let (saved_address_id, fresh, save_fresh) = match &selection {
      AddressSelection::Saved(id) => (Some(*id), None, false),
      AddressSelection::Fresh { address, save } => (None, Some(address.clone()), *save),
    };
    let address = ContextData::new(AddressCtxData {
      uow: uow.clone(),
      user_id: user.user_id,
      saved_address_id,
      fresh,
      save_fresh,
      resolved: None,
    });
    Self {
      uow,
      activity,
      user,
      selection,
      address,
      cart_id: None,
      lines: Vec::new(),
      total: Decimal::ZERO,
      address_id: None,
      order: None,
      items_copied: 0,
    }
  }
}

// --- Cascading deletes ---

#[derive(Clone)]
pub struct CascadeCtxData {
  pub uow: UnitOfWork,
  pub activity: Arc<dyn ActivityLogger>,
  pub actor: AuthenticatedUser,
  pub target: CascadeTarget,
  /// Set for an artist deleting their own listing: the artwork must be theirs.
  pub require_owner: bool,
  pub target_label: Option<String>,
  pub plan: Option<CascadePlan>,
  pub report: CascadeReport,
}

impl CascadeCtxData {
  pub fn new(
    uow: UnitOfWork,
    activity: Arc<dyn ActivityLogger>,
    actor: AuthenticatedUser,
    target: CascadeTarget,
    require_owner: bool,
  ) -> Self {
    Self {
      uow,
      activity,
      actor,
      target,
      require_owner,
      target_label: None,
      plan: None,
      report: CascadeReport::default(),
    }
  }
}
