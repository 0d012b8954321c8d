// galleria-market/src/store/cascade.rs

//! Cascading deletes, described as data.
//!
//! A [`CascadePlan`] lists, in execution order, every relation that hangs off a
//! parent row and how its rows are linked to that parent. Both stores execute
//! the same plan, so adding a dependent table means adding one line here.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
  ArtworkTags,
  Likes,
  Comments,
  CartItems,
  Carts,
  OrderItems,
  Orders,
  Addresses,
  Artworks,
  Users,
}

impl Relation {
  pub fn table(self) -> &'static str {
    match self {
      Relation::ArtworkTags => "artwork_tags",
      Relation::Likes => "likes",
      Relation::Comments => "comments",
      Relation::CartItems => "cart_items",
      Relation::Carts => "cart",
      Relation::OrderItems => "order_items",
      Relation::Orders => "orders",
      Relation::Addresses => "user_addresses",
      Relation::Artworks => "artworks",
      Relation::Users => "users",
    }
  }

  pub fn primary_key(self) -> &'static str {
    match self {
      Relation::ArtworkTags | Relation::Artworks => "artwork_id",
      Relation::Likes => "like_id",
      Relation::Comments => "comment_id",
      Relation::CartItems => "cart_item_id",
      Relation::Carts => "cart_id",
      Relation::OrderItems => "order_item_id",
      Relation::Orders => "order_id",
      Relation::Addresses => "address_id",
      Relation::Users => "user_id",
    }
  }
}

/// How the rows of a relation point at the parent being deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
  /// The row's `artwork_id` is the parent.
  ByArtwork,
  /// The row's `user_id` is the parent.
  ByUser,
  /// The row belongs to a cart owned by the parent user.
  ByCartOwner,
  /// The row belongs to an order placed by the parent user.
  ByOrderOwner,
  /// The row is the parent itself.
  Itself,
}

/// Order items are absent: purchase history outlives the artwork.
const ARTWORK_DEPENDENTS: &[(Relation, Link)] = &[
  (Relation::ArtworkTags, Link::ByArtwork),
  (Relation::Likes, Link::ByArtwork),
  (Relation::Comments, Link::ByArtwork),
  (Relation::CartItems, Link::ByArtwork),
  (Relation::Artworks, Link::Itself),
];

const USER_DEPENDENTS: &[(Relation, Link)] = &[
  (Relation::Likes, Link::ByUser),
  (Relation::Comments, Link::ByUser),
  (Relation::CartItems, Link::ByCartOwner),
  (Relation::Carts, Link::ByUser),
  (Relation::OrderItems, Link::ByOrderOwner),
  (Relation::Orders, Link::ByUser),
  (Relation::Addresses, Link::ByUser),
  (Relation::Users, Link::Itself),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CascadeTarget {
  Artwork(i64),
  User(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeStep {
  pub relation: Relation,
  pub link: Link,
  pub parent_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadePlan {
  steps: Vec<CascadeStep>,
}

impl CascadePlan {
  pub fn for_artwork(artwork_id: i64) -> Self {
    let mut plan = Self::default();
    plan.extend(ARTWORK_DEPENDENTS, artwork_id);
    plan
  }

  /// The user's own artworks go first, each with its full artwork cascade.
  pub fn for_user(user_id: i64, authored_artworks: &[i64]) -> Self {
    let mut plan = Self::default();
    for artwork_id in authored_artworks {
      plan.extend(ARTWORK_DEPENDENTS, *artwork_id);
    }
    plan.extend(USER_DEPENDENTS, user_id);
    plan
  }

  fn extend(&mut self, dependents: &[(Relation, Link)], parent_id: i64) {
    self.steps.extend(dependents.iter().map(|(relation, link)| CascadeStep {
      relation: *relation,
      link: *link,
      parent_id,
    }));
  }

  pub fn steps(&self) -> &[CascadeStep] {
    &self.steps
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

/// Rows removed per relation by one cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
  pub deleted: BTreeMap<Relation, u64>,
}

impl CascadeReport {
  pub fn record(&mut self, relation: Relation, rows: u64) {
    *self.deleted.entry(relation).or_insert(0) += rows;
  }

  pub fn count(&self, relation: Relation) -> u64 {
    self.deleted.get(&relation).copied().unwrap_or(0)
  }

  pub fn total(&self) -> u64 {
    self.deleted.values().sum()
  }
}
