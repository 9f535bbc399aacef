// cartsync/src/store/mod.rs

//! The session's cart store: the in-memory list of line items, its mutation
//! rules, the request generation counter, and persistence to session storage.
//!
//! Every change that reaches the in-memory cart is also published on a
//! `watch` channel (`CartStore::subscribe`), which is what a renderer waits on
//! to redraw.

pub mod storage;

use crate::error::{CartError, CartResult};
use crate::model::{Cart, CartSnapshot, LineItem};
use std::sync::Arc;
use storage::{SessionStorage, CART_STORAGE_KEY};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Identifies one round trip. A response may only be applied while its token
/// is still the store's current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
  pub fn value(&self) -> u64 {
    self.0
  }
}

/// What `adjust_quantity` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
  /// The product was not in the cart; nothing changed.
  Absent,
  Updated(i64),
  Removed,
}

/// Invariants after every operation: product ids are unique and every
/// quantity is >= 1.
pub struct CartStore {
  cart: Cart,
  storage: Arc<dyn SessionStorage>,
  generation: u64,
  changes: watch::Sender<CartSnapshot>,
}

impl std::fmt::Debug for CartStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CartStore")
      .field("cart", &self.cart)
      .field("generation", &self.generation)
      .finish()
  }
}

impl CartStore {
  /// An empty cart for `owner`. Nothing is written until the first mutation.
  pub fn new(owner: impl Into<String>, storage: Arc<dyn SessionStorage>) -> Self {
    Self::with_cart(Cart::empty(owner), storage)
  }

  fn with_cart(cart: Cart, storage: Arc<dyn SessionStorage>) -> Self {
    let (changes, _) = watch::channel(cart.snapshot());
    Self {
      cart,
      storage,
      generation: 0,
      changes,
    }
  }

  /// Restores the last persisted cart for `owner`, or starts empty when there
  /// is none, it cannot be read or decoded, or it belongs to someone else.
  pub fn hydrate(owner: impl Into<String>, storage: Arc<dyn SessionStorage>) -> Self {
    let owner = owner.into();
    let stored = match storage.get(CART_STORAGE_KEY) {
      Ok(stored) => stored,
      Err(e) => {
        warn!(owner = %owner, error = %e, "Could not read persisted cart; starting empty.");
        None
      }
    };

    let cart = match stored.map(|raw| serde_json::from_str::<Cart>(&raw)) {
      None => Cart::empty(&owner),
      Some(Ok(cart)) if cart.owner == owner => match merge_duplicates(cart.items) {
        Ok(items) => Cart { owner: owner.clone(), items },
        Err(e) => {
          warn!(owner = %owner, error = %e, "Persisted cart violates invariants; starting empty.");
          Cart::empty(&owner)
        }
      },
      Some(Ok(cart)) => {
        warn!(owner = %owner, stored_owner = %cart.owner, "Persisted cart belongs to another owner; ignoring it.");
        Cart::empty(&owner)
      }
      Some(Err(e)) => {
        warn!(owner = %owner, error = %e, "Persisted cart could not be decoded; starting empty.");
        Cart::empty(&owner)
      }
    };

    debug!(owner = %owner, items = cart.items.len(), "Cart store hydrated.");
    Self::with_cart(cart, storage)
  }

  pub fn owner(&self) -> &str {
    &self.cart.owner
  }

  pub fn snapshot(&self) -> CartSnapshot {
    self.cart.snapshot()
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// A receiver that is marked changed whenever the in-memory cart changes:
  /// local mutations and applied server responses. Discarded (superseded)
  /// responses do not wake it.
  pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
    self.changes.subscribe()
  }

  /// Adds `quantity_delta` to the entry for `item`'s product, inserting the
  /// item with `quantity = quantity_delta` when it is not in the cart yet.
  ///
  /// Fails with `InvalidQuantity`, leaving the cart untouched, when the
  /// resulting quantity would not be a positive integer.
  pub fn add_or_increment(&mut self, item: LineItem, quantity_delta: i64) -> CartResult<()> {
    let resulting = match self.cart.get(item.product_id()) {
      Some(existing) => existing.quantity().checked_add(quantity_delta),
      None => Some(quantity_delta),
    };
    let resulting = match resulting {
      Some(q) if q >= 1 => q,
      _ => return Err(CartError::invalid_quantity(quantity_delta)),
    };

    match self.cart.position(item.product_id()) {
      Some(idx) => self.cart.items[idx].set_quantity(resulting),
      None => {
        let mut item = item;
        item.set_quantity(resulting);
        self.cart.items.push(item);
      }
    }
    self.touch();
    debug!(owner = %self.cart.owner, quantity = resulting, "add_or_increment applied.");
    self.persist()
  }

  /// Changes the quantity of `product_id` by `delta` (which may be negative).
  /// A result <= 0 removes the entry. Absent products are a no-op, so repeated
  /// removals are harmless.
  pub fn adjust_quantity(&mut self, product_id: &str, delta: i64) -> CartResult<Adjustment> {
    let Some(idx) = self.cart.position(product_id) else {
      debug!(owner = %self.cart.owner, product_id, "adjust_quantity on absent product; no-op.");
      return Ok(Adjustment::Absent);
    };

    let resulting = self.cart.items[idx].quantity().saturating_add(delta);
    let adjustment = if resulting <= 0 {
      self.cart.items.remove(idx);
      Adjustment::Removed
    } else {
      self.cart.items[idx].set_quantity(resulting);
      Adjustment::Updated(resulting)
    };
    self.touch();
    debug!(owner = %self.cart.owner, product_id, ?adjustment, "adjust_quantity applied.");
    self.persist()?;
    Ok(adjustment)
  }

  /// Replaces the whole cart, discarding local-only state. Entries repeating
  /// a product id are merged by summing their quantities (first position wins).
  pub fn replace_all(&mut self, items: Vec<LineItem>) -> CartResult<()> {
    let items = merge_duplicates(items)?;
    self.cart.items = items;
    self.touch();
    self.persist()
  }

  /// Starts a round trip: advances the generation and returns its token.
  pub fn issue_token(&mut self) -> RequestToken {
    self.generation += 1;
    RequestToken(self.generation)
  }

  pub fn is_current(&self, token: RequestToken) -> bool {
    token.0 == self.generation
  }

  /// Applies a server response only if nothing newer (another request or a
  /// local mutation) happened since `token` was issued. Returns whether the
  /// response was applied.
  pub fn replace_if_current(&mut self, token: RequestToken, items: Vec<LineItem>) -> CartResult<bool> {
    if !self.is_current(token) {
      debug!(
        owner = %self.cart.owner,
        token = token.0,
        generation = self.generation,
        "Discarding superseded response."
      );
      return Ok(false);
    }
    self.cart.items = merge_duplicates(items)?;
    self.publish();
    self.persist()?;
    Ok(true)
  }

  fn touch(&mut self) {
    self.generation += 1;
    self.publish();
  }

  fn publish(&self) {
    self.changes.send_replace(self.cart.snapshot());
  }

  fn persist(&self) -> CartResult<()> {
    let serialized = serde_json::to_string(&self.cart)?;
    self.storage.set(CART_STORAGE_KEY, &serialized).map_err(|e| {
      warn!(owner = %self.cart.owner, error = %e, "Persisting cart to session storage failed.");
      e
    })
  }
}

fn merge_duplicates(items: Vec<LineItem>) -> CartResult<Vec<LineItem>> {
  let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
  for item in items {
    match merged.iter_mut().find(|m| m.product_id() == item.product_id()) {
      Some(existing) => {
        let summed = existing
          .quantity()
          .checked_add(item.quantity())
          .ok_or_else(|| CartError::invalid_quantity(item.quantity()))?;
        existing.set_quantity(summed);
      }
      None => merged.push(item),
    }
  }
  Ok(merged)
}
