//! Cart store.
//!
//! The single source of truth for what the user intends to buy. All
//! operations are synchronous and apply against the current in-memory lines,
//! never a stale snapshot, so two `increase` calls always land as +2. Every
//! mutation writes the new line set through [`Storage`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use green_mango_core::ProductId;

use crate::models::CartLine;
use crate::storage::Storage;

/// Process-wide cart. Cheaply cloneable; clones share the lines.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    lines: Mutex<Vec<CartLine>>,
    storage: Storage,
}

impl CartStore {
    /// Create a cart seeded from the persisted document.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        let lines = storage.snapshot().cart_lines;
        Self {
            inner: Arc::new(CartInner {
                lines: Mutex::new(lines),
                storage,
            }),
        }
    }

    fn locked(&self) -> MutexGuard<'_, Vec<CartLine>> {
        self.inner
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one unit of `product_id`, inserting a new line at quantity 1 if
    /// the product is not in the cart yet. Returns the new quantity.
    pub fn increase(&self, product_id: &ProductId) -> u32 {
        let mut lines = self.locked();
        let quantity = match lines.iter_mut().find(|l| &l.product_id == product_id) {
            Some(line) => {
                line.quantity += 1;
                line.quantity
            }
            None => {
                lines.push(CartLine::single(product_id.clone()));
                1
            }
        };
        self.persist(&lines);
        quantity
    }

    /// Remove one unit of `product_id`. A line at quantity 1 is removed
    /// entirely, never stored at 0. No-op if the product is absent.
    /// Returns the remaining quantity.
    pub fn decrease(&self, product_id: &ProductId) -> u32 {
        let mut lines = self.locked();
        let Some(index) = lines.iter().position(|l| &l.product_id == product_id) else {
            return 0;
        };
        let Some(line) = lines.get_mut(index) else {
            return 0;
        };
        line.quantity -= 1;
        let remaining = line.quantity;
        if remaining == 0 {
            lines.remove(index);
        }
        self.persist(&lines);
        remaining
    }

    /// Delete the line for `product_id` regardless of quantity.
    pub fn remove(&self, product_id: &ProductId) {
        let mut lines = self.locked();
        let before = lines.len();
        lines.retain(|l| &l.product_id != product_id);
        if lines.len() != before {
            self.persist(&lines);
        }
    }

    /// Empty the cart. Used after successful order placement and on logout.
    pub fn clear(&self) {
        let mut lines = self.locked();
        if lines.is_empty() {
            return;
        }
        lines.clear();
        self.persist(&lines);
    }

    /// Units of `product_id` across all matching lines. The cart itself
    /// keeps one line per product, but persisted documents from other
    /// sources may carry duplicates; summing keeps the answer right either
    /// way. Returns 0 if absent.
    #[must_use]
    pub fn total_quantity_for(&self, product_id: &ProductId) -> u32 {
        self.locked()
            .iter()
            .filter(|l| &l.product_id == product_id)
            .map(|l| l.quantity)
            .sum()
    }

    /// Units across the whole cart (the header badge count).
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.locked().iter().map(|l| l.quantity).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        self.locked().len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    /// A copy of the lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.locked().clone()
    }

    fn persist(&self, lines: &[CartLine]) {
        self.inner.storage.set_cart_lines(lines.to_vec());
    }
}
