//! Domain models.
//!
//! Snapshots of remote-owned entities (products, orders, the profile) plus
//! the locally-owned cart line. The catalog service is authoritative for
//! everything here except [`CartLine`]; the client never mutates a product
//! or an order in place, it only replaces snapshots wholesale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use green_mango_core::{CategoryId, OrderId, OrderStatus, Price, ProductId, ProfileId};

/// One cart line: a product reference and how many units of it.
///
/// The cart holds at most one line per product id; a quantity of zero is
/// never stored, reaching zero removes the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    /// Create a line with a single unit.
    #[must_use]
    pub fn single(product_id: ProductId) -> Self {
        Self {
            product_id,
            quantity: 1,
        }
    }
}

/// Reference to the category a product belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
}

/// A catalog product snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub photo_url: String,
    pub category: Option<CategoryRef>,
}

/// One page of catalog results together with the server's total count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: u64,
}

/// A line item inside an order snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// An order as reported by the order service.
///
/// Orders are a one-way snapshot of the cart at placement time; the server
/// is authoritative for the stored status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub line_items: Vec<OrderLine>,
    pub owner_profile_id: ProfileId,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub email: String,
    pub sign_up_date: Option<DateTime<Utc>>,
}
