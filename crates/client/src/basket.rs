//! Basket view data.
//!
//! Joins the cart lines with their product snapshots. Each row resolves its
//! own product detail and reports through the shared [`LoadGauge`], so the
//! busy signal stays up until the last row finishes without the caller
//! keeping per-row bookkeeping. A product that no longer exists drops its
//! row instead of failing the whole basket.

use std::future::Future;

use green_mango_core::ProductId;
use rust_decimal::Decimal;

use crate::api::ApiError;
use crate::cart::CartStore;
use crate::error::Result;
use crate::loading::LoadGauge;
use crate::models::Product;

/// Remote source of single product snapshots. Implemented by the API client
/// and by in-process fakes in tests.
pub trait ProductDetailGateway {
    /// Fetch one product. `ApiError::NotFound` means the product is gone.
    fn fetch_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = std::result::Result<Product, ApiError>> + Send;
}

/// One basket row: the product snapshot joined with the cart quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketItem {
    pub product: Product,
    pub quantity: u32,
}

impl BasketItem {
    /// Price of the row (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.line_total(self.quantity)
    }
}

/// Resolve the current cart into basket rows.
///
/// Rows whose product has been removed from the catalog render as absent
/// (the line stays in the cart until the user removes it). Any other
/// failure aborts the join and surfaces classified.
///
/// # Errors
///
/// The classified remote failure of the first row that fails with anything
/// other than "not found".
pub async fn load_basket<G: ProductDetailGateway>(
    gateway: &G,
    cart: &CartStore,
    gauge: &LoadGauge,
) -> Result<Vec<BasketItem>> {
    let lines = cart.lines();
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let row_busy = gauge.begin();
        let fetched = gateway.fetch_product(&line.product_id).await;
        row_busy.end();

        match fetched {
            Ok(product) => items.push(BasketItem {
                product,
                quantity: line.quantity,
            }),
            Err(ApiError::NotFound(_)) => {
                tracing::debug!(product_id = %line.product_id, "basket row absent, product gone");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(items)
}
