//! Wire types for catalog service responses.
//!
//! These mirror the response shapes of the GraphQL documents in
//! [`super::queries`] and convert into the domain models. Field names follow
//! the remote schema (camelCase), so every struct carries serde renames.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use green_mango_core::{CategoryId, OrderId, OrderStatus, Price, ProductId, ProfileId};

use crate::models::{CategoryRef, Order, OrderLine, Product, ProductPage, Profile};

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsData {
    pub products: ProductsNamespace,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsNamespace {
    #[serde(rename = "getMany")]
    pub get_many: ProductGetManyPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductGetManyPayload {
    pub pagination: PaginationInfo,
    pub data: Vec<ProductWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaginationInfo {
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductDetailData {
    pub products: ProductDetailNamespace,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductDetailNamespace {
    #[serde(rename = "getOne")]
    pub get_one: Option<ProductWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductWire {
    pub id: ProductId,
    pub name: String,
    pub photo: Option<String>,
    pub desc: Option<String>,
    pub price: Price,
    pub category: Option<CategoryWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryWire {
    pub id: CategoryId,
    pub name: String,
}

impl From<ProductWire> for Product {
    fn from(wire: ProductWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            description: wire.desc.unwrap_or_default(),
            price: wire.price,
            photo_url: wire.photo.unwrap_or_default(),
            category: wire.category.map(|c| CategoryRef {
                id: c.id,
                name: c.name,
            }),
        }
    }
}

impl From<ProductGetManyPayload> for ProductPage {
    fn from(payload: ProductGetManyPayload) -> Self {
        Self {
            total: payload.pagination.total,
            items: payload.data.into_iter().map(Product::from).collect(),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersData {
    pub orders: OrdersNamespace,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersNamespace {
    #[serde(rename = "getMany")]
    pub get_many: OrderGetManyPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderGetManyPayload {
    pub data: Vec<OrderWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderWire {
    pub id: OrderId,
    pub status: OrderStatus,
    #[serde(default)]
    pub products: Vec<OrderLineWire>,
    pub user: Option<OrderUserWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderLineWire {
    pub product: OrderLineProductWire,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderLineProductWire {
    pub id: ProductId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderUserWire {
    pub id: ProfileId,
}

impl OrderWire {
    /// Convert into a domain order. Ownerless records cannot be attributed
    /// to a profile and are dropped.
    pub(crate) fn into_order(self) -> Option<Order> {
        let owner = self.user?;
        Some(Order {
            id: self.id,
            status: self.status,
            line_items: self
                .products
                .into_iter()
                .map(|line| OrderLine {
                    product_id: line.product.id,
                    quantity: line.quantity,
                })
                .collect(),
            owner_profile_id: owner.id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddOrderData {
    pub orders: AddOrderNamespace,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddOrderNamespace {
    pub add: CreatedOrderWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedOrderWire {
    pub id: OrderId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchOrderData {
    pub orders: PatchOrderNamespace,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchOrderNamespace {
    pub patch: PatchedOrderWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchedOrderWire {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoveOrderData {
    pub orders: RemoveOrderNamespace,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemoveOrderNamespace {
    #[allow(dead_code)]
    pub remove: RemovedOrderWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RemovedOrderWire {
    #[allow(dead_code)]
    pub id: OrderId,
}

// =============================================================================
// Profile
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileData {
    pub profile: ProfileWire,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileWire {
    pub id: ProfileId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub sign_up_date: Option<DateTime<Utc>>,
}

impl From<ProfileWire> for Profile {
    fn from(wire: ProfileWire) -> Self {
        Self {
            id: wire.id,
            name: wire.name,
            email: wire.email,
            sign_up_date: wire.sign_up_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileIdData {
    pub profile: ProfileIdWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileIdWire {
    pub id: ProfileId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_page_from_wire() {
        let json = serde_json::json!({
            "products": {
                "getMany": {
                    "pagination": { "pageSize": 8, "pageNumber": 1, "total": 20 },
                    "data": [
                        {
                            "id": "p-1",
                            "name": "Mango",
                            "photo": "https://cdn.example/p-1.jpg",
                            "desc": "Ripe",
                            "price": 4.5,
                            "category": { "id": "c-1", "name": "Fruit" }
                        },
                        {
                            "id": "p-2",
                            "name": "Papaya",
                            "photo": null,
                            "desc": null,
                            "price": 3,
                            "category": null
                        }
                    ]
                }
            }
        });

        let data: ProductsData = serde_json::from_value(json).expect("deserialize");
        let page = ProductPage::from(data.products.get_many);
        assert_eq!(page.total, 20);
        assert_eq!(page.items.len(), 2);
        let first = &page.items[0];
        assert_eq!(first.name, "Mango");
        assert_eq!(
            first.category.as_ref().map(|c| c.name.as_str()),
            Some("Fruit")
        );
        let second = &page.items[1];
        assert_eq!(second.photo_url, "");
        assert_eq!(second.description, "");
        assert!(second.category.is_none());
    }

    #[test]
    fn test_negative_price_rejected_at_the_boundary() {
        let json = serde_json::json!({
            "id": "p-1",
            "name": "Broken",
            "photo": null,
            "desc": null,
            "price": -1.0,
            "category": null
        });
        assert!(serde_json::from_value::<ProductWire>(json).is_err());
    }

    #[test]
    fn test_order_wire_into_order() {
        let json = serde_json::json!({
            "id": "o-1",
            "status": "PendingConfirmation",
            "products": [
                { "product": { "id": "p-1" }, "quantity": 2 },
                { "product": { "id": "p-2" }, "quantity": 1 }
            ],
            "user": { "id": "u-1" }
        });
        let wire: OrderWire = serde_json::from_value(json).expect("deserialize");
        let order = wire.into_order().expect("owned order");
        assert_eq!(order.status, green_mango_core::OrderStatus::PendingConfirmation);
        assert_eq!(order.line_items.len(), 2);
        assert_eq!(order.line_items[0].quantity, 2);
        assert_eq!(order.owner_profile_id.as_str(), "u-1");
    }

    #[test]
    fn test_ownerless_order_is_dropped() {
        let json = serde_json::json!({
            "id": "o-2",
            "status": "Processing",
            "products": [],
            "user": null
        });
        let wire: OrderWire = serde_json::from_value(json).expect("deserialize");
        assert!(wire.into_order().is_none());
    }

    #[test]
    fn test_profile_without_sign_up_date() {
        let json = serde_json::json!({
            "profile": { "id": "u-1", "name": "Dana", "email": "dana@example.com" }
        });
        let data: ProfileData = serde_json::from_value(json).expect("deserialize");
        let profile = Profile::from(data.profile);
        assert!(profile.sign_up_date.is_none());
    }
}
