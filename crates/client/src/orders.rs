//! Order lifecycle controller.
//!
//! Drives placement, confirmation, cancellation and removal against the
//! remote order resource. The server is authoritative for stored status, so
//! nothing is mutated optimistically: a transition is gated locally against
//! the last-known status, issued remotely, and followed by a full reload of
//! the list. A failed remote call leaves local state exactly as displayed
//! before the call.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use green_mango_core::{OrderId, OrderStatus};

use crate::api::ApiError;
use crate::cart::CartStore;
use crate::error::{Result, StoreError};
use crate::loading::LoadGauge;
use crate::models::{CartLine, Order};
use crate::session::SessionStore;

/// Remote order resource. Implemented by the API client and by in-process
/// fakes in tests.
pub trait OrderGateway {
    /// Create an order from line items, returning the new order's id.
    fn create_order(
        &self,
        lines: &[CartLine],
    ) -> impl Future<Output = std::result::Result<OrderId, ApiError>> + Send;

    /// Patch an order's status, returning the stored status.
    fn patch_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = std::result::Result<OrderStatus, ApiError>> + Send;

    /// Delete an order record.
    fn delete_order(
        &self,
        id: &OrderId,
    ) -> impl Future<Output = std::result::Result<(), ApiError>> + Send;

    /// Fetch all orders visible to the ambient session.
    fn fetch_orders(
        &self,
    ) -> impl Future<Output = std::result::Result<Vec<Order>, ApiError>> + Send;
}

/// Drives the order lifecycle against an [`OrderGateway`].
pub struct OrderController<G> {
    gateway: G,
    cart: CartStore,
    session: SessionStore,
    gauge: LoadGauge,
    orders: Mutex<Vec<Order>>,
}

impl<G: OrderGateway> OrderController<G> {
    /// Create a controller with an empty local list.
    pub fn new(gateway: G, cart: CartStore, session: SessionStore, gauge: LoadGauge) -> Self {
        Self {
            gateway,
            cart,
            session,
            gauge,
            orders: Mutex::new(Vec::new()),
        }
    }

    fn locked(&self) -> MutexGuard<'_, Vec<Order>> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Place an order from the current cart contents.
    ///
    /// The cart is read at the moment of the remote call, not from an
    /// earlier snapshot, and is cleared exactly once - only after the remote
    /// create resolves. A failed create leaves the cart untouched.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] when the cart is empty (no remote call is
    /// issued), otherwise the classified remote failure.
    pub async fn place(&self) -> Result<OrderId> {
        let _busy = self.gauge.begin();

        let lines = self.cart.lines();
        if lines.is_empty() {
            return Err(StoreError::validation(
                "cannot place an order from an empty cart",
            ));
        }

        let order_id = self.gateway.create_order(&lines).await?;
        tracing::info!(order_id = %order_id, "order placed");
        self.cart.clear();
        self.reload_after_mutation().await;
        Ok(order_id)
    }

    /// Confirm a pending order (`PendingConfirmation -> Processing`).
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] for an unknown order id,
    /// [`StoreError::Validation`] when the transition is not offerable from
    /// the current status, otherwise the classified remote failure.
    pub async fn confirm(&self, id: &OrderId) -> Result<()> {
        self.transition(id, OrderStatus::Processing).await
    }

    /// Cancel an order (`PendingConfirmation | Processing -> OrderCancelled`).
    ///
    /// # Errors
    ///
    /// Same surface as [`Self::confirm`].
    pub async fn cancel(&self, id: &OrderId) -> Result<()> {
        self.transition(id, OrderStatus::OrderCancelled).await
    }

    /// Delete an order record entirely. Not offerable while the order is
    /// `Processing` - an order being processed can only be cancelled.
    ///
    /// # Errors
    ///
    /// Same surface as [`Self::confirm`].
    pub async fn remove(&self, id: &OrderId) -> Result<()> {
        let _busy = self.gauge.begin();

        let status = self.status_of(id)?;
        if !status.can_remove() {
            return Err(StoreError::validation(format!(
                "order {id} is {status} and cannot be removed"
            )));
        }

        self.gateway.delete_order(id).await?;
        tracing::info!(order_id = %id, "order removed");
        self.reload_after_mutation().await;
        Ok(())
    }

    /// Replace the local list with a fresh, authoritative fetch, keeping
    /// only the orders owned by the current session's profile. Without a
    /// profile the list is empty.
    ///
    /// # Errors
    ///
    /// The classified remote failure; the local list is left untouched.
    pub async fn reload(&self) -> Result<()> {
        let _busy = self.gauge.begin();

        let fetched = self.gateway.fetch_orders().await?;
        let mine = match self.session.profile_id() {
            Some(profile_id) => fetched
                .into_iter()
                .filter(|order| order.owner_profile_id == profile_id)
                .collect(),
            None => Vec::new(),
        };
        *self.locked() = mine;
        Ok(())
    }

    /// A copy of the last reloaded list.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.locked().clone()
    }

    async fn transition(&self, id: &OrderId, target: OrderStatus) -> Result<()> {
        let _busy = self.gauge.begin();

        let current = self.status_of(id)?;
        let allowed = match target {
            OrderStatus::Processing => current.can_confirm(),
            OrderStatus::OrderCancelled => current.can_cancel(),
            OrderStatus::PendingConfirmation => false,
        };
        if !allowed {
            return Err(StoreError::validation(format!(
                "order {id} is {current} and cannot move to {target}"
            )));
        }

        let stored = self.gateway.patch_order_status(id, target).await?;
        tracing::info!(order_id = %id, status = %stored, "order transitioned");
        self.reload_after_mutation().await;
        Ok(())
    }

    fn status_of(&self, id: &OrderId) -> Result<OrderStatus> {
        self.locked()
            .iter()
            .find(|order| &order.id == id)
            .map(|order| order.status)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))
    }

    /// The mutation itself succeeded; a failed follow-up reload only means
    /// the list is stale, so it is logged rather than turned into a failure
    /// of the mutation.
    async fn reload_after_mutation(&self) {
        if let Err(e) = self.reload().await {
            tracing::warn!(error = %e, "order list reload failed after mutation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use green_mango_core::{ProductId, ProfileId};

    use crate::storage::{MemoryStore, Storage};

    /// In-memory order service: stores created orders, applies patches, and
    /// can be told to fail each operation.
    #[derive(Default)]
    struct FakeOrders {
        records: StdMutex<Vec<Order>>,
        next_id: AtomicU64,
        owner: StdMutex<Option<ProfileId>>,
        fail_create: bool,
        fail_patch: bool,
        created_with: StdMutex<Vec<Vec<CartLine>>>,
    }

    impl FakeOrders {
        fn owned_by(profile: &str) -> Self {
            let fake = Self::default();
            *fake.owner.lock().expect("owner") = Some(ProfileId::new(profile));
            fake
        }

        fn seed(&self, id: &str, status: OrderStatus) {
            let owner = self
                .owner
                .lock()
                .expect("owner")
                .clone()
                .unwrap_or_else(|| ProfileId::new("u-1"));
            self.records.lock().expect("records").push(Order {
                id: OrderId::new(id),
                status,
                line_items: Vec::new(),
                owner_profile_id: owner,
            });
        }

        fn stored_status(&self, id: &str) -> Option<OrderStatus> {
            self.records
                .lock()
                .expect("records")
                .iter()
                .find(|o| o.id.as_str() == id)
                .map(|o| o.status)
        }
    }

    impl OrderGateway for &FakeOrders {
        fn create_order(
            &self,
            lines: &[CartLine],
        ) -> impl Future<Output = std::result::Result<OrderId, ApiError>> + Send {
            let result = if self.fail_create {
                Err(ApiError::GraphQL(vec![]))
            } else {
                self.created_with
                    .lock()
                    .expect("created_with")
                    .push(lines.to_vec());
                let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
                let id = OrderId::new(format!("o-{n}"));
                let owner = self
                    .owner
                    .lock()
                    .expect("owner")
                    .clone()
                    .unwrap_or_else(|| ProfileId::new("u-1"));
                self.records.lock().expect("records").push(Order {
                    id: id.clone(),
                    status: OrderStatus::PendingConfirmation,
                    line_items: lines
                        .iter()
                        .map(|l| crate::models::OrderLine {
                            product_id: l.product_id.clone(),
                            quantity: l.quantity,
                        })
                        .collect(),
                    owner_profile_id: owner,
                });
                Ok(id)
            };
            async move { result }
        }

        fn patch_order_status(
            &self,
            id: &OrderId,
            status: OrderStatus,
        ) -> impl Future<Output = std::result::Result<OrderStatus, ApiError>> + Send {
            let result = if self.fail_patch {
                Err(ApiError::GraphQL(vec![]))
            } else {
                let mut records = self.records.lock().expect("records");
                match records.iter_mut().find(|o| &o.id == id) {
                    Some(order) => {
                        order.status = status;
                        Ok(status)
                    }
                    None => Err(ApiError::NotFound(format!("order {id}"))),
                }
            };
            async move { result }
        }

        fn delete_order(
            &self,
            id: &OrderId,
        ) -> impl Future<Output = std::result::Result<(), ApiError>> + Send {
            let result = {
                let mut records = self.records.lock().expect("records");
                let before = records.len();
                records.retain(|o| &o.id != id);
                if records.len() == before {
                    Err(ApiError::NotFound(format!("order {id}")))
                } else {
                    Ok(())
                }
            };
            async move { result }
        }

        fn fetch_orders(
            &self,
        ) -> impl Future<Output = std::result::Result<Vec<Order>, ApiError>> + Send {
            let result = Ok(self.records.lock().expect("records").clone());
            async move { result }
        }
    }

    fn pid(s: &str) -> ProductId {
        ProductId::new(s)
    }

    fn fixtures(fake: &FakeOrders) -> (OrderController<&FakeOrders>, CartStore, SessionStore) {
        let storage = Storage::open(MemoryStore::default()).expect("open");
        let cart = CartStore::new(storage.clone());
        let session = SessionStore::new(storage);
        session.login("tok", ProfileId::new("u-1"));
        let controller = OrderController::new(fake, cart.clone(), session.clone(), LoadGauge::new());
        (controller, cart, session)
    }

    #[tokio::test]
    async fn test_place_snapshots_cart_and_clears_it() {
        let fake = FakeOrders::owned_by("u-1");
        let (controller, cart, _session) = fixtures(&fake);

        cart.increase(&pid("product-a"));
        cart.increase(&pid("product-a"));
        cart.increase(&pid("product-b"));

        let order_id = controller.place().await.expect("place");
        assert!(cart.is_empty());

        let created = fake.created_with.lock().expect("created_with");
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].len(), 2);
        assert_eq!(created[0][0].quantity, 2);

        let orders = controller.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, order_id);
        assert_eq!(orders[0].status, OrderStatus::PendingConfirmation);
        assert_eq!(orders[0].line_items.len(), 2);
    }

    #[tokio::test]
    async fn test_place_with_empty_cart_is_rejected_locally() {
        let fake = FakeOrders::owned_by("u-1");
        let (controller, _cart, _session) = fixtures(&fake);

        let err = controller.place().await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        // No remote call was issued.
        assert!(fake.created_with.lock().expect("created_with").is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_leaves_cart_untouched() {
        let mut fake = FakeOrders::owned_by("u-1");
        fake.fail_create = true;
        let (controller, cart, _session) = fixtures(&fake);

        cart.increase(&pid("product-a"));
        cart.increase(&pid("product-a"));
        cart.increase(&pid("product-b"));

        let err = controller.place().await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
        assert_eq!(cart.total_quantity_for(&pid("product-a")), 2);
        assert_eq!(cart.total_quantity_for(&pid("product-b")), 1);
    }

    #[tokio::test]
    async fn test_confirm_only_from_pending() {
        let fake = FakeOrders::owned_by("u-1");
        let (controller, _cart, _session) = fixtures(&fake);
        fake.seed("o-1", OrderStatus::PendingConfirmation);
        controller.reload().await.expect("reload");

        controller.confirm(&OrderId::new("o-1")).await.expect("confirm");
        assert_eq!(fake.stored_status("o-1"), Some(OrderStatus::Processing));

        // Already processing: a second confirm is rejected locally.
        let err = controller.confirm(&OrderId::new("o-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cancel_unreachable_once_cancelled() {
        let fake = FakeOrders::owned_by("u-1");
        let (controller, _cart, _session) = fixtures(&fake);
        fake.seed("o-1", OrderStatus::Processing);
        controller.reload().await.expect("reload");

        controller.cancel(&OrderId::new("o-1")).await.expect("cancel");
        assert_eq!(fake.stored_status("o-1"), Some(OrderStatus::OrderCancelled));

        let err = controller.cancel(&OrderId::new("o-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_remove_forbidden_while_processing() {
        let fake = FakeOrders::owned_by("u-1");
        let (controller, _cart, _session) = fixtures(&fake);
        fake.seed("o-1", OrderStatus::Processing);
        controller.reload().await.expect("reload");

        let err = controller.remove(&OrderId::new("o-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(fake.stored_status("o-1"), Some(OrderStatus::Processing));

        controller.cancel(&OrderId::new("o-1")).await.expect("cancel");
        controller.remove(&OrderId::new("o-1")).await.expect("remove");
        assert_eq!(fake.stored_status("o-1"), None);
        assert!(controller.orders().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let fake = FakeOrders::owned_by("u-1");
        let (controller, _cart, _session) = fixtures(&fake);

        let err = controller.confirm(&OrderId::new("o-404")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_patch_leaves_displayed_state() {
        let mut fake = FakeOrders::owned_by("u-1");
        fake.fail_patch = true;
        let (controller, _cart, _session) = fixtures(&fake);
        fake.seed("o-1", OrderStatus::PendingConfirmation);
        controller.reload().await.expect("reload");

        let err = controller.confirm(&OrderId::new("o-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));
        // Local list still shows the pre-call status.
        assert_eq!(
            controller.orders()[0].status,
            OrderStatus::PendingConfirmation
        );
    }

    #[tokio::test]
    async fn test_reload_filters_by_profile() {
        let fake = FakeOrders::owned_by("u-1");
        let (controller, _cart, session) = fixtures(&fake);
        fake.seed("o-1", OrderStatus::PendingConfirmation);
        fake.records.lock().expect("records").push(Order {
            id: OrderId::new("o-2"),
            status: OrderStatus::PendingConfirmation,
            line_items: Vec::new(),
            owner_profile_id: ProfileId::new("somebody-else"),
        });

        controller.reload().await.expect("reload");
        let orders = controller.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id.as_str(), "o-1");

        // Without a session there is nothing to show.
        session.logout();
        controller.reload().await.expect("reload");
        assert!(controller.orders().is_empty());
    }

    #[tokio::test]
    async fn test_gauge_cleared_even_on_failure() {
        let mut fake = FakeOrders::owned_by("u-1");
        fake.fail_create = true;
        let gauge = LoadGauge::new();
        let storage = Storage::open(MemoryStore::default()).expect("open");
        let cart = CartStore::new(storage.clone());
        cart.increase(&pid("product-a"));
        let session = SessionStore::new(storage);
        session.login("tok", ProfileId::new("u-1"));
        let controller = OrderController::new(&fake, cart, session, gauge.clone());

        assert!(controller.place().await.is_err());
        assert!(!gauge.is_busy());
    }
}
