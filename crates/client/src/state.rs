//! Application state shared across consumers.
//!
//! One explicit owner for the process-wide singletons: storage, session,
//! cart, catalog coordinator, order controller and the API client. Views
//! receive it by parameter instead of reaching into ambient globals, which
//! keeps every piece testable in isolation.

use std::sync::Arc;

use secrecy::SecretString;

use green_mango_core::{ProfileId, Role};

use crate::api::CatalogClient;
use crate::basket::{self, BasketItem};
use crate::cart::CartStore;
use crate::catalog::CatalogCoordinator;
use crate::config::ClientConfig;
use crate::loading::LoadGauge;
use crate::orders::OrderController;
use crate::policy;
use crate::session::SessionStore;
use crate::storage::{JsonFileStore, Storage, StorageError};

/// Application state shared across all consumers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// shared singletons.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    storage: Storage,
    client: CatalogClient,
    cart: CartStore,
    session: SessionStore,
    gauge: LoadGauge,
    catalog: CatalogCoordinator<CatalogClient>,
    orders: OrderController<CatalogClient>,
}

impl AppState {
    /// Create the application state, reading the durable document from the
    /// configured state file.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable state cannot be read.
    pub fn new(config: ClientConfig) -> Result<Self, StorageError> {
        let storage = Storage::open(JsonFileStore::new(&config.storage_path))?;
        Ok(Self::with_storage(config, storage))
    }

    /// Create the application state over an already-opened [`Storage`]
    /// (used by tests and embedders with their own backend).
    #[must_use]
    pub fn with_storage(config: ClientConfig, storage: Storage) -> Self {
        let client = CatalogClient::new(&config);
        // Resume the persisted session, if any.
        if let Some(token) = storage.snapshot().session_token {
            client.set_token(SecretString::from(token));
        }

        let cart = CartStore::new(storage.clone());
        let session = SessionStore::new(storage.clone());
        let gauge = LoadGauge::new();
        let catalog = CatalogCoordinator::new(
            client.clone(),
            gauge.clone(),
            config.default_page_size,
        );
        let orders = OrderController::new(
            client.clone(),
            cart.clone(),
            session.clone(),
            gauge.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                client,
                cart,
                session,
                gauge,
                catalog,
                orders,
            }),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Get a reference to the catalog coordinator.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCoordinator<CatalogClient> {
        &self.inner.catalog
    }

    /// Get a reference to the order controller.
    #[must_use]
    pub fn orders(&self) -> &OrderController<CatalogClient> {
        &self.inner.orders
    }

    /// Get a reference to the API client.
    #[must_use]
    pub fn client(&self) -> &CatalogClient {
        &self.inner.client
    }

    /// Get a reference to the shared loading gauge.
    #[must_use]
    pub fn gauge(&self) -> &LoadGauge {
        &self.inner.gauge
    }

    // =========================================================================
    // Cross-cutting Operations
    // =========================================================================

    /// Establish a session: persist the token and profile id and attach the
    /// token to subsequent API calls.
    pub fn login(&self, token: impl Into<String>, profile_id: ProfileId) {
        let token = token.into();
        self.inner.client.set_token(SecretString::from(token.clone()));
        self.inner.session.login(token, profile_id);
    }

    /// Tear the session down: clear the token everywhere and empty the cart.
    pub fn logout(&self) {
        self.inner.client.clear_token();
        self.inner.session.logout();
        self.inner.cart.clear();
    }

    /// Place an order from the current cart contents. Delegates to the
    /// order controller, which reads the live cart at the moment of the
    /// remote call and clears it only on success.
    ///
    /// # Errors
    ///
    /// See [`OrderController::place`].
    pub async fn place_order(&self) -> crate::error::Result<green_mango_core::OrderId> {
        self.inner.orders.place().await
    }

    /// Fetch the signed-in user's profile, classified into the domain error
    /// taxonomy.
    ///
    /// # Errors
    ///
    /// [`crate::StoreError::Authorization`] when the service rejects the
    /// session, otherwise the classified remote failure.
    pub async fn profile(&self) -> crate::error::Result<crate::models::Profile> {
        Ok(self.inner.client.profile().await?)
    }

    /// Resolve the current cart into basket rows (product snapshot joined
    /// with quantity), reporting row loads through the shared gauge.
    ///
    /// # Errors
    ///
    /// The classified remote failure of the first row that fails with
    /// anything other than "not found".
    pub async fn load_basket(&self) -> crate::error::Result<Vec<BasketItem>> {
        basket::load_basket(&self.inner.client, &self.inner.cart, &self.inner.gauge).await
    }

    /// The capability level of the current session.
    #[must_use]
    pub fn role(&self) -> Role {
        policy::role_for(
            &self.inner.session.current(),
            &self.inner.config.admin_profile_id,
        )
    }

    /// Persist the presentation layer's theme mode.
    pub fn set_theme_mode(&self, mode: impl Into<String>) {
        self.inner.storage.set_theme_mode(Some(mode.into()));
    }

    /// Persist the presentation layer's language code.
    pub fn set_language_code(&self, code: impl Into<String>) {
        self.inner.storage.set_language_code(Some(code.into()));
    }
}
