//! Catalog query coordinator.
//!
//! Translates the page/size/direction parameters into fetch requests and
//! reconciles the results into the displayed product list. Pagination is
//! server-side: exactly the current page is requested and the server's
//! total count drives the page bounds. The received page is re-sorted
//! locally (price, then id) so display order is deterministic, and a
//! monotonically increasing generation counter discards responses whose
//! parameters are no longer the latest requested ones.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use green_mango_core::{PageSize, SortDirection};

use crate::api::ApiError;
use crate::error::Result;
use crate::loading::LoadGauge;
use crate::models::{Product, ProductPage};

/// Parameters of one catalog fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogQuery {
    pub page_number: u32,
    pub page_size: PageSize,
    pub sort_direction: SortDirection,
}

/// The coordinator's full query state, including the server-reported total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogQueryState {
    pub page_number: u32,
    pub page_size: PageSize,
    pub sort_direction: SortDirection,
    pub total_count: u64,
}

impl CatalogQueryState {
    fn with_page_size(page_size: PageSize) -> Self {
        Self {
            page_number: 1,
            page_size,
            sort_direction: SortDirection::default(),
            total_count: 0,
        }
    }

    /// Last valid page number for the current total. At least 1, so page 1
    /// stays addressable while the catalog is empty or not yet loaded.
    #[must_use]
    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.page_size.get());
        let pages = self.total_count.div_ceil(size);
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    fn query(&self) -> CatalogQuery {
        CatalogQuery {
            page_number: self.page_number,
            page_size: self.page_size,
            sort_direction: self.sort_direction,
        }
    }
}

/// Availability of the displayed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogStatus {
    /// No fetch has completed yet.
    Pending,
    /// The last fetch reconciled successfully.
    Ready,
    /// The last fetch failed; a manual [`CatalogCoordinator::refresh`] is
    /// the recovery path - there is no automatic retry.
    Unavailable,
}

/// Remote source of catalog pages. Implemented by the API client and by
/// in-process fakes in tests.
pub trait CatalogGateway {
    /// Fetch one page of products.
    fn fetch_page(
        &self,
        query: &CatalogQuery,
    ) -> impl Future<Output = std::result::Result<ProductPage, ApiError>> + Send;
}

/// Coordinates catalog fetches against a [`CatalogGateway`].
pub struct CatalogCoordinator<G> {
    gateway: G,
    gauge: LoadGauge,
    inner: Mutex<CatalogInner>,
}

struct CatalogInner {
    query: CatalogQueryState,
    products: Vec<Product>,
    status: CatalogStatus,
    generation: u64,
}

impl<G: CatalogGateway> CatalogCoordinator<G> {
    /// Create a coordinator starting at page 1 of `page_size`-sized pages.
    pub fn new(gateway: G, gauge: LoadGauge, page_size: PageSize) -> Self {
        Self {
            gateway,
            gauge,
            inner: Mutex::new(CatalogInner {
                query: CatalogQueryState::with_page_size(page_size),
                products: Vec::new(),
                status: CatalogStatus::Pending,
                generation: 0,
            }),
        }
    }

    fn locked(&self) -> MutexGuard<'_, CatalogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refetch with the current parameters. Also the manual recovery path
    /// out of [`CatalogStatus::Unavailable`].
    pub async fn refresh(&self) -> Result<()> {
        self.run_fetch().await
    }

    /// Switch the page size, resetting to page 1, and refetch.
    pub async fn set_page_size(&self, page_size: PageSize) -> Result<()> {
        {
            let mut inner = self.locked();
            inner.query.page_size = page_size;
            inner.query.page_number = 1;
        }
        self.run_fetch().await
    }

    /// Switch the sort direction, resetting to page 1, and refetch.
    pub async fn set_sort_direction(&self, direction: SortDirection) -> Result<()> {
        {
            let mut inner = self.locked();
            inner.query.sort_direction = direction;
            inner.query.page_number = 1;
        }
        self.run_fetch().await
    }

    /// Move to `page_number`, clamped into `[1, total_pages]`, and refetch.
    /// A request that clamps onto the current page is a no-op.
    pub async fn set_page_number(&self, page_number: u32) -> Result<()> {
        let changed = {
            let mut inner = self.locked();
            let clamped = page_number.clamp(1, inner.query.total_pages());
            let changed = clamped != inner.query.page_number;
            inner.query.page_number = clamped;
            changed
        };
        if !changed {
            return Ok(());
        }
        self.run_fetch().await
    }

    /// The displayed products, already sorted and bounded by the page size.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.locked().products.clone()
    }

    /// The current query state.
    #[must_use]
    pub fn query_state(&self) -> CatalogQueryState {
        self.locked().query
    }

    /// Availability of the displayed catalog.
    #[must_use]
    pub fn status(&self) -> CatalogStatus {
        self.locked().status
    }

    async fn run_fetch(&self) -> Result<()> {
        let _busy = self.gauge.begin();

        // Tag this request; anything reconciling later under an older tag
        // is a stale response and must not overwrite newer state.
        let (generation, query) = {
            let mut inner = self.locked();
            inner.generation += 1;
            (inner.generation, inner.query.query())
        };

        match self.gateway.fetch_page(&query).await {
            Ok(page) => {
                let mut inner = self.locked();
                if inner.generation == generation {
                    reconcile(&mut inner, page);
                } else {
                    tracing::debug!(generation, "discarding stale catalog response");
                }
                Ok(())
            }
            Err(err) => {
                let mut inner = self.locked();
                if inner.generation == generation {
                    inner.status = CatalogStatus::Unavailable;
                    tracing::warn!(error = %err, "catalog unavailable");
                }
                Err(err.into())
            }
        }
    }
}

fn reconcile(inner: &mut CatalogInner, page: ProductPage) {
    let mut items = page.items;
    sort_products(&mut items, inner.query.sort_direction);
    items.truncate(inner.query.page_size.get() as usize);

    inner.query.total_count = page.total;
    let bound = inner.query.total_pages();
    if inner.query.page_number > bound {
        inner.query.page_number = bound;
    }

    inner.products = items;
    inner.status = CatalogStatus::Ready;
}

/// Sort by price in the given direction. Ties always break by id in
/// ascending order, which makes the order a strict weak ordering over price:
/// sorting is idempotent and reversing the direction exactly reverses items
/// with distinct prices.
fn sort_products(items: &mut [Product], direction: SortDirection) {
    items.sort_by(|a, b| {
        let by_price = match direction {
            SortDirection::Ascending => a.price.cmp(&b.price),
            SortDirection::Descending => b.price.cmp(&a.price),
        };
        by_price.then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use rust_decimal::Decimal;

    use green_mango_core::{Price, ProductId};

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product {id}"),
            description: String::new(),
            price: Price::new(Decimal::new(cents, 2)).expect("price"),
            photo_url: String::new(),
            category: None,
        }
    }

    /// Serves a fixed catalog with server-side pagination and records every
    /// query it answers. Requests for [`PageSize::Four`] are delayed so a
    /// test can interleave a stale response behind a fresh one.
    struct FakeCatalog {
        items: Vec<Product>,
        calls: StdMutex<Vec<CatalogQuery>>,
        slow_four: bool,
        fail: bool,
    }

    impl FakeCatalog {
        fn with_items(items: Vec<Product>) -> Self {
            Self {
                items,
                calls: StdMutex::new(Vec::new()),
                slow_four: false,
                fail: false,
            }
        }

        fn page_for(&self, query: &CatalogQuery) -> ProductPage {
            let size = query.page_size.get() as usize;
            let start = (query.page_number as usize - 1) * size;
            let items = self
                .items
                .iter()
                .skip(start)
                .take(size)
                .cloned()
                .collect();
            ProductPage {
                items,
                total: self.items.len() as u64,
            }
        }
    }

    impl CatalogGateway for &FakeCatalog {
        fn fetch_page(
            &self,
            query: &CatalogQuery,
        ) -> impl Future<Output = std::result::Result<ProductPage, ApiError>> + Send {
            self.calls
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(*query);
            let delay = if self.slow_four && query.page_size == PageSize::Four {
                Duration::from_millis(50)
            } else {
                Duration::ZERO
            };
            let result = if self.fail {
                Err(ApiError::GraphQL(vec![]))
            } else {
                Ok(self.page_for(query))
            };
            async move {
                tokio::time::sleep(delay).await;
                result
            }
        }
    }

    fn catalog_of(n: usize) -> Vec<Product> {
        (1..=n).map(|i| product(&format!("p-{i:02}"), i as i64 * 100)).collect()
    }

    #[tokio::test]
    async fn test_refresh_reconciles_page_and_total() {
        let fake = FakeCatalog::with_items(catalog_of(20));
        let coordinator = CatalogCoordinator::new(&fake, LoadGauge::new(), PageSize::Eight);

        coordinator.refresh().await.expect("refresh");
        assert_eq!(coordinator.status(), CatalogStatus::Ready);
        let state = coordinator.query_state();
        assert_eq!(state.total_count, 20);
        assert_eq!(state.total_pages(), 3);
        assert_eq!(coordinator.products().len(), 8);
    }

    #[tokio::test]
    async fn test_page_size_change_resets_page_number() {
        let fake = FakeCatalog::with_items(catalog_of(20));
        let coordinator = CatalogCoordinator::new(&fake, LoadGauge::new(), PageSize::Eight);
        coordinator.refresh().await.expect("refresh");
        coordinator.set_page_number(3).await.expect("page 3");
        assert_eq!(coordinator.query_state().page_number, 3);

        coordinator
            .set_page_size(PageSize::Four)
            .await
            .expect("resize");
        let state = coordinator.query_state();
        assert_eq!(state.page_number, 1);
        assert_eq!(state.page_size, PageSize::Four);
        assert!(coordinator.products().len() <= 4);
    }

    #[tokio::test]
    async fn test_sort_direction_change_resets_page_number() {
        let fake = FakeCatalog::with_items(catalog_of(20));
        let coordinator = CatalogCoordinator::new(&fake, LoadGauge::new(), PageSize::Eight);
        coordinator.refresh().await.expect("refresh");
        coordinator.set_page_number(2).await.expect("page 2");

        coordinator
            .set_sort_direction(SortDirection::Descending)
            .await
            .expect("sort");
        assert_eq!(coordinator.query_state().page_number, 1);
    }

    #[tokio::test]
    async fn test_out_of_bounds_page_clamps() {
        // pageSize=8, totalCount=20 -> totalPages=3; page 4 clamps to 3.
        let fake = FakeCatalog::with_items(catalog_of(20));
        let coordinator = CatalogCoordinator::new(&fake, LoadGauge::new(), PageSize::Eight);
        coordinator.refresh().await.expect("refresh");

        coordinator.set_page_number(4).await.expect("clamped");
        assert_eq!(coordinator.query_state().page_number, 3);

        coordinator.set_page_number(0).await.expect("clamped");
        assert_eq!(coordinator.query_state().page_number, 1);
    }

    #[tokio::test]
    async fn test_page_number_noop_skips_fetch() {
        let fake = FakeCatalog::with_items(catalog_of(20));
        let coordinator = CatalogCoordinator::new(&fake, LoadGauge::new(), PageSize::Eight);
        coordinator.refresh().await.expect("refresh");
        let calls_before = fake.calls.lock().expect("calls").len();

        coordinator.set_page_number(1).await.expect("noop");
        assert_eq!(fake.calls.lock().expect("calls").len(), calls_before);
    }

    #[test]
    fn test_sorting_is_deterministic_and_reversible() {
        let mut items = vec![
            product("p-b", 300),
            product("p-a", 100),
            product("p-c", 200),
            // Tie on price with p-c; id breaks it.
            product("p-0", 200),
        ];
        sort_products(&mut items, SortDirection::Ascending);
        let ascending: Vec<_> = items.iter().map(|p| p.id.as_str().to_owned()).collect();
        assert_eq!(ascending, ["p-a", "p-0", "p-c", "p-b"]);

        // Idempotent: sorting again changes nothing.
        sort_products(&mut items, SortDirection::Ascending);
        let again: Vec<_> = items.iter().map(|p| p.id.as_str().to_owned()).collect();
        assert_eq!(again, ascending);

        // Distinct prices reverse exactly under the opposite direction.
        let mut distinct = vec![product("p-a", 100), product("p-b", 300), product("p-c", 200)];
        sort_products(&mut distinct, SortDirection::Descending);
        let descending: Vec<_> = distinct.iter().map(|p| p.id.as_str().to_owned()).collect();
        assert_eq!(descending, ["p-b", "p-c", "p-a"]);
    }

    #[tokio::test]
    async fn test_failure_is_terminal_until_manual_refresh() {
        let mut fake = FakeCatalog::with_items(catalog_of(8));
        fake.fail = true;
        let coordinator = CatalogCoordinator::new(&fake, LoadGauge::new(), PageSize::Eight);

        assert!(coordinator.refresh().await.is_err());
        assert_eq!(coordinator.status(), CatalogStatus::Unavailable);

        // No automatic retry happened: the call log has exactly one entry.
        assert_eq!(fake.calls.lock().expect("calls").len(), 1);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let mut fake = FakeCatalog::with_items(catalog_of(20));
        fake.slow_four = true;
        let coordinator = CatalogCoordinator::new(&fake, LoadGauge::new(), PageSize::Four);

        // The slow PageSize::Four fetch is superseded by a fast
        // PageSize::Eight fetch; the late response must not win.
        let (stale, fresh) = tokio::join!(
            coordinator.refresh(),
            coordinator.set_page_size(PageSize::Eight),
        );
        stale.expect("stale fetch completes");
        fresh.expect("fresh fetch completes");

        let state = coordinator.query_state();
        assert_eq!(state.page_size, PageSize::Eight);
        assert_eq!(coordinator.products().len(), 8);
    }

    #[tokio::test]
    async fn test_gauge_busy_only_while_fetching() {
        let fake = FakeCatalog::with_items(catalog_of(4));
        let gauge = LoadGauge::new();
        let coordinator = CatalogCoordinator::new(&fake, gauge.clone(), PageSize::Four);
        assert!(!gauge.is_busy());
        coordinator.refresh().await.expect("refresh");
        assert!(!gauge.is_busy());
    }

    #[tokio::test]
    async fn test_gauge_cleared_even_on_failure() {
        let mut fake = FakeCatalog::with_items(catalog_of(4));
        fake.fail = true;
        let gauge = LoadGauge::new();
        let coordinator = CatalogCoordinator::new(&fake, gauge.clone(), PageSize::Four);
        assert!(coordinator.refresh().await.is_err());
        assert!(!gauge.is_busy());
    }
}
