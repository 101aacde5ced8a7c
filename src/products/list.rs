//! Paginated product list with category, search and membership filters.
//!
//! Every filter change bumps a generation counter, clears the visible items
//! and reloads page 0. A response is applied only if its generation is still
//! current, so the list never holds results of two different filters.

use std::{collections::HashSet, sync::Arc};

use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, instrument, warn};

use super::{debounce::SettledSearch, dto::ProductSummary, services::ProductService};
use crate::{
    catalog::Category,
    error::Result,
    pagination::PageRequest,
    session::SessionStore,
    state::AppState,
    users::{dto::Membership, services::UserService},
};

/// Membership lists are fetched in one go with this page size.
const MEMBERSHIP_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub category: Option<Category>,
    pub query: String,
    pub restriction: Option<Membership>,
}

/// Point-in-time copy of the list for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSnapshot {
    pub filter: ListFilter,
    pub items: Vec<ProductSummary>,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct ListState {
    filter: ListFilter,
    generation: u64,
    items: Vec<ProductSummary>,
    ids: HashSet<i64>,
    next_page: u32,
    exhausted: bool,
    in_flight: Option<u64>,
    error: Option<String>,
    favorites: HashSet<i64>,
    inventory: HashSet<i64>,
    memberships_loaded: bool,
}

impl ListState {
    fn members(&self, kind: Membership) -> &HashSet<i64> {
        match kind {
            Membership::Favorites => &self.favorites,
            Membership::Inventory => &self.inventory,
        }
    }

    fn members_mut(&mut self, kind: Membership) -> &mut HashSet<i64> {
        match kind {
            Membership::Favorites => &mut self.favorites,
            Membership::Inventory => &mut self.inventory,
        }
    }

    fn reset(&mut self, filter: ListFilter) -> u64 {
        self.filter = filter;
        self.generation += 1;
        self.items.clear();
        self.ids.clear();
        self.next_page = 0;
        self.exhausted = false;
        self.in_flight = None;
        self.error = None;
        self.generation
    }

    fn append(&mut self, page: Vec<ProductSummary>) {
        for item in page {
            if self.ids.insert(item.id) {
                self.items.push(item);
            }
        }
    }

    fn drop_item(&mut self, product_id: i64) {
        if self.ids.remove(&product_id) {
            self.items.retain(|p| p.id != product_id);
        }
    }
}

/// Controller behind the explore, favorites and my-products screens.
///
/// Cheap to clone; clones share the same list.
#[derive(Clone)]
pub struct ProductList {
    products: ProductService,
    users: UserService,
    session: SessionStore,
    page_size: u32,
    state: Arc<Mutex<ListState>>,
}

impl ProductList {
    pub fn new(app: &AppState) -> Self {
        Self::with_filter(app, ListFilter::default())
    }

    /// A list showing only the user's favorites or inventory.
    pub fn restricted(app: &AppState, kind: Membership) -> Self {
        Self::with_filter(
            app,
            ListFilter {
                restriction: Some(kind),
                ..ListFilter::default()
            },
        )
    }

    pub fn with_filter(app: &AppState, filter: ListFilter) -> Self {
        Self {
            products: app.products.clone(),
            users: app.users.clone(),
            session: app.session.clone(),
            page_size: app.config.list.page_size,
            state: Arc::new(Mutex::new(ListState {
                filter,
                ..ListState::default()
            })),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn snapshot(&self) -> ListSnapshot {
        let st = self.state.lock().await;
        ListSnapshot {
            filter: st.filter.clone(),
            items: st.items.clone(),
            has_more: !st.exhausted,
            loading: st.in_flight == Some(st.generation),
            error: st.error.clone(),
        }
    }

    pub async fn filter(&self) -> ListFilter {
        self.state.lock().await.filter.clone()
    }

    pub async fn set_category(&self, category: Option<Category>) -> Result<()> {
        self.change_filter(|f| f.category = category).await
    }

    /// Applies an already debounced search text.
    pub async fn set_query(&self, query: impl Into<String>) -> Result<()> {
        let query = query.into().trim().to_string();
        self.change_filter(|f| f.query = query).await
    }

    pub async fn set_restriction(&self, restriction: Option<Membership>) -> Result<()> {
        self.change_filter(|f| f.restriction = restriction).await
    }

    /// Clears the list and loads page 0 of the current filter again.
    pub async fn refresh(&self) -> Result<()> {
        {
            let mut st = self.state.lock().await;
            let filter = st.filter.clone();
            st.reset(filter);
        }
        self.load_more().await.map(|_| ())
    }

    async fn change_filter<F: FnOnce(&mut ListFilter)>(&self, f: F) -> Result<()> {
        {
            let mut st = self.state.lock().await;
            let mut filter = st.filter.clone();
            f(&mut filter);
            if filter == st.filter && st.generation > 0 {
                return Ok(());
            }
            let generation = st.reset(filter);
            debug!(generation, filter = ?st.filter, "product list filter changed");
        }
        self.load_more().await.map(|_| ())
    }

    /// Loads the next page of the current filter.
    ///
    /// Returns `false` without a request when the last page was reached or a
    /// load of the current filter is already running, and also when the filter
    /// changed while the page was on its way.
    #[instrument(skip(self))]
    pub async fn load_more(&self) -> Result<bool> {
        let (generation, filter, request) = {
            let mut st = self.state.lock().await;
            if st.exhausted || st.in_flight == Some(st.generation) {
                return Ok(false);
            }
            st.in_flight = Some(st.generation);
            (
                st.generation,
                st.filter.clone(),
                PageRequest::new(st.next_page, self.page_size),
            )
        };

        let result = self.fetch(&filter, request).await;

        let mut st = self.state.lock().await;
        if st.generation != generation {
            debug!(generation, current = st.generation, "dropping stale product page");
            return Ok(false);
        }
        st.in_flight = None;
        match result {
            Ok((items, has_more)) => {
                st.exhausted = !has_more;
                st.next_page = request.page + 1;
                st.error = None;
                st.append(items);
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "failed to load products");
                st.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// One page of items for `filter` and whether the server has more.
    ///
    /// Restricted lists are text-filtered here, after `has_more` was taken
    /// from the unfiltered page.
    async fn fetch(
        &self,
        filter: &ListFilter,
        request: PageRequest,
    ) -> Result<(Vec<ProductSummary>, bool)> {
        let query = filter.query.as_str();
        if let Some(kind) = filter.restriction {
            let user = self.session.require_user().await?;
            let page = self
                .users
                .list(kind, user.id, request, filter.category)
                .await?;
            let has_more = page.has_more();
            let mut items = page.content;
            items.retain(|p| p.matches_text(query));
            return Ok((items, has_more));
        }
        let page = if !query.is_empty() {
            self.products
                .search(Some(query), filter.category, request)
                .await?
                .map(ProductSummary::from)
        } else if let Some(category) = filter.category {
            self.products
                .by_category(category, request)
                .await?
                .map(ProductSummary::from)
        } else {
            self.products.page(request).await?
        };
        let has_more = page.has_more();
        Ok((page.content, has_more))
    }

    /// Feeds settled search text into the list until the debouncer goes away.
    pub fn follow_search(&self, mut search: SettledSearch) -> JoinHandle<()> {
        let list = self.clone();
        tokio::spawn(async move {
            while let Some(query) = search.settled().await {
                if let Err(e) = list.set_query(query).await {
                    warn!(error = %e, "search failed");
                }
            }
        })
    }

    /// Fetches the full favorite and inventory sets once.
    #[instrument(skip(self))]
    pub async fn load_memberships(&self) -> Result<()> {
        if self.state.lock().await.memberships_loaded {
            return Ok(());
        }
        let user = self.session.require_user().await?;
        let all = PageRequest::first(MEMBERSHIP_PAGE_SIZE);
        let (favorites, inventory) = tokio::try_join!(
            self.users.list(Membership::Favorites, user.id, all, None),
            self.users.list(Membership::Inventory, user.id, all, None),
        )?;

        let mut st = self.state.lock().await;
        st.favorites = favorites.content.iter().map(|p| p.id).collect();
        st.inventory = inventory.content.iter().map(|p| p.id).collect();
        st.memberships_loaded = true;
        debug!(
            favorites = st.favorites.len(),
            inventory = st.inventory.len(),
            "memberships loaded"
        );
        Ok(())
    }

    pub async fn is_member(&self, kind: Membership, product_id: i64) -> bool {
        self.state.lock().await.members(kind).contains(&product_id)
    }

    /// Flips membership locally, then persists it.
    ///
    /// Memberships are loaded first if they were not yet.
    /// The local flip is undone when the request fails. Leaving a product
    /// from inside its own restricted list also removes the card. Returns
    /// the new membership.
    #[instrument(skip(self))]
    pub async fn toggle(&self, kind: Membership, product_id: i64) -> Result<bool> {
        let user = self.session.require_user().await?;
        self.load_memberships().await?;
        let member = {
            let mut st = self.state.lock().await;
            let set = st.members_mut(kind);
            let member = !set.contains(&product_id);
            if member {
                set.insert(product_id);
            } else {
                set.remove(&product_id);
            }
            member
        };

        match self
            .users
            .set_member(kind, user.id, product_id, member)
            .await
        {
            Ok(()) => {
                let mut st = self.state.lock().await;
                if !member && st.filter.restriction == Some(kind) {
                    st.drop_item(product_id);
                }
                Ok(member)
            }
            Err(e) => {
                warn!(error = %e, product_id, ?kind, "membership change failed; rolling back");
                let mut st = self.state.lock().await;
                let set = st.members_mut(kind);
                if member {
                    set.remove(&product_id);
                } else {
                    set.insert(product_id);
                }
                Err(e)
            }
        }
    }
}
