use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use super::dto::RoutineType;
use crate::{
    catalog::StepKind,
    error::{ClientError, Result},
    pagination::{Page, PageRequest},
    products::{
        dto::ProductSummary,
        services::{ProductService, Recommendation},
    },
    session::SessionStore,
    state::AppState,
    users::{dto::Membership, services::UserService},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickerTab {
    Suggestions,
    Favorites,
    Inventory,
}

#[derive(Debug)]
struct TabPages {
    items: Vec<ProductSummary>,
    ids: HashSet<i64>,
    next: PageRequest,
    exhausted: bool,
}

impl TabPages {
    fn new(size: u32) -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
            next: PageRequest::first(size),
            exhausted: false,
        }
    }
}

/// Product selection for one routine step.
///
/// Each tab pages on its own and is fetched the first time it is shown.
pub struct ProductPicker {
    products: ProductService,
    users: UserService,
    session: SessionStore,
    routine_type: RoutineType,
    step: StepKind,
    page_size: u32,
    active: PickerTab,
    tabs: HashMap<PickerTab, TabPages>,
}

impl ProductPicker {
    pub fn new(app: &AppState, routine_type: RoutineType, step: StepKind) -> Self {
        Self {
            products: app.products.clone(),
            users: app.users.clone(),
            session: app.session.clone(),
            routine_type,
            step,
            page_size: app.config.list.page_size,
            active: PickerTab::Suggestions,
            tabs: HashMap::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn step(&self) -> StepKind {
        self.step
    }

    pub fn active_tab(&self) -> PickerTab {
        self.active
    }

    pub fn items(&self, tab: PickerTab) -> &[ProductSummary] {
        self.tabs
            .get(&tab)
            .map(|t| t.items.as_slice())
            .unwrap_or_default()
    }

    pub fn has_more(&self, tab: PickerTab) -> bool {
        self.tabs.get(&tab).map_or(true, |t| !t.exhausted)
    }

    /// Shows `tab`, loading its first page if it was never shown.
    pub async fn select_tab(&mut self, tab: PickerTab) -> Result<()> {
        self.active = tab;
        if self.tabs.contains_key(&tab) {
            return Ok(());
        }
        self.load_more().await.map(|_| ())
    }

    /// Next page of the active tab; `false` once the tab is exhausted.
    #[instrument(skip(self), fields(tab = ?self.active, step = %self.step))]
    pub async fn load_more(&mut self) -> Result<bool> {
        let tab = self.active;
        let size = self.page_size;
        let request = {
            let pages = self.tabs.entry(tab).or_insert_with(|| TabPages::new(size));
            if pages.exhausted {
                return Ok(false);
            }
            pages.next
        };

        let page = match self.fetch(tab, request).await {
            Ok(page) => page,
            Err(e) => {
                if request.page == 0 {
                    self.tabs.remove(&tab);
                }
                return Err(e);
            }
        };

        let pages = self.tabs.entry(tab).or_insert_with(|| TabPages::new(size));
        pages.exhausted = !page.has_more();
        pages.next = request.next();
        for item in page.content {
            if pages.ids.insert(item.id) {
                pages.items.push(item);
            }
        }
        debug!(loaded = pages.items.len(), "picker page loaded");
        Ok(true)
    }

    async fn fetch(&self, tab: PickerTab, request: PageRequest) -> Result<Page<ProductSummary>> {
        let user = self.session.require_user().await?;
        let category = Some(self.step.category());
        match tab {
            PickerTab::Suggestions => {
                let params = Recommendation {
                    category: self.step.category(),
                    time: self.routine_type.application_time(),
                    skin_type: user.skin_type,
                    goals: user.goals.clone(),
                };
                self.products.recommend(&params, request).await
            }
            PickerTab::Favorites => {
                self.users
                    .list(Membership::Favorites, user.id, request, category)
                    .await
            }
            PickerTab::Inventory => {
                self.users
                    .list(Membership::Inventory, user.id, request, category)
                    .await
            }
        }
    }

    /// Confirms a product listed in the active tab and hands back its id.
    pub fn choose(&self, product_id: i64) -> Result<i64> {
        if self.items(self.active).iter().any(|p| p.id == product_id) {
            Ok(product_id)
        } else {
            Err(ClientError::Validation(format!(
                "product {product_id} is not listed for {}",
                self.step
            )))
        }
    }
}
