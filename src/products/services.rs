use tracing::instrument;

use super::dto::{Product, ProductSummary};
use crate::{
    api::ApiClient,
    catalog::{ApplicationTime, Category, Goal, SkinType},
    error::Result,
    pagination::{Page, PageRequest},
};

/// Parameters of a routine recommendation query.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub category: Category,
    pub time: ApplicationTime,
    pub skin_type: Option<SkinType>,
    pub goals: Vec<Goal>,
}

impl Recommendation {
    fn query(&self) -> Vec<(&'static str, String)> {
        let goals = self
            .goals
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(",");
        vec![
            ("category", self.category.as_str().to_string()),
            ("time", self.time.as_str().to_string()),
            (
                "skinType",
                self.skin_type.map(|s| s.as_str().to_string()).unwrap_or_default(),
            ),
            ("goals", goals),
        ]
    }
}

#[derive(Clone)]
pub struct ProductService {
    api: ApiClient,
}

impl ProductService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[instrument(skip(self))]
    pub async fn page(&self, page: PageRequest) -> Result<Page<ProductSummary>> {
        self.api.get("/products/summary", &page.query()).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Product> {
        self.api.get(&format!("/products/{id}"), &[]).await
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, id: i64) -> Result<ProductSummary> {
        self.api.get(&format!("/products/{id}/summary"), &[]).await
    }

    /// Free-text search, optionally restricted to a category.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: Option<&str>,
        category: Option<Category>,
        page: PageRequest,
    ) -> Result<Page<Product>> {
        let mut params = page.query();
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        if let Some(c) = category {
            params.push(("category", c.as_str().to_string()));
        }
        self.api.get("/products/search", &params).await
    }

    #[instrument(skip(self))]
    pub async fn by_category(&self, category: Category, page: PageRequest) -> Result<Page<Product>> {
        self.api
            .get(&format!("/products/category/{}", category.as_str()), &page.query())
            .await
    }

    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        params: &Recommendation,
        page: PageRequest,
    ) -> Result<Page<ProductSummary>> {
        let mut query = params.query();
        query.extend(page.query());
        self.api.get("/products/routine/recommend", &query).await
    }

    /// Top `limit` recommendations without paging.
    #[instrument(skip(self))]
    pub async fn recommend_simple(
        &self,
        params: &Recommendation,
        limit: u32,
    ) -> Result<Vec<ProductSummary>> {
        let mut query = params.query();
        query.push(("limit", limit.to_string()));
        self.api.get("/products/routine/recommend/simple", &query).await
    }
}
