use tracing::instrument;

use super::dto::{Membership, User};
use crate::{
    api::ApiClient,
    catalog::{Category, Goal, SkinType},
    error::Result,
    pagination::{Page, PageRequest},
    products::dto::ProductSummary,
};

#[derive(Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: i64) -> Result<User> {
        self.api.get(&format!("/users/{user_id}"), &[]).await
    }

    /// One page of a membership list, optionally restricted to a category.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        kind: Membership,
        user_id: i64,
        page: PageRequest,
        category: Option<Category>,
    ) -> Result<Page<ProductSummary>> {
        let mut query = page.query();
        if let Some(c) = category {
            query.push(("category", c.as_str().to_string()));
        }
        self.api
            .get(
                &format!("/users/{user_id}/{}/summary", kind.path_segment()),
                &query,
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn contains(&self, kind: Membership, user_id: i64, product_id: i64) -> Result<bool> {
        self.api
            .get(
                &format!(
                    "/users/{user_id}/{}/{product_id}/exists",
                    kind.path_segment()
                ),
                &[],
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn add(&self, kind: Membership, user_id: i64, product_id: i64) -> Result<()> {
        self.api
            .post_empty(&format!(
                "/users/{user_id}/{}/{product_id}",
                kind.path_segment()
            ))
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, kind: Membership, user_id: i64, product_id: i64) -> Result<()> {
        self.api
            .delete(&format!(
                "/users/{user_id}/{}/{product_id}",
                kind.path_segment()
            ))
            .await
    }

    /// Adds or removes `product_id` so that its membership equals `member`.
    pub async fn set_member(
        &self,
        kind: Membership,
        user_id: i64,
        product_id: i64,
        member: bool,
    ) -> Result<()> {
        if member {
            self.add(kind, user_id, product_id).await
        } else {
            self.remove(kind, user_id, product_id).await
        }
    }

    #[instrument(skip(self))]
    pub async fn set_skin_type(&self, user_id: i64, skin_type: SkinType) -> Result<()> {
        self.api
            .patch_empty(
                &format!("/users/{user_id}/skin-type"),
                &[("skinType", skin_type.as_str().to_string())],
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn add_goal(&self, user_id: i64, goal: Goal) -> Result<()> {
        self.api
            .post_empty(&format!("/users/{user_id}/goals/{}", goal.as_str()))
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_goal(&self, user_id: i64, goal: Goal) -> Result<()> {
        self.api
            .delete(&format!("/users/{user_id}/goals/{}", goal.as_str()))
            .await
    }
}
