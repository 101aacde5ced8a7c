use tracing::instrument;

use super::dto::{Routine, RoutineType};
use crate::{api::ApiClient, error::Result};

#[derive(Clone)]
pub struct RoutineService {
    api: ApiClient,
}

impl RoutineService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// The user's active routine of `kind`, `None` when there is none yet.
    #[instrument(skip(self))]
    pub async fn active(&self, user_id: i64, kind: RoutineType) -> Result<Option<Routine>> {
        self.api
            .get_optional(
                &format!("/routines/user/{user_id}/{}/active", kind.path_segment()),
                &[],
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn create_initial(&self, user_id: i64, kind: RoutineType) -> Result<Routine> {
        self.api
            .post_for(&format!(
                "/routines/user/{user_id}/{}/initial",
                kind.path_segment()
            ))
            .await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, routine_id: i64) -> Result<Routine> {
        self.api.get(&format!("/routines/{routine_id}"), &[]).await
    }

    #[instrument(skip(self))]
    pub async fn add_product(&self, routine_id: i64, product_id: i64) -> Result<()> {
        self.api
            .post_empty(&format!("/routines/{routine_id}/products/{product_id}"))
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove_product(&self, routine_id: i64, product_id: i64) -> Result<()> {
        self.api
            .delete(&format!("/routines/{routine_id}/products/{product_id}"))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, routine_id: i64) -> Result<()> {
        self.api.delete(&format!("/routines/{routine_id}")).await
    }
}
