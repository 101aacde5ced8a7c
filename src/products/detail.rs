use tracing::{instrument, warn};

use super::dto::Product;
use crate::{
    error::Result,
    session::SessionStore,
    state::AppState,
    users::{dto::Membership, services::UserService},
};

/// Product detail screen: the full product and the user's two flags for it.
pub struct ProductDetail {
    pub product: Product,
    pub favorite: bool,
    pub owned: bool,
    users: UserService,
    session: SessionStore,
}

impl ProductDetail {
    #[instrument(skip(app))]
    pub async fn load(app: &AppState, product_id: i64) -> Result<Self> {
        let user = app.session.require_user().await?;
        let (product, favorite, owned) = tokio::try_join!(
            app.products.get(product_id),
            app.users.contains(Membership::Favorites, user.id, product_id),
            app.users.contains(Membership::Inventory, user.id, product_id),
        )?;
        Ok(Self {
            product,
            favorite,
            owned,
            users: app.users.clone(),
            session: app.session.clone(),
        })
    }

    pub fn is_member(&self, kind: Membership) -> bool {
        match kind {
            Membership::Favorites => self.favorite,
            Membership::Inventory => self.owned,
        }
    }

    fn flag_mut(&mut self, kind: Membership) -> &mut bool {
        match kind {
            Membership::Favorites => &mut self.favorite,
            Membership::Inventory => &mut self.owned,
        }
    }

    /// Flips the flag, persists it and restores it if the request fails.
    pub async fn toggle(&mut self, kind: Membership) -> Result<bool> {
        let user = self.session.require_user().await?;
        let member = !self.is_member(kind);
        *self.flag_mut(kind) = member;
        if let Err(e) = self
            .users
            .set_member(kind, user.id, self.product.id, member)
            .await
        {
            warn!(error = %e, product_id = self.product.id, ?kind, "membership change failed; rolling back");
            *self.flag_mut(kind) = !member;
            return Err(e);
        }
        Ok(member)
    }
}
