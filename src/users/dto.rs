use serde::{Deserialize, Serialize};

use crate::catalog::{Goal, SkinType};

/// User profile as stored on the device and returned by `GET /users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub skin_type: Option<SkinType>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

/// The two per-user product sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Favorites,
    Inventory,
}

impl Membership {
    pub(crate) fn path_segment(self) -> &'static str {
        match self {
            Membership::Favorites => "favorites",
            Membership::Inventory => "inventory",
        }
    }
}
