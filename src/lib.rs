//! Client core for the Klari skincare app: session handling, the REST client
//! and the screen controllers (product lists, routines, onboarding).

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod navigation;
pub mod pagination;
pub mod products;
pub mod routines;
pub mod session;
pub mod state;
pub mod storage;
pub mod users;

#[cfg(test)]
mod test_support;

pub use error::{ClientError, Result};
pub use state::AppState;
