use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{
    error::{ClientError, Result},
    storage::KeyValueStore,
    users::dto::User,
};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// Credentials of the signed in user.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Persisted session mirrored in memory.
///
/// The device store is the source of truth across restarts; the in-memory copy
/// is what request signing and the screens read.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Reads the persisted session; both the token and the user must be present.
    pub async fn load(&self) -> Result<Option<Session>> {
        let token = self.store.get(TOKEN_KEY).await.map_err(ClientError::Storage)?;
        let user = self.store.get(USER_KEY).await.map_err(ClientError::Storage)?;

        let session = match (token, user) {
            (Some(token), Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(Session { token, user }),
                Err(e) => {
                    warn!(error = %e, "stored user is unreadable; ignoring session");
                    None
                }
            },
            _ => None,
        };
        *self.current.write().await = session.clone();
        Ok(session)
    }

    pub async fn save(&self, session: Session) -> Result<()> {
        let raw = serde_json::to_string(&session.user)?;
        self.store
            .set(TOKEN_KEY, &session.token)
            .await
            .map_err(ClientError::Storage)?;
        self.store
            .set(USER_KEY, &raw)
            .await
            .map_err(ClientError::Storage)?;
        info!(user_id = session.user.id, "session stored");
        *self.current.write().await = Some(session);
        Ok(())
    }

    /// Drops the credentials from memory and from the device store.
    ///
    /// The in-memory copy is cleared even when the device store fails, and
    /// every key is attempted before the first failure is reported.
    pub async fn clear(&self) -> Result<()> {
        *self.current.write().await = None;
        let token = self.store.remove(TOKEN_KEY).await;
        let user = self.store.remove(USER_KEY).await;
        token.and(user).map_err(ClientError::Storage)
    }

    pub async fn token(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn user(&self) -> Option<User> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn require_user(&self) -> Result<User> {
        self.user().await.ok_or(ClientError::NotSignedIn)
    }

    /// Applies `f` to the stored user and persists the result.
    pub async fn update_user<F>(&self, f: F) -> Result<User>
    where
        F: FnOnce(&mut User),
    {
        let mut session = self
            .current
            .read()
            .await
            .clone()
            .ok_or(ClientError::NotSignedIn)?;
        f(&mut session.user);
        let user = session.user.clone();
        self.save(session).await?;
        Ok(user)
    }
}
