use std::sync::Arc;

use crate::{
    api::ApiClient,
    auth::services::AuthState,
    config::AppConfig,
    error::Result,
    navigation::{AppRouter, Navigator},
    products::services::ProductService,
    routines::services::RoutineService,
    session::SessionStore,
    storage::{FileStore, KeyValueStore},
    users::services::UserService,
};

/// Everything a screen needs, built once at start-up and passed down.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn KeyValueStore>,
    pub session: SessionStore,
    pub router: Arc<AppRouter>,
    pub api: ApiClient,
    pub auth: AuthState,
    pub products: ProductService,
    pub users: UserService,
    pub routines: RoutineService,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = Arc::new(FileStore::new(&config.store_path)) as Arc<dyn KeyValueStore>;
        let router = Arc::new(AppRouter::default());
        Ok(Self::from_parts(config, store, router)?)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn KeyValueStore>,
        router: Arc<AppRouter>,
    ) -> Result<Self> {
        let session = SessionStore::new(store.clone());
        let navigator = router.clone() as Arc<dyn Navigator>;
        let api = ApiClient::new(&config, session.clone(), navigator.clone())?;
        let users = UserService::new(api.clone());
        let auth = AuthState::new(api.clone(), users.clone(), session.clone(), navigator);
        Ok(Self {
            products: ProductService::new(api.clone()),
            users,
            routines: RoutineService::new(api.clone()),
            config,
            store,
            session,
            router,
            api,
            auth,
        })
    }
}
