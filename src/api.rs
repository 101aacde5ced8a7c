use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    config::AppConfig,
    error::{ClientError, Result},
    navigation::{Navigator, Route},
    session::SessionStore,
};

/// Query string pairs appended to a request.
pub type Query<'a> = [(&'a str, String)];

/// HTTP client for the Klari backend.
///
/// Every request carries the stored bearer token. A 401 from any endpoint
/// clears the stored credentials and sends the user back to the login screen
/// before the error reaches the caller. There is no retry.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiClient {
    pub fn new(
        config: &AppConfig,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut base_url = Url::parse(&config.api_url)
            .map_err(|e| ClientError::InvalidConfig(format!("api url {}: {e}", config.api_url)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            http,
            base_url,
            session,
            navigator,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidConfig(format!("path {path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self.http.request(method, self.url(path)?))
    }

    async fn execute(&self, req: RequestBuilder) -> Result<Response> {
        let req = match self.session.token().await {
            Some(token) => req.bearer_auth(token),
            None => req,
        };
        let req = req.build()?;
        debug!(method = %req.method(), url = %req.url(), "api request");
        let url = req.url().clone();
        let res = self.http.execute(req).await.map_err(|e| {
            error!(error = %e, %url, "api request failed");
            ClientError::from(e)
        })?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED {
            self.expire_session().await;
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let message = error_message(res).await;
            if status.is_server_error() {
                error!(%status, %url, %message, "api error");
            } else {
                debug!(%status, %url, %message, "api rejected request");
            }
            return Err(ClientError::Api { status, message });
        }
        Ok(res)
    }

    async fn expire_session(&self) {
        warn!("session expired; returning to login");
        if let Err(e) = self.session.clear().await {
            error!(error = %e, "failed to clear stored credentials");
        }
        self.navigator.replace(Route::Login);
    }

    async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &Query<'_>) -> Result<T> {
        let res = self
            .execute(self.request(Method::GET, path)?.query(query))
            .await?;
        Self::decode(res).await
    }

    /// Like [`ApiClient::get`] but maps a 404 to `None`.
    pub async fn get_optional<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query<'_>,
    ) -> Result<Option<T>> {
        match self.get(path, query).await {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let res = self
            .execute(self.request(Method::POST, path)?.json(body))
            .await?;
        Self::decode(res).await
    }

    /// POST without a body, decoding the response.
    pub async fn post_for<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let res = self.execute(self.request(Method::POST, path)?).await?;
        Self::decode(res).await
    }

    /// POST without a body, ignoring the response.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        self.execute(self.request(Method::POST, path)?).await?;
        Ok(())
    }

    pub async fn patch_empty(&self, path: &str, query: &Query<'_>) -> Result<()> {
        self.execute(self.request(Method::PATCH, path)?.query(query))
            .await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(self.request(Method::DELETE, path)?).await?;
        Ok(())
    }
}

async fn error_message(res: Response) -> String {
    let Ok(bytes) = res.bytes().await else {
        return String::new();
    };
    match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => body.message.or(body.error).unwrap_or_default(),
        Err(_) => String::new(),
    }
}
