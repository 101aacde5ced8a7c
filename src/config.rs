use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    pub page_size: u32,
    pub search_debounce_ms: u64,
}

impl ListConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            search_debounce_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub api_url: String,
    pub store_path: PathBuf,
    pub http_timeout_secs: u64,
    pub list: ListConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = std::env::var("KLARI_API_URL")?;
        let store_path = std::env::var("KLARI_STORE_PATH")
            .unwrap_or_else(|_| ".klari/session.json".into())
            .into();
        let http_timeout_secs = std::env::var("KLARI_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(15);
        let defaults = ListConfig::default();
        let list = ListConfig {
            page_size: std::env::var("KLARI_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.page_size),
            search_debounce_ms: std::env::var("KLARI_SEARCH_DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.search_debounce_ms),
        };
        Ok(Self {
            api_url,
            store_path,
            http_timeout_secs,
            list,
        })
    }

    /// Config pointing at `api_url` with every other value defaulted.
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            store_path: ".klari/session.json".into(),
            http_timeout_secs: 15,
            list: ListConfig::default(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
