//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::client::RecordSource;
use crate::session::{Credentials, Dataset, DatasetCache, SessionStore, ViewState};
use crate::views::ViewOptions;

use super::error::{ApiError, ApiResult};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Where records come from (portal or local dump)
    pub source: Arc<dyn RecordSource>,
    /// Dataset fetched for the current session
    pub cache: Arc<DatasetCache>,
    /// Persisted login flag and preferences
    pub session: Arc<Mutex<SessionStore>>,
    /// Active page, filters and selection
    pub view: Arc<Mutex<ViewState>>,
    /// The configured login
    pub credentials: Arc<Credentials>,
    /// Palettes, layout and table sizes
    pub options: Arc<ViewOptions>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Client for boundary downloads
    pub http: reqwest::Client,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        source: Arc<dyn RecordSource>,
        session: SessionStore,
        cache: DatasetCache,
        credentials: Credentials,
        options: ViewOptions,
        config: ApiConfig,
    ) -> Self {
        let view = ViewState::new(session.data().last_page.unwrap_or_default());
        Self {
            source,
            cache: Arc::new(cache),
            session: Arc::new(Mutex::new(session)),
            view: Arc::new(Mutex::new(view)),
            credentials: Arc::new(credentials),
            options: Arc::new(options),
            config: Arc::new(config),
            http: reqwest::Client::new(),
            start_time: Instant::now(),
        }
    }

    /// State over an in-memory session, for tests and one-off tools
    pub fn in_memory(source: Arc<dyn RecordSource>, credentials: Credentials) -> Self {
        Self::new(
            source,
            SessionStore::in_memory(),
            DatasetCache::new(),
            credentials,
            ViewOptions::default(),
            ApiConfig::default(),
        )
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Reject the request unless someone is logged in
    pub async fn require_login(&self) -> ApiResult<()> {
        if self.session.lock().await.is_logged_in() {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Login required".to_string()))
        }
    }

    /// The session dataset, fetching it on first use
    pub async fn dataset(&self) -> ApiResult<Arc<Dataset>> {
        Ok(self.cache.get_or_fetch(self.source.as_ref()).await?)
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins; empty allows any
    pub cors_origins: Vec<String>,
    /// State boundaries (URL or local path)
    pub states_url: Option<String>,
    /// ZIP boundaries (URL or local path)
    pub zips_url: Option<String>,
    /// Requests running longer are answered with 408; 0 disables
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            cors_origins: Vec::new(),
            states_url: None,
            zips_url: None,
            request_timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
