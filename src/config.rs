//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::ApiConfig;
use crate::client::{FileSource, PortalClient, PortalConfig, RecordSource, SourceResult};
use crate::layout::LayoutConfig;
use crate::scale::Palette;
use crate::session::Credentials;
use crate::views::ViewOptions;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub portal: PortalSection,

    #[serde(default)]
    pub geo: GeoConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub map: MapConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dashboard backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Where records come from
#[derive(Debug, Clone, Deserialize)]
pub struct PortalSection {
    #[serde(default = "default_portal_url")]
    pub url: String,

    #[serde(default = "default_records_path")]
    pub records_path: String,

    #[serde(default = "default_hcp_360_path")]
    pub hcp_360_path: String,

    #[serde(default = "default_hco_360_path")]
    pub hco_360_path: String,

    #[serde(default = "default_territories_path")]
    pub territories_path: String,

    #[serde(default = "default_portal_timeout")]
    pub request_timeout_ms: u64,

    /// Local JSON dump; when set the portal is not contacted
    pub input: Option<String>,

    /// Local ZIP → territory file, used with `input`
    pub territories_file: Option<String>,
}

fn default_portal_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_records_path() -> String {
    "/api/records".to_string()
}

fn default_hcp_360_path() -> String {
    "/api/hcp360/{name}".to_string()
}

fn default_hco_360_path() -> String {
    "/api/hco360/{mdm}".to_string()
}

fn default_territories_path() -> String {
    "/api/zip-territories".to_string()
}

fn default_portal_timeout() -> u64 {
    30_000
}

impl Default for PortalSection {
    fn default() -> Self {
        Self {
            url: default_portal_url(),
            records_path: default_records_path(),
            hcp_360_path: default_hcp_360_path(),
            hco_360_path: default_hco_360_path(),
            territories_path: default_territories_path(),
            request_timeout_ms: default_portal_timeout(),
            input: None,
            territories_file: None,
        }
    }
}

impl PortalSection {
    pub fn client_config(&self) -> PortalConfig {
        PortalConfig {
            base_url: self.url.clone(),
            records_path: self.records_path.clone(),
            hcp_360_path: self.hcp_360_path.clone(),
            hco_360_path: self.hco_360_path.clone(),
            territories_path: self.territories_path.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }
}

/// Boundary documents for the choropleths (URL or local path)
#[derive(Debug, Clone, Deserialize)]
pub struct GeoConfig {
    #[serde(default = "default_states_url")]
    pub states_url: String,

    pub zips_url: Option<String>,
}

fn default_states_url() -> String {
    "https://raw.githubusercontent.com/PublicaMundi/MappingAPI/master/data/geojson/us-states.json"
        .to_string()
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            states_url: default_states_url(),
            zips_url: None,
        }
    }
}

/// The single login
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_password")]
    pub password: String,
}

fn default_email() -> String {
    Credentials::default().email
}

fn default_password() -> String {
    Credentials::default().password
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            password: default_password(),
        }
    }
}

/// Session file and dataset cache
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Mirror the dataset cache to `<data_dir>/dataset.json`
    #[serde(default)]
    pub mirror_cache: bool,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("sma-landscape").to_string_lossy().to_string())
        .unwrap_or_else(|| "./landscape_data".to_string())
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            mirror_cache: false,
        }
    }
}

impl SessionConfig {
    /// Data directory with a leading `~` expanded
    pub fn data_path(&self) -> PathBuf {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.data_dir)),
            None => PathBuf::from(&self.data_dir),
        }
    }

    pub fn mirror_path(&self) -> Option<PathBuf> {
        self.mirror_cache.then(|| self.data_path().join("dataset.json"))
    }
}

/// Choropleth and marker coloring
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Named palette ("blues" or "oranges")
    #[serde(default = "default_palette")]
    pub palette: String,

    /// Explicit choropleth colors, overriding `palette`
    #[serde(default)]
    pub colors: Vec<String>,

    #[serde(default = "default_marker_palette")]
    pub marker_palette: String,

    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_palette() -> String {
    "blues".to_string()
}

fn default_marker_palette() -> String {
    "oranges".to_string()
}

fn default_top_n() -> usize {
    10
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            colors: Vec::new(),
            marker_palette: default_marker_palette(),
            top_n: default_top_n(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("sma-landscape").join("config.toml")),
            Some(PathBuf::from("/etc/sma-landscape/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(host) = var("LANDSCAPE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("LANDSCAPE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }

        // Portal overrides
        if let Some(url) = var("LANDSCAPE_PORTAL_URL") {
            self.portal.url = url;
        }
        if let Some(input) = var("LANDSCAPE_INPUT") {
            self.portal.input = Some(input);
        }
        if let Some(file) = var("LANDSCAPE_TERRITORIES") {
            self.portal.territories_file = Some(file);
        }

        // Auth overrides
        if let Some(email) = var("LANDSCAPE_AUTH_EMAIL") {
            self.auth.email = email;
        }
        if let Some(password) = var("LANDSCAPE_AUTH_PASSWORD") {
            self.auth.password = password;
        }

        // Session overrides
        if let Some(data_dir) = var("LANDSCAPE_DATA_DIR") {
            self.session.data_dir = data_dir;
        }

        // Logging overrides
        if let Some(level) = var("LANDSCAPE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LANDSCAPE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// A local dump when `input` is set, the portal otherwise
    pub fn record_source(&self) -> SourceResult<Arc<dyn RecordSource>> {
        match &self.portal.input {
            Some(input) => {
                let territories = self.portal.territories_file.as_deref().map(Path::new);
                Ok(Arc::new(FileSource::open(Path::new(input), territories)?))
            }
            None => Ok(Arc::new(PortalClient::new(self.portal.client_config())?)),
        }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            cors_origins: self.server.cors_origins.clone(),
            states_url: Some(self.geo.states_url.clone()).filter(|u| !u.trim().is_empty()),
            zips_url: self.geo.zips_url.clone(),
            request_timeout_secs: self.server.request_timeout_secs,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.auth.email.clone(), self.auth.password.clone())
    }

    /// Resolve palettes and layout into view options
    pub fn view_options(&self) -> Result<ViewOptions, ConfigError> {
        let palette = if self.map.colors.is_empty() {
            named_palette(&self.map.palette)?
        } else {
            Palette::new(self.map.colors.as_slice())
                .map_err(|e| ConfigError::Invalid(e.to_string()))?
        };

        Ok(ViewOptions {
            palette,
            marker_palette: named_palette(&self.map.marker_palette)?,
            layout: self.layout,
            top_n: self.map.top_n,
        })
    }
}

fn named_palette(name: &str) -> Result<Palette, ConfigError> {
    Palette::named(name).ok_or_else(|| ConfigError::Invalid(format!("Unknown palette: {}", name)))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r##"# SMA Landscape Configuration
#
# Environment variables override these settings:
# - LANDSCAPE_HOST
# - LANDSCAPE_PORT
# - LANDSCAPE_PORTAL_URL
# - LANDSCAPE_INPUT
# - LANDSCAPE_TERRITORIES
# - LANDSCAPE_AUTH_EMAIL
# - LANDSCAPE_AUTH_PASSWORD
# - LANDSCAPE_DATA_DIR
# - LANDSCAPE_LOG_LEVEL
# - LANDSCAPE_LOG_FORMAT

[server]
# Dashboard backend host
host = "0.0.0.0"

# Dashboard backend port
port = 8090

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

# Request timeout in seconds
request_timeout_secs = 30

[portal]
# Data portal base URL
url = "http://localhost:5000"

# Endpoint paths; {name} and {mdm} are percent-encoded
records_path = "/api/records"
hcp_360_path = "/api/hcp360/{name}"
hco_360_path = "/api/hco360/{mdm}"
territories_path = "/api/zip-territories"

# Request timeout (ms); failed requests are not retried
request_timeout_ms = 30000

# Read a local JSON dump instead of the portal
# input = "./data/records.json"
# territories_file = "./data/territories.json"

[geo]
# State boundaries (URL or local path)
states_url = "https://raw.githubusercontent.com/PublicaMundi/MappingAPI/master/data/geojson/us-states.json"

# ZIP boundaries (optional)
# zips_url = "./data/zcta.geojson"

[auth]
# The single dashboard login
email = "admin@example.com"
password = "changeme"

[session]
# Session file and cache mirror location
data_dir = "~/.local/share/sma-landscape"

# Keep a copy of the fetched dataset on disk
mirror_cache = false

[map]
# Choropleth palette: blues or oranges
palette = "blues"

# Explicit colors override the named palette
# colors = ["#eff3ff", "#bdd7e7", "#6baed6", "#2171b5"]

# Account marker palette
marker_palette = "oranges"

# Rows in "top N" tables
top_n = 10

[layout]
# Referral tree drawing surface (px)
width = 960.0
height = 600.0
margin = 40.0
min_radius = 4.0
max_radius = 24.0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/sma-landscape/landscape.log"
"##
    .to_string()
}
