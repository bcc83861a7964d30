use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `SWISHVIEW__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Reconciliation loop tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    /// Consecutive unavailable fetches before a campaign's circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// While a circuit is open, probe the provider once every N ticks.
    #[serde(default = "default_probe_interval_ticks")]
    pub probe_interval_ticks: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeConfig {
    #[serde(default = "default_data_api_endpoint")]
    pub data_api_endpoint: String,
    #[serde(default = "default_oembed_endpoint")]
    pub oembed_endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

// Default functions
fn default_poll_interval_secs() -> u64 {
    30
}
fn default_max_concurrent_fetches() -> usize {
    8
}
fn default_failure_threshold() -> u32 {
    5
}
fn default_probe_interval_ticks() -> u32 {
    4
}
fn default_data_api_endpoint() -> String {
    "https://www.googleapis.com/youtube/v3/videos".to_string()
}
fn default_oembed_endpoint() -> String {
    "https://www.youtube.com/oembed".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
fn default_store_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            failure_threshold: default_failure_threshold(),
            probe_interval_ticks: default_probe_interval_ticks(),
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            data_api_endpoint: default_data_api_endpoint(),
            oembed_endpoint: default_oembed_endpoint(),
            api_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_base_url(),
            api_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            youtube: YouTubeConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SWISHVIEW")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
