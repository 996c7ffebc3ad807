use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Debounce delays applied to each family of refresh triggers, in
/// milliseconds. Each delay waits out the platform's own asynchronous DOM
/// update before the cart is re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshDelays {
    /// Cart-line insertion/removal, quantity edits, delete clicks.
    pub structural_ms: u64,
    /// Platform events (`cart::updated`, `product::added`, ...).
    pub platform_ms: u64,
    /// Clicks on add-to-cart controls outside the platform event bus.
    pub add_click_ms: u64,
    /// Pushes onto the analytics data layer.
    pub analytics_ms: u64,
}

impl Default for RefreshDelays {
    fn default() -> Self {
        Self {
            structural_ms: 300,
            platform_ms: 500,
            add_click_ms: 1000,
            analytics_ms: 100,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the platform cart API. `None` runs against the local
    /// fallback cart only.
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub catalog_path: PathBuf,
    pub store_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    /// ISO 4217 code stamped on lines whose source states none.
    pub currency: String,
    /// Label appended to rendered amounts, e.g. `"ر.س"`.
    pub currency_label: String,
    /// Title shown on the single line synthesized from the cart summary.
    pub summary_placeholder_title: String,
    /// UTC hour (0-23) at which the countdown period resets each day.
    pub countdown_reset_hour_utc: u32,
    pub delays: RefreshDelays,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("catalog_path", &self.catalog_path)
            .field("store_path", &self.store_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .field("currency", &self.currency)
            .field("currency_label", &self.currency_label)
            .field("summary_placeholder_title", &self.summary_placeholder_title)
            .field("countdown_reset_hour_utc", &self.countdown_reset_hour_utc)
            .field("delays", &self.delays)
            .finish()
    }
}
