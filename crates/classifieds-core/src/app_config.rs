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

#[derive(Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub env: Environment,
    pub log_level: String,
    pub categories_path: PathBuf,
    pub storage_path: PathBuf,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// UI timing knobs. The `classifieds` binary is one-shot and never reads
    /// them; embedders pass them through `FilterPanelOptions::from_config`
    /// and `ScrollOptions::from_config`.
    pub filter_debounce_ms: u64,
    pub scroll_throttle_ms: u64,
    pub scroll_threshold_px: u32,
    pub scroll_guard_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url)
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("categories_path", &self.categories_path)
            .field("storage_path", &self.storage_path)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[redacted]"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("filter_debounce_ms", &self.filter_debounce_ms)
            .field("scroll_throttle_ms", &self.scroll_throttle_ms)
            .field("scroll_threshold_px", &self.scroll_threshold_px)
            .field("scroll_guard_ms", &self.scroll_guard_ms)
            .finish()
    }
}
