use std::net::SocketAddr;
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

/// Process-wide configuration, built once at startup and passed down
/// explicitly. Credentials are optional: a missing store or API key puts
/// the affected layer into its degraded mode instead of failing startup.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub odpt_consumer_key: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub store_url: Option<String>,
    pub store_api_key: Option<String>,
    pub reports_table: String,
    pub fallback_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field(
                "odpt_consumer_key",
                &self.odpt_consumer_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "google_maps_api_key",
                &self.google_maps_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("store_url", &self.store_url)
            .field(
                "store_api_key",
                &self.store_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("reports_table", &self.reports_table)
            .field("fallback_dir", &self.fallback_dir)
            .finish()
    }
}
