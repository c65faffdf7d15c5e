use thiserror::Error;

pub mod app_config;
mod config;
pub mod envelope;
pub mod geo;
pub mod status;
pub mod transport;
pub mod weather;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use envelope::{now_rfc3339, Envelope, EnvelopeError, EnvelopeParts, NormalizedItem, SourceRef};
pub use status::{
    classify, pick_primary_status, primary_status_of_items, StatusCode, StatusMeta, StatusRule,
    StatusTone,
};
pub use transport::{Direction, TransportItem, TransportService};
pub use weather::{Horizon, WeatherItem, WeatherService};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
