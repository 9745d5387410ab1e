pub mod app_config;
pub mod config;
pub mod schedule;
pub mod users;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::load_app_config;
pub use schedule::{ScheduleError, ScheduleSpec};
pub use users::{User, UserStatus};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
