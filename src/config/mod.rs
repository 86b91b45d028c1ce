//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheConfig, DatabaseConfig, EdgeConfig, LogFormat, LoggingConfig, ServerConfig,
};
