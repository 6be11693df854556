pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{
    AppConfig, BootstrapConfig, ConfigError, LoggingConfig, PostgresStorageConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
pub use observability::init_tracing;
pub use server::{AppState, LabDeskServer, ServerBuilder, build_app, connect_storage};
