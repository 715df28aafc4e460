pub mod config;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoadError, LoggingConfig, ServerConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{GymkeeperServer, ServerBuilder, build_app};
