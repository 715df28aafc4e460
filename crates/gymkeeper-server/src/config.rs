use gymkeeper_auth::config::AuthConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Environment variable accepted as the signing secret when `auth.secret`
/// is not set.
pub const SECRET_FALLBACK_ENV: &str = "MY_SECRET_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Authentication and authorization configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("config build error: {0}")]
    Build(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        if self.server.max_concurrent_requests == 0 {
            return Err("server.max_concurrent_requests must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        self.auth
            .validate()
            .map_err(|e| format!("auth config error: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Fills `auth.secret` from [`SECRET_FALLBACK_ENV`] when it is unset.
    pub fn apply_secret_fallback(&mut self, fallback: Option<String>) {
        if self.auth.signing_secret().is_some() {
            return;
        }
        if let Some(secret) = fallback.filter(|s| !s.trim().is_empty()) {
            self.auth.secret = Some(secret);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    7000
}
fn default_body_limit() -> usize {
    64 * 1024
}
fn default_max_concurrent_requests() -> usize {
    1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::{AppConfig, LoadError, SECRET_FALLBACK_ENV};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, LoadError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or("gymkeeper.toml"));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., GYMKEEPER__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("GYMKEEPER")
                .try_parsing(true)
                .separator("__"),
        );
        let mut merged: AppConfig = builder.build()?.try_deserialize()?;
        merged.apply_secret_fallback(std::env::var(SECRET_FALLBACK_ENV).ok());

        merged.validate().map_err(LoadError::Invalid)?;
        Ok(merged)
    }
}
