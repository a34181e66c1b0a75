// Configuration module entry point
// Loads layered configuration (file, environment, defaults) and holds runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    AccessLogFormat, AssetsConfig, Config, LogLevel, LoggingConfig, PerformanceConfig,
    ServerConfig,
};

/// Environment variable prefix, e.g. `LIBDOTNEW_SERVER__PORT=9000`
const ENV_PREFIX: &str = "LIBDOTNEW";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// The file is optional; environment variables override it, defaults fill the rest
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false));
        Self::build(builder)
    }

    /// Load configuration from an in-memory TOML document
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml));
        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("assets.dir", "public")?
            .set_default("assets.cache_max_age", 300)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 30)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values that deserialize but cannot work at runtime
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.server.port == 0 {
            return Err(config::ConfigError::Message(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.performance.connection_timeout == 0 {
            return Err(config::ConfigError::Message(
                "performance.connection_timeout must be at least 1 second".to_string(),
            ));
        }
        if self.server.workers == Some(0) {
            return Err(config::ConfigError::Message(
                "server.workers must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_to_empty_document() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.workers, None);
        assert_eq!(cfg.assets.dir, "public");
        assert_eq!(cfg.assets.cache_max_age, 300);
        assert_eq!(cfg.logging.level, LogLevel::Info);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, AccessLogFormat::Combined);
        assert!(cfg.logging.access_log_file.is_none());
        assert!(cfg.performance.keep_alive);
        assert_eq!(cfg.performance.connection_timeout, 30);
        assert_eq!(cfg.performance.max_connections, None);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let cfg = Config::from_toml(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            workers = 2

            [assets]
            dir = "/srv/assets"

            [logging]
            level = "debug"
            access_log_format = "json"
            error_log_file = "logs/error.log"

            [performance]
            max_connections = 512
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.assets.dir, "/srv/assets");
        assert_eq!(cfg.logging.level, LogLevel::Debug);
        assert_eq!(cfg.logging.access_log_format, AccessLogFormat::Json);
        assert_eq!(cfg.logging.error_log_file.as_deref(), Some("logs/error.log"));
        assert_eq!(cfg.performance.max_connections, Some(512));
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn test_load_from_file_path_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("edge.toml"),
            "[server]\nport = 9100\n\n[assets]\ndir = \"scripts\"\n",
        )
        .unwrap();

        let path = dir.path().join("edge");
        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.assets.dir, "scripts");
        assert_eq!(cfg.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let result = Config::from_toml("[logging]\nlevel = \"verbose\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_access_log_format_is_rejected() {
        let result = Config::from_toml("[logging]\naccess_log_format = \"xml\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_port_is_rejected() {
        let result = Config::from_toml("[server]\nport = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_host_fails_address_parse() {
        let cfg = Config::from_toml("[server]\nhost = \"not a host\"\n").unwrap();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }
}
