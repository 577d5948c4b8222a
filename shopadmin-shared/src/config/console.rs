use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use thiserror::Error;
use url::Url;

/// Environment variable selecting the backend origin.
pub const API_URL_ENV: &str = "SHOPADMIN_API_URL";
/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "SHOPADMIN_LOG_LEVEL";
/// Environment variable selecting `text` or `json` logs.
pub const LOG_FORMAT_ENV: &str = "SHOPADMIN_LOG_FORMAT";
/// Environment variable overriding the edge server port.
pub const EDGE_PORT_ENV: &str = "SHOPADMIN_EDGE_PORT";
/// Environment variable overriding the static pages directory.
pub const PAGES_DIR_ENV: &str = "SHOPADMIN_PAGES_DIR";
/// Environment variable overriding where the CLI keeps session cookies.
pub const SESSION_JAR_ENV: &str = "SHOPADMIN_SESSION_JAR";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file was not valid for its format.
    #[error("failed to parse configuration file {path}: {message}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The configuration file extension is not supported.
    #[error("unsupported configuration format for {0}. Use 'yaml' or 'json'.")]
    UnsupportedFormat(PathBuf),

    /// An environment variable held an unusable value.
    #[error("invalid {name} value: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The resolved configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Log output encoding.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Backend API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend origin. Blog operations refuse to run without it.
    pub base_url: Option<Url>,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: "shopadmin".to_string(),
        }
    }
}

/// Session gating settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session cookie issued by the backend.
    pub cookie_name: String,
    /// Path prefix guarded by the edge filter.
    pub protected_prefix: String,
    /// Login entry point.
    pub login_path: String,
    /// Landing page after a successful login.
    pub dashboard_path: String,
    /// Where the CLI persists session cookies; a per-user default applies
    /// when unset.
    pub jar_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            protected_prefix: "/dashboard".to_string(),
            login_path: "/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
            jar_path: None,
        }
    }
}

/// Edge server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listening port.
    pub port: u16,
    /// Directory holding the console pages.
    pub pages_dir: PathBuf,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            pages_dir: PathBuf::from("./pages"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output encoding.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Fully resolved console configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Backend API settings.
    pub api: ApiConfig,
    /// Session gating settings.
    pub session: SessionConfig,
    /// Edge server settings.
    pub edge: EdgeConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl ConsoleConfig {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads the configuration from defaults, an optional file, the
    /// environment, and finally the port override, in that order.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the file cannot be read or parsed, an
    /// environment variable is malformed, or validation fails.
    pub fn load_config(
        config_path: Option<PathBuf>,
        port_override: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::with_defaults(),
        };

        config.apply_env_overrides()?;

        if let Some(port) = port_override {
            config.edge.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => {
                serde_yml::from_str(&content).map_err(|err| ConfigError::Parse {
                    path: path.clone(),
                    message: err.to_string(),
                })
            }
            Some("json") => serde_json::from_str(&content).map_err(|err| ConfigError::Parse {
                path: path.clone(),
                message: err.to_string(),
            }),
            _ => Err(ConfigError::UnsupportedFormat(path)),
        }
    }

    /// Applies `SHOPADMIN_*` environment variables on top of the current values.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidEnv`] for values that do not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(raw) = read_env(API_URL_ENV) {
            let url = Url::parse(&raw).map_err(|err| ConfigError::InvalidEnv {
                name: API_URL_ENV,
                reason: err.to_string(),
            })?;
            self.api.base_url = Some(url);
        }
        if let Some(level) = read_env(LOG_LEVEL_ENV) {
            self.logging.level = level;
        }
        if let Some(format) = read_env(LOG_FORMAT_ENV) {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => {
                    return Err(ConfigError::InvalidEnv {
                        name: LOG_FORMAT_ENV,
                        reason: format!("expected 'text' or 'json', got '{other}'"),
                    });
                }
            };
        }
        if let Some(port) = read_env(EDGE_PORT_ENV) {
            self.edge.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: EDGE_PORT_ENV,
                reason: "must be a valid number between 1 and 65535".to_string(),
            })?;
        }
        if let Some(pages_dir) = read_env(PAGES_DIR_ENV) {
            self.edge.pages_dir = PathBuf::from(pages_dir);
        }
        if let Some(jar) = read_env(SESSION_JAR_ENV) {
            self.session.jar_path = Some(PathBuf::from(jar));
        }
        Ok(())
    }

    /// Checks cross-field consistency.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.edge.port == 0 {
            return Err(ConfigError::Invalid(
                "edge port must be greater than 0".to_string(),
            ));
        }
        if let Some(url) = &self.api.base_url {
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid(format!(
                    "api base url must use http or https, got '{}'",
                    url.scheme()
                )));
            }
        }
        for (label, path) in [
            ("protected prefix", &self.session.protected_prefix),
            ("login path", &self.session.login_path),
            ("dashboard path", &self.session.dashboard_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "{label} must start with '/', got '{path}'"
                )));
            }
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "session cookie name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn cleanup_env_vars() {
        unsafe {
            for name in [
                API_URL_ENV,
                LOG_LEVEL_ENV,
                LOG_FORMAT_ENV,
                EDGE_PORT_ENV,
                PAGES_DIR_ENV,
                SESSION_JAR_ENV,
            ] {
                env::remove_var(name);
            }
        }
    }

    #[test]
    fn test_config_with_defaults() {
        let config = ConsoleConfig::with_defaults();
        assert!(config.api.base_url.is_none());
        assert_eq!(config.session.cookie_name, "token");
        assert_eq!(config.session.protected_prefix, "/dashboard");
        assert_eq!(config.session.login_path, "/login");
        assert_eq!(config.edge.port, 3000);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        cleanup_env_vars();
        let config = ConsoleConfig::load_config(None, None).unwrap();
        assert_eq!(config, ConsoleConfig::with_defaults());
    }

    #[test]
    #[serial]
    fn test_load_config_with_environment_variables() {
        cleanup_env_vars();
        unsafe {
            env::set_var(API_URL_ENV, "https://api.example.com");
            env::set_var(LOG_LEVEL_ENV, "debug");
            env::set_var(LOG_FORMAT_ENV, "JSON");
            env::set_var(EDGE_PORT_ENV, "4100");
            env::set_var(PAGES_DIR_ENV, "/srv/console");
        }

        let config = ConsoleConfig::load_config(None, None).unwrap();
        assert_eq!(
            config.api.base_url.as_ref().map(Url::as_str),
            Some("https://api.example.com/")
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.edge.port, 4100);
        assert_eq!(config.edge.pages_dir, PathBuf::from("/srv/console"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_port_override_beats_environment() {
        cleanup_env_vars();
        unsafe {
            env::set_var(EDGE_PORT_ENV, "5555");
        }
        let config = ConsoleConfig::load_config(None, Some(7777)).unwrap();
        assert_eq!(config.edge.port, 7777);
        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_port_environment() {
        cleanup_env_vars();
        unsafe {
            env::set_var(EDGE_PORT_ENV, "not-a-port");
        }
        let err = ConsoleConfig::load_config(None, None).unwrap_err();
        assert!(err.to_string().contains(EDGE_PORT_ENV));
        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_api_url_environment() {
        cleanup_env_vars();
        unsafe {
            env::set_var(API_URL_ENV, "not a url");
        }
        let err = ConsoleConfig::load_config(None, None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name, .. } if name == API_URL_ENV));
        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_zero_port_validation() {
        cleanup_env_vars();
        let err = ConsoleConfig::load_config(None, Some(0)).unwrap_err();
        assert!(err.to_string().contains("edge port"));
    }

    #[test]
    #[serial]
    fn test_load_config_from_yaml_file() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.yaml");
        fs::write(
            &path,
            r#"
api:
  base_url: "http://localhost:5000"
session:
  cookie_name: "sid"
edge:
  port: 4000
logging:
  format: json
"#,
        )
        .unwrap();

        let config = ConsoleConfig::load_config(Some(path), None).unwrap();
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.login_path, "/login");
        assert_eq!(config.edge.port, 4000);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.api.base_url.is_some());
    }

    #[test]
    #[serial]
    fn test_load_config_from_json_file() {
        cleanup_env_vars();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.json");
        fs::write(&path, r#"{"edge":{"port":4500,"pages_dir":"/tmp/pages"}}"#).unwrap();

        let config = ConsoleConfig::load_config(Some(path), None).unwrap();
        assert_eq!(config.edge.port, 4500);
        assert_eq!(config.edge.pages_dir, PathBuf::from("/tmp/pages"));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("console.ini");
        fs::write(&path, "port=1").unwrap();
        let err = ConsoleConfig::load_config(Some(path), None).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let err =
            ConsoleConfig::load_config(Some(PathBuf::from("/nonexistent/console.yaml")), None)
                .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_validate_rejects_relative_paths() {
        let mut config = ConsoleConfig::with_defaults();
        config.session.protected_prefix = "dashboard".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_scheme() {
        let mut config = ConsoleConfig::with_defaults();
        config.api.base_url = Some(Url::parse("ftp://files.example.com").unwrap());
        assert!(config.validate().is_err());
    }
}
