//! Bridge configuration: which engines exist and how the session behaves.
//!
//! ```yaml
//! engines:
//!   gikou:
//!     path: /opt/engines/gikou/gikou
//!     args: []
//! handshake_timeout_ms: 10000
//! log:
//!   level: info
//!   format: text
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{UsiError, UsiResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "USI_BRIDGE_CONFIG";

/// How to launch one engine binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine executable.
    pub path: PathBuf,

    /// Extra command line arguments.
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory; engines often load eval files relative to it.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl EngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings consumed by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Top level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Engines by name.
    #[serde(default)]
    pub engines: BTreeMap<String, EngineConfig>,

    /// Bound on each handshake phase (`usiok`, `readyok`).
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,

    /// How long `quit` may take before the engine is killed.
    #[serde(default = "default_quit_timeout_ms")]
    pub quit_timeout_ms: u64,

    #[serde(default)]
    pub log: LogConfig,
}

fn default_handshake_timeout_ms() -> u64 {
    10_000
}

fn default_quit_timeout_ms() -> u64 {
    5_000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            engines: BTreeMap::new(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            quit_timeout_ms: default_quit_timeout_ms(),
            log: LogConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> UsiResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            UsiError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&text).map_err(|e| match e {
            UsiError::Config { message } => {
                UsiError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;
        tracing::debug!(path = %path.display(), engines = config.engines.len(), "loaded config");
        Ok(config)
    }

    /// Load the file named by `USI_BRIDGE_CONFIG`.
    pub fn from_env() -> UsiResult<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map_err(|_| UsiError::config(format!("{} is not set", CONFIG_ENV)))?;
        Self::load(path)
    }

    pub fn from_yaml(text: &str) -> UsiResult<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| UsiError::config(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> UsiResult<()> {
        if self.engines.is_empty() {
            return Err(UsiError::config("no engines configured"));
        }
        for (name, engine) in &self.engines {
            if name.trim().is_empty() {
                return Err(UsiError::config("engine name must not be empty"));
            }
            if engine.path.as_os_str().is_empty() {
                return Err(UsiError::config(format!("engine {} has an empty path", name)));
            }
        }
        if self.handshake_timeout_ms == 0 {
            return Err(UsiError::config("handshake_timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn engine(&self, name: &str) -> UsiResult<&EngineConfig> {
        self.engines.get(name).ok_or_else(|| UsiError::UnknownEngine {
            name: name.to_string(),
        })
    }

    pub fn engine_names(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn quit_timeout(&self) -> Duration {
        Duration::from_millis(self.quit_timeout_ms)
    }

    pub fn with_engine(mut self, name: impl Into<String>, engine: EngineConfig) -> Self {
        self.engines.insert(name.into(), engine);
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_quit_timeout(mut self, timeout: Duration) -> Self {
        self.quit_timeout_ms = timeout.as_millis() as u64;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = BridgeConfig::from_yaml(
            "engines:\n  gikou:\n    path: /opt/gikou\n",
        )
        .unwrap();
        assert_eq!(config.handshake_timeout(), Duration::from_secs(10));
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, LogFormat::Text);
        let engine = config.engine("gikou").unwrap();
        assert_eq!(engine.path, PathBuf::from("/opt/gikou"));
        assert!(engine.args.is_empty());
    }

    #[test]
    fn full_config() {
        let yaml = r#"
engines:
  apery:
    path: ./apery
    args: ["--threads", "4"]
    working_dir: /opt/apery
handshake_timeout_ms: 2500
quit_timeout_ms: 100
log:
  level: debug
  format: json
"#;
        let config = BridgeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.handshake_timeout(), Duration::from_millis(2500));
        assert_eq!(config.quit_timeout(), Duration::from_millis(100));
        assert_eq!(config.log.format, LogFormat::Json);
        let apery = config.engine("apery").unwrap();
        assert_eq!(apery.args, vec!["--threads", "4"]);
        assert_eq!(apery.working_dir, Some(PathBuf::from("/opt/apery")));
    }

    #[test]
    fn validation_errors() {
        assert!(matches!(
            BridgeConfig::from_yaml("engines: {}\n"),
            Err(UsiError::Config { .. })
        ));
        assert!(BridgeConfig::from_yaml("engines:\n  x:\n    path: ''\n").is_err());
        assert!(BridgeConfig::from_yaml("engines: [").is_err());
        assert!(matches!(
            BridgeConfig::default().engine("missing"),
            Err(UsiError::UnknownEngine { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "engines:\n  lesserkai:\n    path: /usr/bin/lesserkai").unwrap();
        let config = BridgeConfig::load(tmp.path()).unwrap();
        assert_eq!(config.engine_names().collect::<Vec<_>>(), vec!["lesserkai"]);

        let err = BridgeConfig::load("/nonexistent/usi-bridge.yaml").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn load_errors_name_the_file_once() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "engines: {{}}").unwrap();
        let message = BridgeConfig::load(tmp.path()).unwrap_err().to_string();

        assert_eq!(message.matches("configuration error").count(), 1, "{message}");
        assert!(message.contains(&tmp.path().display().to_string()));
        assert!(message.contains("no engines configured"));
    }
}
