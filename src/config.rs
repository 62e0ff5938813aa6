//! Pipeline configuration loaded from `rexsl.toml`.
//!
//! Every section is optional. Timeouts are unset unless configured: the
//! pipeline never invents a deadline of its own.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, RexslError};

/// Name of the configuration file looked up in the project basedir.
pub const CONFIG_FILE: &str = "rexsl.toml";

/// Default Jigsaw CSS validator endpoint.
pub const DEFAULT_JIGSAW_URL: &str = "http://jigsaw.w3.org/css-validator/validator";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RexslConfig {
    /// Check identifiers to run, in order. Empty means the default list.
    pub checks: Vec<String>,
    /// Scope expression applied to every built check.
    pub scope: String,
    pub scripts: ScriptConfig,
    pub container: ContainerConfig,
    pub http: HttpConfig,
    pub libraries: LibrariesConfig,
    pub jigsaw: JigsawConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptConfig {
    /// Program (and leading arguments) used to run a script file.
    pub interpreter: Vec<String>,
    /// File extension of scripts, without the dot.
    pub extension: String,
    pub timeout_secs: Option<u64>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            interpreter: vec!["sh".to_string()],
            extension: "sh".to_string(),
            timeout_secs: None,
        }
    }
}

impl ScriptConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// Directory (relative to basedir) holding bootstrap scripts.
    pub bootstrap_dir: PathBuf,
    /// How long to wait for the listener to accept connections.
    pub start_timeout_secs: Option<u64>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            bootstrap_dir: PathBuf::from("src/test/rexsl/setup"),
            start_timeout_secs: None,
        }
    }
}

impl ContainerConfig {
    pub fn start_timeout(&self) -> Option<Duration> {
        self.start_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    /// Attempts made for a request that fails with an I/O error.
    pub transport_attempts: u32,
    /// Upper bound of the randomized pause between attempts.
    pub retry_delay_ms: u64,
    /// Per-request timeout.
    pub timeout_secs: Option<u64>,
    /// Wall-clock bound for assertion retries.
    pub deadline_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            transport_attempts: 3,
            retry_delay_ms: 100,
            timeout_secs: None,
            deadline_secs: None,
        }
    }
}

impl HttpConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct LibrariesConfig {
    /// Count a class seen twice in the very same archive path as a conflict.
    pub repeated_archive_is_conflict: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct JigsawConfig {
    pub url: String,
}

impl Default for JigsawConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_JIGSAW_URL.to_string(),
        }
    }
}

impl RexslConfig {
    /// Parse configuration from TOML text; `origin` is used in messages.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self> {
        let config: RexslConfig = toml::from_str(content).map_err(|e| RexslError::Config {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| RexslError::io(format!("Failed to read {}", path.display()), e))?;
        Self::from_toml(&content, path)
    }

    /// Load `rexsl.toml` from `basedir` if present, defaults otherwise.
    pub fn discover(basedir: &Path) -> Result<Self> {
        let path = basedir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self, origin: &Path) -> Result<()> {
        let invalid = |message: &str| RexslError::Config {
            path: origin.to_path_buf(),
            message: message.to_string(),
        };
        if self.scripts.interpreter.is_empty() {
            return Err(invalid("scripts.interpreter must name a program"));
        }
        if self.scripts.extension.is_empty() || self.scripts.extension.starts_with('.') {
            return Err(invalid("scripts.extension must be a bare extension like \"sh\""));
        }
        if self.http.transport_attempts == 0 {
            return Err(invalid("http.transport_attempts must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RexslConfig::default();
        assert!(config.checks.is_empty());
        assert_eq!(config.scripts.interpreter, vec!["sh".to_string()]);
        assert_eq!(config.http.transport_attempts, 3);
        assert!(config.http.deadline().is_none());
        assert!(config.container.start_timeout().is_none());
        assert!(!config.libraries.repeated_archive_is_conflict);
        assert_eq!(config.jigsaw.url, DEFAULT_JIGSAW_URL);
    }

    #[test]
    fn test_parse_full_file() {
        let content = r#"
checks = ["LibrariesCheck", "WebXmlCheck"]
scope = "^Home"

[scripts]
interpreter = ["bash", "-e"]
extension = "bash"
timeout_secs = 30

[container]
bootstrap_dir = "src/test/rexsl/bootstrap"
start_timeout_secs = 5

[http]
transport_attempts = 5
retry_delay_ms = 10
deadline_secs = 60

[libraries]
repeated_archive_is_conflict = true
"#;
        let config = RexslConfig::from_toml(content, Path::new("rexsl.toml")).unwrap();
        assert_eq!(config.checks, vec!["LibrariesCheck", "WebXmlCheck"]);
        assert_eq!(config.scope, "^Home");
        assert_eq!(config.scripts.interpreter, vec!["bash", "-e"]);
        assert_eq!(config.scripts.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.container.bootstrap_dir, PathBuf::from("src/test/rexsl/bootstrap"));
        assert_eq!(config.http.transport_attempts, 5);
        assert_eq!(config.http.deadline(), Some(Duration::from_secs(60)));
        assert!(config.libraries.repeated_archive_is_conflict);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = RexslConfig::from_toml("chekcs = []", Path::new("rexsl.toml")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let err = RexslConfig::from_toml(
            "[http]\ntransport_attempts = 0",
            Path::new("rexsl.toml"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("transport_attempts"));
    }

    #[test]
    fn test_discover_without_file() {
        let temp = tempfile::tempdir().unwrap();
        let config = RexslConfig::discover(temp.path()).unwrap();
        assert_eq!(config, RexslConfig::default());
    }

    #[test]
    fn test_discover_reads_file() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "scope = \"Login\"\n").unwrap();
        let config = RexslConfig::discover(temp.path()).unwrap();
        assert_eq!(config.scope, "Login");
    }
}
