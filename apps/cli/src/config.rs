use config::{Config, Environment, File, FileFormat, Map};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "tzpass.toml";
const ENV_PREFIX: &str = "TZPASS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub vault: VaultSettings,
    pub oracle: OracleSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    pub path: PathBuf,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self { path: PathBuf::from("vault.tzpw") }
    }
}

/// Development device settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// Hex-encoded 32-byte master secret, generated on first use.
    pub seed_file: PathBuf,
    pub timeout_secs: u64,
    /// Approve every device prompt without asking.
    pub auto_confirm: bool,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self { seed_file: PathBuf::from("device.seed"), timeout_secs: 120, auto_confirm: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub directory: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { level: "info".to_owned(), directory: None, json: false }
    }
}

impl AppConfig {
    /// Loads `path` (required) or `./tzpass.toml` (optional), then `TZPASS__*` overrides.
    ///
    /// Nested keys use double underscores: `TZPASS__ORACLE__TIMEOUT_SECS=30` sets
    /// `oracle.timeout_secs`.
    ///
    /// # Errors
    /// Returns an error if an explicit file is missing or a value has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Like [`AppConfig::load`], reading overrides from `env` instead of the process
    /// environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, config::ConfigError> {
        let (file, required) = path.map_or_else(
            || (PathBuf::from(DEFAULT_CONFIG_FILE), false),
            |p| (p.to_path_buf(), true),
        );
        debug!(path = %file.display(), required, "Loading configuration");

        Config::builder()
            .add_source(File::from(file.as_path()).format(FileFormat::Toml).required(required))
            .add_source(
                Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true).source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        // An explicit path must exist.
        assert!(AppConfig::load_with_env(Some(&missing), Some(Map::new())).is_err());

        let cfg: AppConfig = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").source(Some(Map::new())))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.oracle.timeout_secs, 120);
        assert_eq!(cfg.vault.path, PathBuf::from("vault.tzpw"));
    }

    #[test]
    fn test_file_then_env_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tzpass.toml");
        fs::write(
            &path,
            "[vault]\npath = \"/tmp/a.tzpw\"\n\n[oracle]\ntimeout_secs = 10\n\n[logging]\njson = true\n",
        )
        .unwrap();

        let env = Map::from([
            ("TZPASS__ORACLE__TIMEOUT_SECS".to_owned(), "30".to_owned()),
            ("TZPASS__LOGGING__LEVEL".to_owned(), "debug".to_owned()),
        ]);
        let cfg = AppConfig::load_with_env(Some(&path), Some(env)).unwrap();

        assert_eq!(cfg.vault.path, PathBuf::from("/tmp/a.tzpw"));
        assert_eq!(cfg.oracle.timeout_secs, 30);
        assert_eq!(cfg.oracle.seed_file, PathBuf::from("device.seed"));
        assert!(!cfg.oracle.auto_confirm);
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.json);
    }
}
