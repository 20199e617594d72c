//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic base configuration ([`ConfigLoader::merge`])
//! 3. Profile-specific config file (`corvy.{profile}.toml` / `corvy.{profile}.yaml`)
//! 4. Main config file (`corvy.toml` / `config.toml`, or the YAML variants)
//! 5. Environment variables (`CORVY_*`)
//! 6. Keyed overrides ([`ConfigLoader::set`])
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: search for and accept TOML files
//! - `yaml-config`: search for and accept YAML files
//!
//! # Environment Variable Mapping
//!
//! Variables use the `CORVY_` prefix with `__` separating nested keys:
//!
//! - `CORVY_BOT__API_TOKEN=xxx` → `bot.api_token = "xxx"`
//! - `CORVY_BOT__POLL_INTERVAL_MS=500` → `bot.poll_interval_ms = 500`
//! - `CORVY_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! The active profile is read from `CORVY_PROFILE`.
//!
//! ```rust,ignore
//! use corvy_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./deploy/corvy.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::CorvyConfig;

const ENV_PREFIX: &str = "CORVY_";
const PROFILE_VAR: &str = "CORVY_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Reads the profile from `CORVY_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_VAR)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }

    fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layered configuration loader.
pub struct ConfigLoader {
    figment: Figment,
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a directory to search for configuration files.
    ///
    /// When no search path is given, the current directory and
    /// `<config dir>/corvy` are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file instead of searching. A missing file is an error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a whole configuration below files and the environment.
    ///
    /// Every field counts, defaults included, so anything a file or
    /// `CORVY_*` variable sets still wins.
    pub fn merge(mut self, config: CorvyConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Overrides one key on top of every other source.
    ///
    /// Keys are dotted paths into [`CorvyConfig`], e.g. `logging.level`.
    pub fn set<V: Serialize>(mut self, key: &str, value: V) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<CorvyConfig> {
        let profile = self.profile.clone();
        let config: CorvyConfig = self.build_figment()?.extract()?;

        debug!(
            profile = %profile,
            api_base_url = %config.bot.api_base_url,
            logging_level = %config.logging.level,
            "Configuration loaded"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(CorvyConfig::default()));
        figment = figment.merge(std::mem::take(&mut self.figment));

        match &self.config_file {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_config_file(figment, path)?;
            }
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => figment = self.load_config_files(figment),
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }

        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("corvy"));
        }
        paths
    }

    /// Searches `search_paths × base_names`, merging a profile-specific file
    /// (`corvy.production.toml`) before its base file. Stops at the first base
    /// file found.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        &self,
        mut figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_fn(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return (merge_fn(figment, &base_path), true);
                }
            }
        }
        (figment, false)
    }

    #[cfg_attr(
        not(any(feature = "toml-config", feature = "yaml-config")),
        allow(unused_mut, unused_variables)
    )]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["corvy.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = self.load_format_files(
                figment,
                &search_paths,
                &["corvy.yaml", "corvy.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            warn!("No configuration file found, using defaults");
        }
        figment
    }
}

/// Merges one file, chosen by extension among the enabled formats.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::ParseError(format!(
            "Unsupported or disabled configuration file format: .{ext}"
        ))),
    }
}

/// Loads configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<CorvyConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path` plus the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<CorvyConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, LoggingConfig, schema::BotConfig};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("corvy-config-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults_without_files() {
        let empty = scratch_dir("empty");
        let config = ConfigLoader::new()
            .without_env()
            .search_path(&empty)
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.bot.poll_interval_ms, 1000);
        assert!(config.bot.api_token.is_empty());
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here/corvy.toml")
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_merged_config_without_files() {
        let empty = scratch_dir("merged");
        let config = ConfigLoader::new()
            .without_env()
            .search_path(&empty)
            .merge(CorvyConfig {
                bot: BotConfig {
                    api_token: "from-code".into(),
                    poll_interval_ms: 250,
                    ..Default::default()
                },
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(config.bot.api_token, "from-code");
        assert_eq!(config.bot.poll_interval_ms, 250);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_merge_keeps_file_values() {
        let dir = scratch_dir("merge-file");
        let path = dir.join("corvy.toml");
        std::fs::write(
            &path,
            "[bot]\napi_token = \"from-file\"\npoll_interval_ms = 250\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .file(&path)
            .merge(CorvyConfig {
                logging: LoggingConfig {
                    level: LogLevel::Debug,
                    ..Default::default()
                },
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(config.bot.api_token, "from-file");
        assert_eq!(config.bot.poll_interval_ms, 250);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_set_wins_over_file() {
        let dir = scratch_dir("set-file");
        let path = dir.join("corvy.toml");
        std::fs::write(
            &path,
            "[bot]\napi_token = \"from-file\"\n\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .file(&path)
            .set("logging.level", "trace")
            .set("bot.failure_backoff_ms", 750)
            .load()
            .unwrap();

        assert_eq!(config.bot.api_token, "from-file");
        assert_eq!(config.bot.failure_backoff_ms, 750);
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_then_base_file() {
        let dir = scratch_dir("profile");
        std::fs::write(
            dir.join("corvy.staging.toml"),
            "[bot]\napi_token = \"staging\"\nfailure_backoff_ms = 9000\n",
        )
        .unwrap();
        std::fs::write(
            dir.join("corvy.toml"),
            "[bot]\napi_token = \"base\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = ConfigLoader::new()
            .without_env()
            .profile("staging")
            .search_path(&dir)
            .load()
            .unwrap();

        // The base file is merged last and wins on shared keys.
        assert_eq!(config.bot.api_token, "base");
        assert_eq!(config.bot.failure_backoff_ms, 9000);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = scratch_dir("malformed");
        let path = dir.join("corvy.toml");
        std::fs::write(&path, "[bot]\npoll_interval_ms = \"soon\"\n").unwrap();

        let result = ConfigLoader::new().without_env().file(&path).load();
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }
}
