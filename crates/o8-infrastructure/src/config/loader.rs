//! Configuration loader
//!
//! Merges configuration sources with figment. Later sources override
//! earlier ones:
//!
//! 1. Default values from `AppConfig::default()`
//! 2. TOML configuration file (if present)
//! 3. Environment variables prefixed `O8_` (nested keys split on `__`,
//!    e.g. `O8_REGISTRY__URI_SCHEME`)
//!
//! Loader failures are fatal at startup; a bad runtime reload is rejected
//! without touching the running configuration.

use crate::config::AppConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use o8_domain::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable prefix
const ENV_PREFIX: &str = "O8_";

/// Configuration loader service
#[derive(Clone, Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader with no config file
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load and validate configuration from all sources
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                info!(path = %config_path.display(), "loaded configuration file");
            } else {
                return Err(Error::config(format!(
                    "configuration file not found: {}",
                    config_path.display()
                )));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: AppConfig = figment
            .extract()
            .map_err(|e| Error::config(format!("failed to extract configuration: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reload configuration from the same sources
    pub fn reload(&self) -> Result<AppConfig> {
        self.load()
    }

    /// Write a configuration back out as TOML
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &AppConfig, path: P) -> Result<()> {
        let rendered = toml::to_string_pretty(config)
            .map_err(|e| Error::config(format!("failed to serialize configuration: {e}")))?;
        std::fs::write(path.as_ref(), rendered)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_load_without_a_file() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.registry.uri_scheme, "o8");
        assert!(config.registry.enable_health_checks);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[registry]\nuri_scheme = \"hub\"\nmax_consecutive_failures = 3\n\n[local]\nresources_path = \"/tmp/resources\""
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_config_path(file.path())
            .load()
            .unwrap();
        assert_eq!(config.registry.uri_scheme, "hub");
        assert_eq!(config.registry.max_consecutive_failures, 3);
        let local = config.local.unwrap();
        assert_eq!(local.cache_size, 200);
    }

    #[test]
    fn missing_file_is_fatal() {
        let result = ConfigLoader::new()
            .with_config_path("/nonexistent/o8.toml")
            .load();
        assert!(result.is_err());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[source_control]\nenabled = true\nrepos = [\"not-a-repo\"]"
        )
        .unwrap();

        let result = ConfigLoader::new().with_config_path(file.path()).load();
        assert!(result.is_err());
    }
}
