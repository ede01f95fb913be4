//! Build settings loaded from `buildfleet.toml`.
//!
//! Every field has a default, so a missing file means "use defaults".
//! `BUILDFLEET_JOBS` in the environment overrides the file's concurrency.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::orchestrator::DEFAULT_CONCURRENCY;

pub const CONFIG_FILE: &str = "buildfleet.toml";
pub const JOBS_ENV: &str = "BUILDFLEET_JOBS";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    /// Maximum number of builds running at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Shell each build script is handed to.
    #[serde(default = "default_shell")]
    pub shell: PathBuf,

    #[serde(default = "default_cmake")]
    pub cmake: PathBuf,

    /// CMake generator passed to every configure step.
    #[serde(default = "default_generator")]
    pub generator: String,

    /// Repository the `origin` remote must point at. Empty disables the check.
    #[serde(default = "default_expected_repo")]
    pub expected_repo: String,

    /// Shell snippet run before configuring, keyed by target OS.
    #[serde(default)]
    pub env_setup: BTreeMap<String, String>,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_shell() -> PathBuf {
    PathBuf::from("/bin/bash")
}

fn default_cmake() -> PathBuf {
    PathBuf::from("/usr/bin/cmake")
}

fn default_generator() -> String {
    "Ninja".to_string()
}

fn default_expected_repo() -> String {
    "mrs-sdk-qt".to_string()
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            shell: default_shell(),
            cmake: default_cmake(),
            generator: default_generator(),
            expected_repo: default_expected_repo(),
            env_setup: BTreeMap::new(),
        }
    }
}

impl FleetConfig {
    /// Loads `buildfleet.toml` from the current directory, or `path` if given.
    /// An explicit path must exist; the implicit one may not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::from_file(Path::new(CONFIG_FILE))?,
            None => Self::default(),
        };

        if let Ok(jobs) = std::env::var(JOBS_ENV) {
            config.apply_jobs_override(&jobs)?;
        }

        Ok(config)
    }

    /// Name the `origin` remote is checked against, if the check is enabled.
    pub fn expected_origin(&self) -> Option<&str> {
        let name = self.expected_repo.trim();
        (!name.is_empty()).then_some(name)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    fn apply_jobs_override(&mut self, raw: &str) -> Result<()> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        let jobs: usize = raw
            .parse()
            .with_context(|| format!("{JOBS_ENV} must be a positive integer, got {raw:?}"))?;
        if jobs == 0 {
            bail!("{JOBS_ENV} must be at least 1");
        }
        self.concurrency = jobs;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = FleetConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.shell, PathBuf::from("/bin/bash"));
        assert_eq!(config.cmake, PathBuf::from("/usr/bin/cmake"));
        assert_eq!(config.generator, "Ninja");
        assert_eq!(config.expected_origin(), Some("mrs-sdk-qt"));
        assert!(config.env_setup.is_empty());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            concurrency = 2
            expected_repo = "mrs-sdk-qt-fork"

            [env_setup]
            yocto = "source /opt/poky/environment-setup"
        "#;
        let config: FleetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.expected_origin(), Some("mrs-sdk-qt-fork"));
        assert_eq!(
            config.env_setup.get("yocto").map(String::as_str),
            Some("source /opt/poky/environment-setup")
        );
        assert_eq!(config.generator, "Ninja");
    }

    #[test]
    fn origin_check_on_unless_blanked() {
        let config: FleetConfig = toml::from_str("concurrency = 2").unwrap();
        assert_eq!(config.expected_origin(), Some("mrs-sdk-qt"));

        let config: FleetConfig = toml::from_str("expected_repo = \"\"").unwrap();
        assert_eq!(config.expected_origin(), None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = toml::from_str::<FleetConfig>("concurency = 3");
        assert!(result.is_err());
    }

    #[test]
    fn from_file_reads_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "generator = \"Unix Makefiles\"\n").unwrap();
        let config = FleetConfig::from_file(&path).unwrap();
        assert_eq!(config.generator, "Unix Makefiles");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = FleetConfig::from_file(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn jobs_override() {
        let mut config = FleetConfig::default();
        config.apply_jobs_override(" 8 ").unwrap();
        assert_eq!(config.concurrency, 8);

        config.apply_jobs_override("").unwrap();
        assert_eq!(config.concurrency, 8);

        assert!(config.apply_jobs_override("0").is_err());
        assert!(config.apply_jobs_override("lots").is_err());
        assert_eq!(config.concurrency, 8);
    }
}
