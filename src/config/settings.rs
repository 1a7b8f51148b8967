//! Application settings and paths.
//!
//! Settings live in `settings.json` under the XDG config directory. A missing
//! file means defaults; command-line flags override whatever is loaded.

use crate::error::{ConfigError, ConfigResult};
use crate::output::OutputFormat;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application directory paths following the XDG Base Directory layout.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/prowl)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the directories. Nothing is created.
    pub fn discover() -> ConfigResult<Self> {
        let project =
            ProjectDirs::from("com", "prowl", "prowl").ok_or(ConfigError::DirectoryNotFound)?;
        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Defaults for `prowl scan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanDefaults {
    pub threads: usize,
    /// Connect timeout in fractional seconds.
    pub wait_secs: f64,
    pub ports: String,
    pub show_refused: bool,
    pub banner: bool,
    pub resolve: bool,
    /// Probes per second, 0 for unlimited.
    pub rate_limit: u32,
    pub output: OutputFormat,
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            threads: 500,
            wait_secs: 3.0,
            ports: "22,23,80,443".to_string(),
            show_refused: false,
            banner: false,
            resolve: true,
            rate_limit: 0,
            output: OutputFormat::Plain,
        }
    }
}

/// Defaults for `prowl ssh`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshDefaults {
    pub port: u16,
    pub threads: usize,
    pub timeout_secs: f64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub rate_limit: u32,
}

impl Default for SshDefaults {
    fn default() -> Self {
        Self {
            port: 22,
            threads: 5,
            timeout_secs: 5.0,
            max_retries: 5,
            backoff_ms: 250,
            rate_limit: 0,
        }
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scan: ScanDefaults,
    pub ssh: SshDefaults,
}

impl Settings {
    /// Load from `path` if given, else from the default location if the file
    /// exists, else defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }

        let file = match Paths::discover() {
            Ok(paths) => paths.settings_file(),
            Err(_) => return Ok(Self::default()),
        };
        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.scan.threads, 500);
        assert_eq!(settings.scan.wait_secs, 3.0);
        assert_eq!(settings.ssh.port, 22);
        assert_eq!(settings.ssh.max_retries, 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"scan": {{"threads": 64, "output": "json"}}}}"#).unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.scan.threads, 64);
        assert_eq!(settings.scan.output, OutputFormat::Json);
        assert_eq!(settings.scan.ports, "22,23,80,443");
        assert_eq!(settings.ssh, SshDefaults::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            Settings::load_from(file.path()),
            Err(ConfigError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("settings.json");
        assert!(matches!(
            Settings::load(Some(&missing)),
            Err(ConfigError::ReadFailed { .. })
        ));
    }
}
