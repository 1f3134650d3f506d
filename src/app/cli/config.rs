//! TOML configuration file loading
//!
//! An explicit `--config-file` must exist. Without one the default
//! `<config dir>/lfscan/lfscan.toml` is read when present. Command line values
//! take precedence over file values.
//!
//! ```toml
//! include = ["*.bin", "assets"]
//! exclude = "vendor"
//! lockable = ["*.psd", "*.blend"]
//! workers = 4
//! remote = "origin"
//!
//! [logging]
//! level = "debug"
//! format = "ext"
//! file = "/tmp/lfscan.log"
//! color = false
//! ```

use super::args::Args;
use crate::core::error_handling::ContextualError;
use crate::core::pattern_parser::split_pattern_list;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{message}")]
    NotFound { path: PathBuf, message: String },

    #[error("{message}: {source}")]
    Read {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}: {source}")]
    Parse {
        message: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{message}")]
    Invalid { message: String },
}

impl ConfigError {
    fn not_found(path: &Path) -> Self {
        ConfigError::NotFound {
            path: path.to_path_buf(),
            message: format!(
                "The specified configuration file does not exist: {}",
                path.display()
            ),
        }
    }

    pub fn invalid(field: &str, detail: impl std::fmt::Display) -> Self {
        ConfigError::Invalid {
            message: format!("Invalid {}: {}", field, detail),
        }
    }
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::NotFound { message, .. }
            | ConfigError::Read { message, .. }
            | ConfigError::Parse { message, .. }
            | ConfigError::Invalid { message } => Some(message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<PathBuf>,
    pub color: Option<bool>,
}

/// Effective scanner settings: file values with command line overrides applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScannerConfig {
    #[serde(deserialize_with = "string_or_list")]
    pub include: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub exclude: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub lockable: Vec<String>,
    pub workers: Option<usize>,
    pub remote: Option<String>,
    pub logging: LoggingConfig,
}

/// Accept `key = "a, b"` as well as `key = ["a", "b"]`
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => split_pattern_list(&[value]),
        OneOrMany::Many(values) => split_pattern_list(&values),
    })
}

/// `<config dir>/lfscan/lfscan.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lfscan").join("lfscan.toml"))
}

impl ScannerConfig {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load the explicit config file, else the default one if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::not_found(path)),
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            message: format!("Error reading configuration file {}", path.display()),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            message: format!("Error parsing configuration file {}", path.display()),
            source,
        })
    }

    /// Apply command line values on top of the file values
    pub fn merge_args(mut self, args: &Args) -> Self {
        let include = split_pattern_list(&args.include);
        if !include.is_empty() {
            self.include = include;
        }
        let exclude = split_pattern_list(&args.exclude);
        if !exclude.is_empty() {
            self.exclude = exclude;
        }
        let lockable = split_pattern_list(&args.lockable);
        if !lockable.is_empty() {
            self.lockable = lockable;
        }
        if args.workers.is_some() {
            self.workers = args.workers;
        }
        if args.remote.is_some() {
            self.remote = args.remote.clone();
        }

        if args.log_level.is_some() {
            self.logging.level = args.log_level.clone();
        }
        if args.log_format.is_some() {
            self.logging.format = args.log_format.clone();
        }
        match args.log_file.as_deref() {
            Some(file) if file == Path::new("none") || file == Path::new("-") => {
                self.logging.file = None
            }
            Some(file) => self.logging.file = Some(file.to_path_buf()),
            None => {}
        }
        if let Some(color) = args.color_override() {
            self.logging.color = Some(color);
        }
        self
    }
}
