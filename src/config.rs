use crate::catalog::amazon::Credentials;
use crate::catalog::Locale;
use crate::ledger::DEFAULT_LEDGER;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Locales are tried in this order unless configured otherwise
pub const DEFAULT_LOCALES: [Locale; 2] = [Locale::De, Locale::Us];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Missing credential `{0}` (set it in the config file, on the command line or in the environment)")]
    MissingCredential(&'static str),
    #[error("No locales configured")]
    NoLocales,
}

/// Contents of the optional JSON config file
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct FileConfig {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub affiliate_tag: Option<String>,
    pub locales: Option<Vec<Locale>>,
    pub ledger: Option<PathBuf>,
}

impl FileConfig {
    /// `<config dir>/wikishelf/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wikishelf").join("config.json"))
    }

    /// Load an explicitly named file, or the default one if it exists
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Default)]
pub struct Overrides {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub affiliate_tag: Option<String>,
    pub locales: Vec<Locale>,
    pub ledger: Option<PathBuf>,
}

/// Fully resolved runtime settings
#[derive(Debug)]
pub struct Settings {
    pub credentials: Credentials,
    pub locales: Vec<Locale>,
    pub ledger: PathBuf,
}

impl Settings {
    /// Merge the config file with overrides; overrides win
    pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Self, ConfigError> {
        let credentials = Credentials {
            access_key_id: overrides
                .access_key_id
                .or(file.access_key_id)
                .ok_or(ConfigError::MissingCredential("access_key_id"))?,
            secret_access_key: overrides
                .secret_access_key
                .or(file.secret_access_key)
                .ok_or(ConfigError::MissingCredential("secret_access_key"))?,
            associate_tag: overrides
                .affiliate_tag
                .or(file.affiliate_tag)
                .ok_or(ConfigError::MissingCredential("affiliate_tag"))?,
        };

        let locales = if !overrides.locales.is_empty() {
            overrides.locales
        } else {
            file.locales.unwrap_or_else(|| DEFAULT_LOCALES.to_vec())
        };
        if locales.is_empty() {
            return Err(ConfigError::NoLocales);
        }

        let ledger = overrides
            .ledger
            .or(file.ledger)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER));

        Ok(Self {
            credentials,
            locales,
            ledger,
        })
    }
}
