//! Importer configuration, loaded from YAML

use crate::inversion::ControllerConfig;
use crate::operation::ImportKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Settings for one import, usually overridden piecemeal by CLI flags.
///
/// ```yaml
/// record_type: contacts
/// kind: PARTIAL_UPDATE
/// key_type: email
/// controller:
///   thread_name: contacts-consumer
///   stack_size: 1048576
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    pub record_type: String,
    pub kind: ImportKind,
    /// Identifier type that keys the mirror store
    pub key_type: String,
    pub controller: ControllerConfig,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            record_type: "records".to_string(),
            kind: ImportKind::FullSync,
            key_type: "id".to_string(),
            controller: ControllerConfig::default(),
        }
    }
}

impl ImporterConfig {
    pub fn from_yaml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(path, &text)
    }

    /// Load from `path` if given, else from the default location if a file
    /// exists there, else use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// `~/.config/importar/config.yaml` or the platform equivalent
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("importar").join("config.yaml"))
}
