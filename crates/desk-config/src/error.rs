//! Error types for the desk-config crate.

use std::path::PathBuf;

use desk_notify::NotifyError;
use thiserror::Error;

/// Errors that can occur while loading or applying settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read or written.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for this schema.
    #[error("cannot parse {}: {reason}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A setting is out of range.
    #[error("invalid setting {key}: {reason}")]
    Invalid {
        /// Dotted key of the setting.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The settings could not be rendered as TOML.
    #[error("cannot serialize settings: {0}")]
    Serialize(String),

    /// A channel could not be built.
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialize(err.to_string())
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
