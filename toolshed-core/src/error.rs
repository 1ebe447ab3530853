//! Installer error types with clear, actionable messages

use thiserror::Error;

use crate::fqn::InstallerFqn;

/// Errors raised by the registry, the store contract and manifest handling
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallerError {
    /// A key string could not be parsed into an FQN
    #[error("Invalid installer key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// No record exists for the key in any installer source
    #[error("Installer '{0}' not found")]
    NotFound(String),

    /// A store refused to create a record that already exists
    #[error("Installer '{0}' already exists")]
    Conflict(String),

    /// Resolution re-entered an installer that is still being expanded
    #[error("Installers circular dependency found between '{installer}' and '{dependency}'")]
    DependencyCycle {
        /// The installer whose dependency list was being expanded
        installer: InstallerFqn,
        /// The dependency that points back into the active path
        dependency: InstallerFqn,
    },

    /// A descriptor failed validation
    #[error("Invalid installer manifest '{id}': {reason}")]
    InvalidManifest { id: String, reason: String },

    /// The backing store failed for reasons unrelated to the key space
    #[error("Installer store error: {0}")]
    Store(String),
}

impl InstallerError {
    pub(crate) fn invalid_key(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_manifest(id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidManifest {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// True for [`InstallerError::NotFound`]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for [`InstallerError::Conflict`]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, InstallerError>;
