//! Fully-qualified installer names
//!
//! An [`InstallerFqn`] is the canonical `(id, version)` key of a catalog
//! record. A missing version is replaced by [`DEFAULT_VERSION`] when the key
//! is built, so two FQNs compare equal exactly when both fields match.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{InstallerError, Result};
use crate::installer::Installer;

/// Version token substituted when a key or descriptor omits its version
pub const DEFAULT_VERSION: &str = "latest";

/// Separator between id and version in the canonical string form
pub const VERSION_SEPARATOR: char = ':';

/// Canonical `(id, version)` key of an installer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstallerFqn {
    id: String,
    version: String,
}

impl InstallerFqn {
    /// Build an FQN from parts, normalizing a missing or blank version
    pub fn new(id: &str, version: Option<&str>) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(InstallerError::invalid_key(id, "installer id is empty"));
        }

        let version = match version.map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => DEFAULT_VERSION.to_string(),
        };

        Ok(Self {
            id: id.to_string(),
            version,
        })
    }

    /// Parse `id` or `id:version`
    ///
    /// Splits on the first `:`. A bare id, or an empty version segment,
    /// resolves to [`DEFAULT_VERSION`].
    pub fn parse(key: &str) -> Result<Self> {
        let trimmed = key.trim();
        let (id, version) = match trimmed.split_once(VERSION_SEPARATOR) {
            Some((id, version)) => (id, Some(version)),
            None => (trimmed, None),
        };

        if id.trim().is_empty() {
            return Err(InstallerError::invalid_key(key, "installer id is empty"));
        }

        Self::new(id, version)
    }

    /// Derive the FQN of a descriptor
    pub fn of(installer: &Installer) -> Result<Self> {
        Self::new(&installer.id, installer.version.as_deref())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether the version is the default token
    pub fn is_default_version(&self) -> bool {
        self.version == DEFAULT_VERSION
    }

    /// Canonical `id:version` string
    pub fn to_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InstallerFqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.id, VERSION_SEPARATOR, self.version)
    }
}

impl FromStr for InstallerFqn {
    type Err = InstallerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InstallerFqn {
    type Error = InstallerError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<InstallerFqn> for String {
    fn from(fqn: InstallerFqn) -> Self {
        fqn.to_string()
    }
}
