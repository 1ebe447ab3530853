//! Installer descriptors (installer manifests)
//!
//! A descriptor declares one deployable agent or tool: its identity, the
//! installers it depends on, and the runtime metadata needed to run it.
//! Manifests are YAML or JSON documents with camelCase keys.

use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::error::{InstallerError, Result};
use crate::fqn::{InstallerFqn, DEFAULT_VERSION, VERSION_SEPARATOR};

/// Valid transport protocols for a server port declaration
pub const VALID_PORT_PROTOCOLS: &[&str] = &["tcp", "udp"];

/// Separator characters allowed inside an installer id
const ID_SEPARATORS: &[char] = &['.', '-', '_'];

/// An installer descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installer {
    /// Identifier, stable across versions
    pub id: String,

    /// Version; `None` means the default version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Description of what the installer provides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Dependency references (`id` or `id:version`), in declaration order
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Free-form runtime properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,

    /// Installation script body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    /// Servers the installed agent exposes, keyed by server name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub servers: BTreeMap<String, ServerConfig>,
}

/// A server exposed by an installed agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port, optionally with protocol (e.g. `4401/tcp`)
    pub port: String,

    /// URL scheme (e.g. `http`, `ws`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,

    /// URL path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Extra attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ServerConfig {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            protocol: None,
            path: None,
            attributes: BTreeMap::new(),
        }
    }
}

impl Installer {
    /// Create a descriptor with no dependencies or metadata
    pub fn new(id: &str, version: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            version: version.map(str::to_string),
            name: None,
            description: None,
            dependencies: Vec::new(),
            properties: BTreeMap::new(),
            script: None,
            servers: BTreeMap::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_script(mut self, script: &str) -> Self {
        self.script = Some(script.to_string());
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_server(mut self, name: &str, server: ServerConfig) -> Self {
        self.servers.insert(name.to_string(), server);
        self
    }

    /// Version with the default token applied
    pub fn effective_version(&self) -> &str {
        match self.version.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => DEFAULT_VERSION,
        }
    }

    /// Canonical key of this descriptor
    pub fn fqn(&self) -> Result<InstallerFqn> {
        InstallerFqn::of(self)
    }

    /// Parse every dependency reference, keeping declaration order
    pub fn dependency_fqns(&self) -> Result<Vec<InstallerFqn>> {
        self.dependencies
            .iter()
            .map(|dep| InstallerFqn::parse(dep))
            .collect()
    }

    /// Load a manifest from a file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: &Path) -> AnyResult<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read installer manifest: {}", path.display()))?;

        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };

        parsed.with_context(|| format!("Failed to parse installer manifest: {}", path.display()))
    }

    /// Parse a manifest from a YAML string
    pub fn from_yaml(content: &str) -> AnyResult<Self> {
        serde_yaml_ng::from_str(content).context("Invalid installer manifest YAML")
    }

    /// Parse a manifest from a JSON string
    pub fn from_json(content: &str) -> AnyResult<Self> {
        serde_json::from_str(content).context("Invalid installer manifest JSON")
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> AnyResult<String> {
        serde_yaml_ng::to_string(self).context("Failed to serialize installer manifest")
    }

    /// Validate the descriptor contents
    pub fn validate(&self) -> Result<()> {
        let id = self.id.as_str();

        if id.is_empty() {
            return Err(InstallerError::invalid_manifest(id, "installer id is required"));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ID_SEPARATORS.contains(&c))
        {
            return Err(InstallerError::invalid_manifest(
                id,
                "id must contain only ASCII letters, digits, '.', '-' or '_'",
            ));
        }

        if id.starts_with(ID_SEPARATORS) || id.ends_with(ID_SEPARATORS) {
            return Err(InstallerError::invalid_manifest(
                id,
                "id cannot start or end with a separator",
            ));
        }

        if let Some(version) = &self.version {
            if version.trim().is_empty() {
                return Err(InstallerError::invalid_manifest(
                    id,
                    "version must not be blank; omit it to use the default version",
                ));
            }
            if version.contains(VERSION_SEPARATOR) {
                return Err(InstallerError::invalid_manifest(
                    id,
                    format!("version '{version}' must not contain '{VERSION_SEPARATOR}'"),
                ));
            }
        }

        let own = self.fqn()?;
        for dependency in &self.dependencies {
            let dep = InstallerFqn::parse(dependency).map_err(|e| {
                InstallerError::invalid_manifest(id, format!("bad dependency '{dependency}': {e}"))
            })?;
            if dep == own {
                return Err(InstallerError::invalid_manifest(
                    id,
                    format!("installer '{own}' depends on itself"),
                ));
            }
        }

        for (name, server) in &self.servers {
            if !is_valid_port(&server.port) {
                return Err(InstallerError::invalid_manifest(
                    id,
                    format!(
                        "server '{name}' has invalid port '{}'; expected <port> or <port>/<{}>",
                        server.port,
                        VALID_PORT_PROTOCOLS.join("|")
                    ),
                ));
            }
        }

        Ok(())
    }
}

fn is_valid_port(port: &str) -> bool {
    let (number, protocol) = match port.split_once('/') {
        Some((number, protocol)) => (number, Some(protocol)),
        None => (port, None),
    };

    let number_ok = number.parse::<u16>().map(|n| n > 0).unwrap_or(false);
    let protocol_ok = protocol
        .map(|p| VALID_PORT_PROTOCOLS.contains(&p))
        .unwrap_or(true);

    number_ok && protocol_ok
}

// Catalog identity is the (id, version) pair; metadata does not participate.
impl PartialEq for Installer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.effective_version() == other.effective_version()
    }
}

impl Eq for Installer {}

impl Hash for Installer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.effective_version().hash(state);
    }
}
