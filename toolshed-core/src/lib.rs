//! Toolshed core library
//!
//! Catalogs versioned installer descriptors and turns a requested set of
//! installers into a single install order that respects every transitive
//! dependency.

pub mod builtins;
pub mod config;
pub mod error;
pub mod fqn;
pub mod installer;
pub mod registry;
pub mod store;

pub use config::ToolshedConfig;
pub use error::{InstallerError, Result};
pub use fqn::{InstallerFqn, DEFAULT_VERSION};
pub use installer::{Installer, ServerConfig};
pub use registry::{InstallerRegistry, DEFAULT_PAGE_SIZE};
pub use store::{InstallerStore, MemoryInstallerStore, Page};
