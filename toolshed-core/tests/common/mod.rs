//! Test helper functions for integration tests
//!
//! Shared across the test files in this directory using the tests/common/
//! pattern.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Once};

use toolshed_core::{Installer, InstallerRegistry, MemoryInstallerStore};

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub type TestRegistry = InstallerRegistry<Arc<MemoryInstallerStore>>;

/// Build an installer from a key and its dependency references
pub fn installer(key: &str, dependencies: &[&str]) -> Installer {
    let (id, version) = match key.split_once(':') {
        Some((id, version)) => (id, Some(version)),
        None => (key, None),
    };
    Installer::new(id, version).with_dependencies(dependencies.iter().copied())
}

/// Registry with the given built-ins over an empty shared store
pub fn registry_with_builtins(builtins: Vec<Installer>) -> (TestRegistry, Arc<MemoryInstallerStore>) {
    init_test_logging();
    let store = Arc::new(MemoryInstallerStore::new());
    let registry = InstallerRegistry::new(builtins, store.clone()).expect("registry");
    (registry, store)
}

/// Registry with no built-ins whose store holds the given installers
pub fn registry_with_store(stored: Vec<Installer>) -> (TestRegistry, Arc<MemoryInstallerStore>) {
    init_test_logging();
    let store = Arc::new(MemoryInstallerStore::from_installers(stored).expect("store"));
    let registry = InstallerRegistry::new(Vec::new(), store.clone()).expect("registry");
    (registry, store)
}

/// Canonical keys of a resolved sequence
pub fn keys(installers: &[Installer]) -> Vec<String> {
    installers
        .iter()
        .map(|i| i.fqn().expect("fqn").to_string())
        .collect()
}

/// Write a YAML manifest into `dir`
pub fn write_manifest(dir: &Path, file_name: &str, content: &str) {
    fs::create_dir_all(dir).expect("create manifest dir");
    fs::write(dir.join(file_name), content).expect("write manifest");
}

/// Assert every installer's dependencies appear before it
pub fn assert_dependencies_first(ordered: &[Installer]) {
    let position = |key: &str| {
        ordered
            .iter()
            .position(|i| i.fqn().expect("fqn").to_string() == key)
    };

    for (index, installer) in ordered.iter().enumerate() {
        for dependency in installer.dependency_fqns().expect("dependencies") {
            let dep_index = position(&dependency.to_string())
                .unwrap_or_else(|| panic!("dependency {dependency} missing from output"));
            assert!(
                dep_index < index,
                "{dependency} must come before {}",
                installer.fqn().expect("fqn")
            );
        }
    }
}
