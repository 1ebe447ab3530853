//! Catalog queries over manifests loaded from disk

mod common;

use common::{init_test_logging, keys, write_manifest};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;
use toolshed_core::{
    builtins, InstallerRegistry, InstallerStore, MemoryInstallerStore, ToolshedConfig,
    DEFAULT_VERSION,
};

fn write_catalog(root: &std::path::Path) {
    let builtin_dir = root.join("builtins");
    write_manifest(
        &builtin_dir,
        "exec.yaml",
        r#"
id: exec
name: Exec
description: Runs commands inside the machine
servers:
  exec-agent/http:
    port: 4412/tcp
    protocol: http
    path: /process
"#,
    );
    write_manifest(
        &builtin_dir,
        "exec-1.yaml",
        r#"
id: exec
version: "1.0.0"
"#,
    );
    write_manifest(
        &builtin_dir,
        "terminal.json",
        r#"{"id": "terminal", "dependencies": ["exec"]}"#,
    );

    let store_dir = root.join("store");
    write_manifest(
        &store_dir,
        "ws-agent.yaml",
        r#"
id: ws-agent
version: "2.0.0"
dependencies:
  - terminal
  - exec:1.0.0
"#,
    );
    write_manifest(
        &store_dir,
        "exec-override.yaml",
        r#"
id: exec
description: Shadowed by the built-in
"#,
    );
}

fn load_registry(
    root: &std::path::Path,
) -> (
    InstallerRegistry<Arc<MemoryInstallerStore>>,
    Arc<MemoryInstallerStore>,
) {
    init_test_logging();

    let config_path = root.join("config.yaml");
    ToolshedConfig {
        builtin_dirs: vec![root.join("builtins")],
        store_dirs: vec![root.join("store")],
        page_size: 2,
    }
    .save_to_path(&config_path)
    .unwrap();

    let config = ToolshedConfig::load_from_path(&config_path).unwrap();
    let store = Arc::new(
        MemoryInstallerStore::from_installers(builtins::load_dirs(&config.store_dirs).unwrap())
            .unwrap(),
    );
    let registry = InstallerRegistry::new(
        builtins::load_dirs(&config.builtin_dirs).unwrap(),
        store.clone(),
    )
    .unwrap()
    .with_page_size(config.page_size);

    (registry, store)
}

#[test]
fn test_catalog_listing() {
    let temp_dir = TempDir::new().unwrap();
    write_catalog(temp_dir.path());
    let (registry, store) = load_registry(temp_dir.path());

    assert_eq!(registry.builtin_count(), 3);
    assert_eq!(registry.page_size(), 2);
    assert_eq!(store.get_total_count().unwrap(), 2);

    let installers = registry.get_installers().unwrap();
    assert_eq!(
        keys(&installers),
        vec![
            "exec:1.0.0",
            "exec:latest",
            "terminal:latest",
            "ws-agent:2.0.0"
        ]
    );

    let exec = registry.get_installer("exec").unwrap();
    assert_eq!(exec.effective_version(), DEFAULT_VERSION);
    assert_eq!(
        exec.description.as_deref(),
        Some("Runs commands inside the machine")
    );
    assert_eq!(exec.servers["exec-agent/http"].port, "4412/tcp");
}

#[test]
fn test_catalog_versions() {
    let temp_dir = TempDir::new().unwrap();
    write_catalog(temp_dir.path());
    let (registry, _) = load_registry(temp_dir.path());

    let mut versions = registry.get_versions("exec").unwrap();
    versions.sort();
    assert_eq!(versions, vec!["1.0.0", "latest"]);
    assert_eq!(registry.get_versions("ws-agent").unwrap(), vec!["2.0.0"]);
}

#[test]
fn test_catalog_install_plan() {
    let temp_dir = TempDir::new().unwrap();
    write_catalog(temp_dir.path());
    let (registry, _) = load_registry(temp_dir.path());

    let plan = registry.get_ordered_installers(&["ws-agent:2.0.0"]).unwrap();
    assert_eq!(
        keys(&plan),
        vec![
            "exec:latest",
            "terminal:latest",
            "exec:1.0.0",
            "ws-agent:2.0.0"
        ]
    );
}

#[test]
fn test_published_builtins_visible_through_store() {
    let temp_dir = TempDir::new().unwrap();
    write_catalog(temp_dir.path());
    let (registry, store) = load_registry(temp_dir.path());

    assert_eq!(registry.publish_builtins().unwrap(), 3);
    assert_eq!(store.get_total_count().unwrap(), 4);

    let exec = store
        .get_by_fqn(&toolshed_core::InstallerFqn::parse("exec").unwrap())
        .unwrap();
    assert_eq!(exec.name.as_deref(), Some("Exec"));
}
