//! Built-in installer sets loaded from manifest directories

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::installer::Installer;

/// File extensions recognized as installer manifests
pub const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Load and validate every manifest in `dir`, in file-name order
///
/// A missing directory yields an empty set.
pub fn load_dir(dir: &Path) -> Result<Vec<Installer>> {
    if !dir.exists() {
        debug!("Manifest directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read manifest directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && is_manifest(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut installers = Vec::with_capacity(paths.len());
    for path in &paths {
        let installer = Installer::from_file(path)?;
        installer
            .validate()
            .with_context(|| format!("Invalid installer manifest: {}", path.display()))?;
        installers.push(installer);
    }

    debug!(
        "Loaded {} installer manifests from {}",
        installers.len(),
        dir.display()
    );
    Ok(installers)
}

/// Load several directories, concatenated in the given order
pub fn load_dirs(dirs: &[PathBuf]) -> Result<Vec<Installer>> {
    let mut installers = Vec::new();
    for dir in dirs {
        installers.extend(load_dir(dir)?);
    }
    Ok(installers)
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MANIFEST_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod builtins_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_dir_reads_yaml_and_json() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("b-terminal.yaml"),
            "id: terminal\ndependencies: [exec]\n",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join("a-exec.json"),
            r#"{"id": "exec", "version": "1.0"}"#,
        )
        .unwrap();
        std::fs::write(temp_dir.path().join("README.md"), "not a manifest").unwrap();

        let installers = load_dir(temp_dir.path()).unwrap();
        assert_eq!(installers.len(), 2);
        assert_eq!(installers[0].id, "exec");
        assert_eq!(installers[1].id, "terminal");
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let installers = load_dir(&temp_dir.path().join("nope")).unwrap();
        assert!(installers.is_empty());
    }

    #[test]
    fn test_invalid_manifest_fails_with_path() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("bad.yaml"), "id: Bad Id\n").unwrap();

        let err = load_dir(temp_dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("bad.yaml"));
    }

    #[test]
    fn test_load_dirs_concatenates() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::write(first.path().join("exec.yaml"), "id: exec\n").unwrap();
        std::fs::write(second.path().join("exec.yaml"), "id: exec\nversion: '2.0'\n").unwrap();

        let installers =
            load_dirs(&[first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();
        assert_eq!(installers.len(), 2);
        assert_eq!(installers[1].version.as_deref(), Some("2.0"));
    }
}
