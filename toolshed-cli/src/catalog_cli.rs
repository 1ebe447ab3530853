//! Toolshed catalog CLI commands
//!
//! Provides commands for listing installers, showing one installer,
//! computing install plans and linting manifests.

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::debug;

use toolshed_core::{
    builtins, Installer, InstallerRegistry, MemoryInstallerStore, ToolshedConfig,
};

/// Sources merged into the catalog, from flags
#[derive(Debug, Default)]
pub struct CatalogOptions {
    pub config_path: Option<PathBuf>,
    pub builtin_dirs: Vec<PathBuf>,
    pub store_dirs: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum CatalogSubcommand {
    /// List every version known for an installer id
    Versions {
        /// Installer id
        id: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List all installers in the catalog
    List {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show one installer (id or id:version)
    Show {
        /// Installer key
        key: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Print the install order for the given installers and their dependencies
    Plan {
        /// Installer keys (id or id:version)
        #[clap(required = true)]
        keys: Vec<String>,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Validate an installer manifest file
    Lint {
        /// Path to the manifest
        path: PathBuf,
    },
}

impl CatalogSubcommand {
    pub fn execute(self, options: &CatalogOptions) -> Result<()> {
        match self {
            CatalogSubcommand::Versions { id, json } => {
                execute_versions(&open_registry(options)?, &id, json)
            }
            CatalogSubcommand::List { json } => execute_list(&open_registry(options)?, json),
            CatalogSubcommand::Show { key, json } => {
                execute_show(&open_registry(options)?, &key, json)
            }
            CatalogSubcommand::Plan { keys, json } => {
                execute_plan(&open_registry(options)?, &keys, json)
            }
            CatalogSubcommand::Lint { path } => execute_lint(&path),
        }
    }
}

type CliRegistry = InstallerRegistry<MemoryInstallerStore>;

/// Build the registry from the config file plus flag directories
fn open_registry(options: &CatalogOptions) -> Result<CliRegistry> {
    let mut config = match &options.config_path {
        Some(path) => ToolshedConfig::load_from_path(path)?,
        None => ToolshedConfig::load()?,
    };
    config.builtin_dirs.extend(options.builtin_dirs.iter().cloned());
    config.store_dirs.extend(options.store_dirs.iter().cloned());

    debug!(
        "Loading catalog: builtins={:?} store={:?}",
        config.builtin_dirs, config.store_dirs
    );

    let store = MemoryInstallerStore::from_installers(builtins::load_dirs(&config.store_dirs)?)
        .context("Failed to seed installer store")?;
    let registry = InstallerRegistry::new(builtins::load_dirs(&config.builtin_dirs)?, store)
        .context("Failed to build installer registry")?
        .with_page_size(config.page_size);

    Ok(registry)
}

fn execute_versions(registry: &CliRegistry, id: &str, json_output: bool) -> Result<()> {
    let versions = registry.get_versions(id)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    if versions.is_empty() {
        println!("No versions found for '{id}'");
        return Ok(());
    }

    println!("Versions of {id}:");
    for version in &versions {
        println!("  {version}");
    }

    Ok(())
}

/// Table row for installer listings
#[derive(Tabled)]
struct InstallerRow {
    #[tabled(rename = "#")]
    position: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Dependencies")]
    dependencies: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl InstallerRow {
    fn new(position: Option<usize>, installer: &Installer) -> Self {
        Self {
            position: position.map(|p| p.to_string()).unwrap_or_default(),
            id: installer.id.clone(),
            version: installer.effective_version().to_string(),
            dependencies: if installer.dependencies.is_empty() {
                "-".to_string()
            } else {
                installer.dependencies.join(", ")
            },
            description: installer
                .description
                .as_deref()
                .and_then(|d| d.lines().next())
                .unwrap_or("")
                .trim()
                .to_string(),
        }
    }
}

fn render_table(rows: &[InstallerRow]) -> String {
    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

/// JSON view of an installer with its canonical key
#[derive(Serialize)]
struct InstallerView<'a> {
    fqn: String,
    #[serde(flatten)]
    installer: &'a Installer,
}

impl<'a> InstallerView<'a> {
    fn new(installer: &'a Installer) -> toolshed_core::Result<Self> {
        Ok(Self {
            fqn: installer.fqn()?.to_string(),
            installer,
        })
    }
}

fn print_json(installers: &[Installer]) -> Result<()> {
    let views = installers
        .iter()
        .map(InstallerView::new)
        .collect::<toolshed_core::Result<Vec<_>>>()?;
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

fn execute_list(registry: &CliRegistry, json_output: bool) -> Result<()> {
    let installers = registry.get_installers()?;

    if json_output {
        return print_json(&installers);
    }

    if installers.is_empty() {
        println!("No installers found");
        return Ok(());
    }

    let rows: Vec<InstallerRow> = installers
        .iter()
        .map(|i| InstallerRow::new(None, i))
        .collect();
    println!("{}", render_table(&rows));
    println!("\n{} installers", installers.len());

    Ok(())
}

fn execute_show(registry: &CliRegistry, key: &str, json_output: bool) -> Result<()> {
    let installer = registry.get_installer(key)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&InstallerView::new(&installer)?)?
        );
        return Ok(());
    }

    println!();
    println!("Installer: {}", installer.id);
    println!("Version:   {}", installer.effective_version());
    if let Some(name) = &installer.name {
        println!("Name:      {name}");
    }

    if let Some(description) = &installer.description {
        println!();
        println!("Description:");
        for line in description.lines() {
            println!("  {line}");
        }
    }

    if !installer.dependencies.is_empty() {
        println!();
        println!("Dependencies:");
        for dependency in &installer.dependencies {
            println!("  {dependency}");
        }
    }

    if !installer.servers.is_empty() {
        println!();
        println!("Servers:");
        for (name, server) in &installer.servers {
            let protocol = server.protocol.as_deref().unwrap_or("-");
            let path = server.path.as_deref().unwrap_or("");
            println!("  {name}: {} ({protocol}){path}", server.port);
        }
    }

    if !installer.properties.is_empty() {
        println!();
        println!("Properties:");
        for (key, value) in &installer.properties {
            println!("  {key} = {value}");
        }
    }

    let versions = registry.get_versions(&installer.id)?;
    if versions.len() > 1 {
        println!();
        println!("Available versions: {}", versions.join(", "));
    }

    Ok(())
}

fn execute_plan(registry: &CliRegistry, keys: &[String], json_output: bool) -> Result<()> {
    let plan = registry
        .get_ordered_installers(keys)
        .context("Failed to compute install plan")?;

    if json_output {
        return print_json(&plan);
    }

    let rows: Vec<InstallerRow> = plan
        .iter()
        .enumerate()
        .map(|(i, installer)| InstallerRow::new(Some(i + 1), installer))
        .collect();
    println!("{}", render_table(&rows));

    Ok(())
}

fn execute_lint(path: &Path) -> Result<()> {
    let installer = Installer::from_file(path)?;
    installer
        .validate()
        .with_context(|| format!("Manifest failed validation: {}", path.display()))?;

    println!(
        "{} is valid ({}:{}, {} dependencies)",
        path.display(),
        installer.id,
        installer.effective_version(),
        installer.dependencies.len()
    );

    Ok(())
}
