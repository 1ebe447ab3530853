//! Installer registry
//!
//! Merges a fixed built-in descriptor set with the contents of an
//! [`InstallerStore`] and answers catalog queries over the merged view.
//! Built-in records shadow store records with the same FQN. Nothing read
//! from the store is cached, so every call observes the store's current
//! state.
//!
//! The main operation is [`InstallerRegistry::get_ordered_installers`],
//! which expands the requested installers to their full dependency closure
//! and orders it so that each installer comes after everything it depends
//! on.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, trace, warn};

use crate::error::{InstallerError, Result};
use crate::fqn::InstallerFqn;
use crate::installer::Installer;
use crate::store::{InstallerStore, Page};

/// Page size used when enumerating the store
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Catalog of installers backed by built-ins and a store
pub struct InstallerRegistry<S> {
    builtins: HashMap<InstallerFqn, Installer>,
    store: S,
    page_size: usize,
}

/// Per-call traversal state for dependency ordering
#[derive(Default)]
struct Resolution {
    visited: HashSet<InstallerFqn>,
    in_progress: HashSet<InstallerFqn>,
    ordered: Vec<Installer>,
}

impl<S: InstallerStore> InstallerRegistry<S> {
    /// Create a registry over a built-in set and a store
    ///
    /// When the built-in set holds two records with the same FQN the later
    /// one wins.
    pub fn new<I>(builtins: I, store: S) -> Result<Self>
    where
        I: IntoIterator<Item = Installer>,
    {
        let mut map = HashMap::new();
        for installer in builtins {
            let fqn = installer.fqn()?;
            if map.insert(fqn.clone(), installer).is_some() {
                warn!("Duplicate built-in installer {}; keeping the last definition", fqn);
            }
        }

        info!(
            "Installer registry initialized with {} built-in installers",
            map.len()
        );

        Ok(Self {
            builtins: map,
            store,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Set the page size used to enumerate the store (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of built-in installers
    pub fn builtin_count(&self) -> usize {
        self.builtins.len()
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// All distinct versions known for `id`, newest first
    ///
    /// Semver versions come first, newest first. Versions that do not parse
    /// as semver follow in reverse string order. Unknown ids yield an empty
    /// list.
    pub fn get_versions(&self, id: &str) -> Result<Vec<String>> {
        let mut versions: BTreeSet<String> = self
            .builtins
            .keys()
            .filter(|fqn| fqn.id() == id)
            .map(|fqn| fqn.version().to_string())
            .collect();

        let stored = self.drain_pages(|max, skip| self.store.get_versions(id, max, skip))?;
        versions.extend(
            stored
                .iter()
                .map(|installer| installer.effective_version().to_string()),
        );

        let mut versions: Vec<String> = versions.into_iter().collect();
        versions.sort_by(|a, b| compare_versions_newest_first(a, b));

        Ok(versions)
    }

    /// One record per known FQN, sorted by FQN
    ///
    /// Built-in records take precedence over store records with the same FQN.
    pub fn get_installers(&self) -> Result<Vec<Installer>> {
        let mut merged: BTreeMap<InstallerFqn, Installer> = self
            .builtins
            .iter()
            .map(|(fqn, installer)| (fqn.clone(), installer.clone()))
            .collect();

        for installer in self.drain_pages(|max, skip| self.store.get_all(max, skip))? {
            let fqn = installer.fqn()?;
            merged.entry(fqn).or_insert(installer);
        }

        Ok(merged.into_values().collect())
    }

    /// A page of [`Self::get_installers`]
    pub fn get_installers_page(&self, max_items: usize, skip_count: usize) -> Result<Page<Installer>> {
        Ok(Page::from_listing(
            self.get_installers()?,
            max_items,
            skip_count,
        ))
    }

    /// Look up one installer by `id` or `id:version`
    pub fn get_installer(&self, key: &str) -> Result<Installer> {
        let fqn = InstallerFqn::parse(key)?;
        self.find(&fqn)
    }

    /// Requested installers plus their transitive dependencies, dependencies first
    ///
    /// Requested keys are expanded in input order and each dependency list
    /// in declaration order; every installer appears once. Fails without a
    /// partial result when a dependency is missing or a cycle is found.
    pub fn get_ordered_installers<K: AsRef<str>>(&self, keys: &[K]) -> Result<Vec<Installer>> {
        let requested = keys
            .iter()
            .map(|key| InstallerFqn::parse(key.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Resolving install order for {} requested installers",
            requested.len()
        );

        let mut resolution = Resolution::default();
        for fqn in &requested {
            self.visit(fqn, &mut resolution)?;
        }

        debug!(
            "Resolved {} installers: {}",
            resolution.ordered.len(),
            resolution
                .ordered
                .iter()
                .filter_map(|i| i.fqn().ok())
                .map(|fqn| fqn.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(resolution.ordered)
    }

    /// Write every built-in record into the store
    ///
    /// Existing store records with the same FQN are overwritten. Returns
    /// the number of records written.
    pub fn publish_builtins(&self) -> Result<usize> {
        let mut fqns: Vec<&InstallerFqn> = self.builtins.keys().collect();
        fqns.sort();

        for fqn in &fqns {
            let installer = self.builtins[*fqn].clone();
            match self.store.create(installer.clone()) {
                Ok(()) => {}
                Err(e) if e.is_conflict() => self.store.update(installer)?,
                Err(e) => return Err(e),
            }
        }

        info!("Published {} built-in installers to the store", fqns.len());
        Ok(fqns.len())
    }

    /// Built-ins first, then the store
    fn find(&self, fqn: &InstallerFqn) -> Result<Installer> {
        if let Some(installer) = self.builtins.get(fqn) {
            return Ok(installer.clone());
        }

        self.store.get_by_fqn(fqn).map_err(|e| match e {
            InstallerError::NotFound(_) => InstallerError::NotFound(fqn.to_string()),
            other => other,
        })
    }

    fn visit(&self, fqn: &InstallerFqn, resolution: &mut Resolution) -> Result<()> {
        if resolution.visited.contains(fqn) {
            return Ok(());
        }

        let installer = self.find(fqn)?;
        trace!("Expanding {} ({} dependencies)", fqn, installer.dependencies.len());

        resolution.in_progress.insert(fqn.clone());

        for dependency in installer.dependency_fqns()? {
            if resolution.in_progress.contains(&dependency) {
                return Err(InstallerError::DependencyCycle {
                    installer: fqn.clone(),
                    dependency,
                });
            }
            self.visit(&dependency, resolution)?;
        }

        resolution.in_progress.remove(fqn);
        resolution.visited.insert(fqn.clone());
        resolution.ordered.push(installer);

        Ok(())
    }

    /// Fetch pages until the store returns a short or final page
    fn drain_pages<F>(&self, mut fetch: F) -> Result<Vec<Installer>>
    where
        F: FnMut(usize, usize) -> Result<Page<Installer>>,
    {
        let mut all = Vec::new();
        let mut skip = 0;

        loop {
            let page = fetch(self.page_size, skip)?;
            let fetched = page.len();
            let more = page.has_next_page();
            all.extend(page.into_items());

            if fetched < self.page_size || !more {
                break;
            }
            skip += fetched;
        }

        Ok(all)
    }
}

/// Total order: semver newest first, then non-semver in reverse string order
fn compare_versions_newest_first(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(va), Ok(vb)) => vb.cmp(&va),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => b.cmp(a),
    }
}
