//! Installer persistence contract
//!
//! The registry reads through an [`InstallerStore`] for every record that is
//! not part of its built-in set. Consistency of concurrent writes is the
//! store's job: `create` must fail on an existing key and `update` must fail
//! on a missing one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::error::{InstallerError, Result};
use crate::fqn::InstallerFqn;
use crate::installer::Installer;

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Number of items skipped before this page
    pub skip_count: usize,
    /// Requested page size
    pub max_items: usize,
    /// Number of items matching the listing across all pages
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, skip_count: usize, max_items: usize, total_count: usize) -> Self {
        Self {
            items,
            skip_count,
            max_items,
            total_count,
        }
    }

    /// Slice a full listing into the requested page
    pub fn from_listing(all: Vec<T>, max_items: usize, skip_count: usize) -> Self {
        let total_count = all.len();
        let items = all.into_iter().skip(skip_count).take(max_items).collect();
        Self::new(items, skip_count, max_items, total_count)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether items remain after this page
    pub fn has_next_page(&self) -> bool {
        self.next_skip() < self.total_count
    }

    /// Skip count for the following page
    pub fn next_skip(&self) -> usize {
        self.skip_count + self.items.len()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Persistence collaborator consumed by the registry
pub trait InstallerStore: Send + Sync {
    /// Add a new record; fails with [`InstallerError::Conflict`] if the FQN exists
    fn create(&self, installer: Installer) -> Result<()>;

    /// Replace a record; fails with [`InstallerError::NotFound`] if the FQN is absent
    fn update(&self, installer: Installer) -> Result<()>;

    /// Remove a record; removing an absent key is not an error
    fn remove(&self, fqn: &InstallerFqn) -> Result<()>;

    /// Fetch one record; fails with [`InstallerError::NotFound`] if absent
    fn get_by_fqn(&self, fqn: &InstallerFqn) -> Result<Installer>;

    /// Page through all records with the given id
    fn get_versions(&self, id: &str, max_items: usize, skip_count: usize)
        -> Result<Page<Installer>>;

    /// Page through all records
    fn get_all(&self, max_items: usize, skip_count: usize) -> Result<Page<Installer>>;

    /// Number of stored records
    fn get_total_count(&self) -> Result<usize>;
}

impl<S: InstallerStore + ?Sized> InstallerStore for Arc<S> {
    fn create(&self, installer: Installer) -> Result<()> {
        (**self).create(installer)
    }

    fn update(&self, installer: Installer) -> Result<()> {
        (**self).update(installer)
    }

    fn remove(&self, fqn: &InstallerFqn) -> Result<()> {
        (**self).remove(fqn)
    }

    fn get_by_fqn(&self, fqn: &InstallerFqn) -> Result<Installer> {
        (**self).get_by_fqn(fqn)
    }

    fn get_versions(
        &self,
        id: &str,
        max_items: usize,
        skip_count: usize,
    ) -> Result<Page<Installer>> {
        (**self).get_versions(id, max_items, skip_count)
    }

    fn get_all(&self, max_items: usize, skip_count: usize) -> Result<Page<Installer>> {
        (**self).get_all(max_items, skip_count)
    }

    fn get_total_count(&self) -> Result<usize> {
        (**self).get_total_count()
    }
}

/// In-memory store keyed by FQN
///
/// Listings are returned in FQN order, so paging is deterministic.
#[derive(Debug, Default)]
pub struct MemoryInstallerStore {
    installers: RwLock<BTreeMap<InstallerFqn, Installer>>,
}

impl MemoryInstallerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store holding the given records; later duplicates replace earlier ones
    pub fn from_installers<I>(installers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Installer>,
    {
        let mut map = BTreeMap::new();
        for installer in installers {
            map.insert(installer.fqn()?, installer);
        }
        Ok(Self {
            installers: RwLock::new(map),
        })
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<InstallerFqn, Installer>> {
        self.installers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<InstallerFqn, Installer>> {
        self.installers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl InstallerStore for MemoryInstallerStore {
    fn create(&self, installer: Installer) -> Result<()> {
        let fqn = installer.fqn()?;
        let mut installers = self.write();
        if installers.contains_key(&fqn) {
            return Err(InstallerError::Conflict(fqn.to_string()));
        }
        debug!("Created installer {}", fqn);
        installers.insert(fqn, installer);
        Ok(())
    }

    fn update(&self, installer: Installer) -> Result<()> {
        let fqn = installer.fqn()?;
        let mut installers = self.write();
        match installers.get_mut(&fqn) {
            Some(existing) => {
                *existing = installer;
                debug!("Updated installer {}", fqn);
                Ok(())
            }
            None => Err(InstallerError::NotFound(fqn.to_string())),
        }
    }

    fn remove(&self, fqn: &InstallerFqn) -> Result<()> {
        if self.write().remove(fqn).is_some() {
            debug!("Removed installer {}", fqn);
        }
        Ok(())
    }

    fn get_by_fqn(&self, fqn: &InstallerFqn) -> Result<Installer> {
        self.read()
            .get(fqn)
            .cloned()
            .ok_or_else(|| InstallerError::NotFound(fqn.to_string()))
    }

    fn get_versions(
        &self,
        id: &str,
        max_items: usize,
        skip_count: usize,
    ) -> Result<Page<Installer>> {
        let matching: Vec<Installer> = self
            .read()
            .iter()
            .filter(|(fqn, _)| fqn.id() == id)
            .map(|(_, installer)| installer.clone())
            .collect();
        Ok(Page::from_listing(matching, max_items, skip_count))
    }

    fn get_all(&self, max_items: usize, skip_count: usize) -> Result<Page<Installer>> {
        let all: Vec<Installer> = self.read().values().cloned().collect();
        Ok(Page::from_listing(all, max_items, skip_count))
    }

    fn get_total_count(&self) -> Result<usize> {
        Ok(self.read().len())
    }
}
