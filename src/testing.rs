//! In-memory catalogs for exercising actions and the dispatcher.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use crate::db::{Catalog, LocalStore, RemoteStore};
use crate::error::{CatalogError, CatalogResult};
use crate::overlay::{Overlay, OverlayKind, OverlaySource};

/// An official Subversion overlay with the given sources.
pub fn svn_overlay(name: &str, sources: &[&str]) -> Overlay {
    let mut overlay = Overlay::new(name, OverlayKind::Svn, sources[0]);
    overlay.sources = sources
        .iter()
        .map(|src| OverlaySource::new(OverlayKind::Svn, src))
        .collect();
    overlay
}

/// Records every mutation instead of touching the filesystem.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    overlays: BTreeMap<String, Overlay>,
    unsupported: Vec<String>,
    failing: Vec<String>,
    cache_fails: bool,
    storage: PathBuf,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub synced: Vec<String>,
    pub cache_calls: usize,
}

impl FakeCatalog {
    pub fn with(mut self, overlay: Overlay) -> Self {
        self.overlays.insert(overlay.name.clone(), overlay);
        self
    }

    pub fn unsupported(mut self, name: &str) -> Self {
        self.unsupported.push(name.to_string());
        self
    }

    /// Makes add, delete and sync fail for `name`.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.push(name.to_string());
        self
    }

    pub fn fail_cache(mut self) -> Self {
        self.cache_fails = true;
        self
    }

    pub fn in_storage(mut self, storage: &Path) -> Self {
        self.storage = storage.to_path_buf();
        self
    }

    fn check(&self, name: &str) -> CatalogResult<()> {
        if self.failing.iter().any(|failing| failing == name) {
            return Err(CatalogError::Tool {
                command: format!("fake {name}"),
                message: "exit status 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Catalog for FakeCatalog {
    fn overlays(&self) -> &BTreeMap<String, Overlay> {
        &self.overlays
    }

    fn is_supported(&self, overlay: &Overlay) -> bool {
        !self.unsupported.contains(&overlay.name)
    }
}

impl LocalStore for FakeCatalog {
    fn add(&mut self, overlay: &Overlay, _quiet: bool) -> CatalogResult<()> {
        self.check(&overlay.name)?;
        self.overlays.insert(overlay.name.clone(), overlay.clone());
        self.added.push(overlay.name.clone());
        Ok(())
    }

    fn delete(&mut self, overlay: &Overlay) -> CatalogResult<()> {
        self.check(&overlay.name)?;
        self.overlays.remove(&overlay.name);
        self.deleted.push(overlay.name.clone());
        Ok(())
    }

    fn sync(&mut self, name: &str, _quiet: bool) -> CatalogResult<()> {
        self.select(name)?;
        self.check(name)?;
        self.synced.push(name.to_string());
        Ok(())
    }

    fn storage(&self) -> &Path {
        &self.storage
    }
}

impl RemoteStore for FakeCatalog {
    fn cache(&mut self) -> CatalogResult<()> {
        self.cache_calls += 1;
        if self.cache_fails {
            return Err(CatalogError::Fetch {
                url: "https://example.org/repositories.json".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}
