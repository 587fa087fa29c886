// File: src/store.rs
// Purpose: Versioned catalog snapshots shared by every request

use crate::error::CatalogError;
use crate::page_loader::{LoadedPages, PageLoader};
use arc_swap::ArcSwap;
use folio_router::PageCatalog;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};

/// One immutable generation of the route table
#[derive(Debug)]
pub struct CatalogSnapshot {
    version: u64,
    catalog: PageCatalog,
}

impl CatalogSnapshot {
    /// Monotonic generation number, starting at 1
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn catalog(&self) -> &PageCatalog {
        &self.catalog
    }
}

/// Holds the current catalog snapshot
///
/// Readers take a snapshot with [`CatalogStore::snapshot`] once per request
/// and keep using it even if a rebuild swaps in a newer one. Publishing is
/// serialized so versions stay monotonic.
pub struct CatalogStore {
    current: ArcSwap<CatalogSnapshot>,
    writer: Mutex<()>,
}

impl CatalogStore {
    /// Builds the first snapshot from `loader`
    ///
    /// Errors here (ambiguous routes included) are meant to abort startup.
    pub fn open(loader: &PageLoader) -> Result<Self, CatalogError> {
        Ok(Self::new(loader.load()?))
    }

    /// Wraps an already built catalog as version 1
    pub fn new(pages: LoadedPages) -> Self {
        let snapshot = CatalogSnapshot {
            version: 1,
            catalog: pages.catalog,
        };
        Self {
            current: ArcSwap::from_pointee(snapshot),
            writer: Mutex::new(()),
        }
    }

    pub fn from_catalog(catalog: PageCatalog) -> Self {
        Self::new(LoadedPages {
            catalog,
            layouts: BTreeSet::new(),
        })
    }

    /// Current snapshot, lock-free
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// Atomically replaces the current snapshot, returning the new version
    pub fn publish(&self, pages: LoadedPages) -> u64 {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.swap_locked(pages)
    }

    /// Rebuilds from `loader` and publishes the result
    ///
    /// On failure the current snapshot stays in service.
    pub fn rebuild(&self, loader: &PageLoader) -> Result<u64, CatalogError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match loader.load() {
            Ok(pages) => {
                let version = self.swap_locked(pages);
                info!(version, "page catalog swapped");
                Ok(version)
            }
            Err(e) => {
                error!(error = %e, version = self.version(), "catalog rebuild failed, keeping current catalog");
                Err(e)
            }
        }
    }

    fn swap_locked(&self, pages: LoadedPages) -> u64 {
        let version = self.current.load().version + 1;
        self.current.store(Arc::new(CatalogSnapshot {
            version,
            catalog: pages.catalog,
        }));
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_router::{CatalogBuilder, MatchKind, Route, RoutePath};

    fn catalog(patterns: &[&str]) -> PageCatalog {
        CatalogBuilder::new()
            .routes(
                patterns
                    .iter()
                    .map(|p| Route::from_pattern(p, format!("{}/index.html", p.trim_matches('/')).as_str()).unwrap()),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let store = CatalogStore::from_catalog(catalog(&["/about"]));
        let before = store.snapshot();

        let version = store.publish(LoadedPages {
            catalog: catalog(&["/contact"]),
            layouts: BTreeSet::new(),
        });

        assert_eq!(version, 2);
        assert_eq!(before.version(), 1);
        let about: RoutePath = "/about".parse().unwrap();
        assert_eq!(before.catalog().resolve(&about).kind(), MatchKind::Static);
        assert_eq!(store.snapshot().catalog().resolve(&about).kind(), MatchKind::NotFound);
    }

    #[test]
    fn test_failed_rebuild_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["[a]", "[b]"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("index.html"), "x").unwrap();
        }

        let store = CatalogStore::from_catalog(catalog(&["/about"]));
        let loader = PageLoader::new(dir.path());
        assert!(store.rebuild(&loader).is_err());
        assert_eq!(store.version(), 1);
        assert_eq!(store.snapshot().catalog().len(), 1);
    }

    #[test]
    fn test_versions_are_monotonic_across_threads() {
        let store = Arc::new(CatalogStore::from_catalog(PageCatalog::empty()));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.publish(LoadedPages::default()))
            })
            .collect();

        let mut versions: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        versions.sort_unstable();
        assert_eq!(versions, (2..=9).collect::<Vec<_>>());
        assert_eq!(store.version(), 9);
    }
}
