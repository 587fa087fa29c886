// File: src/page_loader.rs
// Purpose: Builds the page catalog from the pages/ directory

use crate::config::RoutingConfig;
use crate::error::CatalogError;
use crate::front_matter;
use folio_router::{CatalogBuilder, LayoutChoice, LayoutId, PageCatalog, Route, INDEX_STEM};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Directory under the page root holding layout templates
pub const LAYOUTS_DIR: &str = "_layouts";

/// Everything a catalog build discovers
#[derive(Debug, Default)]
pub struct LoadedPages {
    pub catalog: PageCatalog,
    pub layouts: BTreeSet<LayoutId>,
}

/// Scans a page root and compiles it into a [`PageCatalog`]
///
/// # Conventions
///
/// - `index.<ext>` in a directory makes that directory a route
/// - `[name]` directories capture one path segment
/// - names starting with `_` or `.` are never routes
/// - `_layouts/<id>.<ext>` files are layouts
#[derive(Debug, Clone)]
pub struct PageLoader {
    pages_dir: PathBuf,
    case_insensitive: bool,
}

impl PageLoader {
    /// Create a loader with case-sensitive routing
    pub fn new(pages_dir: impl Into<PathBuf>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            case_insensitive: false,
        }
    }

    /// Configures case-insensitive matching for every catalog this loader builds
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn from_config(routing: &RoutingConfig) -> Self {
        Self::new(&routing.pages_dir).with_case_insensitive(routing.case_insensitive)
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Walks the page root and builds a fresh catalog
    ///
    /// A missing page root yields an empty catalog.
    pub fn load(&self) -> Result<LoadedPages, CatalogError> {
        if !self.pages_dir.exists() {
            warn!(pages_dir = ?self.pages_dir, "pages directory does not exist");
            return Ok(LoadedPages::default());
        }

        let layouts = self.load_layouts()?;
        let mut builder = CatalogBuilder::new().case_insensitive(self.case_insensitive);

        let walker = WalkDir::new(&self.pages_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry.map_err(|source| CatalogError::Walk {
                path: self.pages_dir.clone(),
                source,
            })?;

            if !entry.file_type().is_file() || !is_index(entry.path()) {
                continue;
            }

            let route = self.load_route(entry.path())?;
            if let Some(LayoutChoice::Named(name)) = &route.layout {
                if !layouts.contains(&LayoutId::new(name.as_str())) {
                    warn!(template = %route.template, layout = %name, "page declares an unknown layout");
                }
            }

            debug!(pattern = %route.pattern_string(), template = %route.template, "discovered page");
            builder.add(route);
        }

        let catalog = builder.build()?;
        info!(routes = catalog.len(), layouts = layouts.len(), "page catalog built");

        Ok(LoadedPages { catalog, layouts })
    }

    /// Parse one index template into a route
    fn load_route(&self, path: &Path) -> Result<Route, CatalogError> {
        let source = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let (front, _) = front_matter::split(&source).map_err(|source| CatalogError::FrontMatter {
            path: path.to_path_buf(),
            source,
        })?;

        let route = Route::from_path(&to_slash(path), &to_slash(&self.pages_dir))?;
        let route = match front.layout_choice() {
            Some(choice) => route.with_layout(choice),
            None => route,
        };

        Ok(match front.title {
            Some(title) => route.with_title(title),
            None => route,
        })
    }

    /// Collect layout ids from `_layouts/`
    fn load_layouts(&self) -> Result<BTreeSet<LayoutId>, CatalogError> {
        let dir = self.pages_dir.join(LAYOUTS_DIR);
        if !dir.exists() {
            return Ok(BTreeSet::new());
        }

        let entries = fs::read_dir(&dir).map_err(|source| CatalogError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut layouts = BTreeSet::new();
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if !stem.starts_with('.') {
                    layouts.insert(LayoutId::new(stem));
                }
            }
        }

        Ok(layouts)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map_or(true, |name| name.starts_with('_') || name.starts_with('.'))
}

fn is_index(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        == Some(INDEX_STEM)
}

fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
