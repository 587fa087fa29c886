// File: src/error.rs
// Purpose: Errors raised while building the page catalog

use folio_router::RouteError;
use std::path::PathBuf;

/// Failure to turn a page tree into a catalog
///
/// Fatal when it happens at startup. During a dev-mode rebuild the current
/// catalog stays in service and the error is only logged.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid front matter in {path:?}: {source}")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Route(#[from] RouteError),
}
