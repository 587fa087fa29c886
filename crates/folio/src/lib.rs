// Folio - file-routed server rendering
// Pages come from a directory tree; every request is answered either with a
// complete document or with a content fragment for client-side navigation.

pub mod config;
pub mod csrf;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod front_matter;
pub mod page_loader;
pub mod pipeline;
pub mod renderer;
pub mod request_context;
pub mod response;
pub mod store;
pub mod watcher;

// Re-export framework types
pub use config::Config;
pub use csrf::{CookieCsrf, CsrfProvider, CsrfToken};
pub use diagnostics::{DiagnosticsSink, MemoryDiagnostics, RenderFailure, TracingDiagnostics};
pub use engine::{FileTemplates, PageOutput, TemplateEngine};
pub use error::CatalogError;
pub use page_loader::{LoadedPages, PageLoader};
pub use pipeline::RenderPipeline;
pub use renderer::Renderer;
pub use request_context::{PartialDetection, QueryParams, RenderContext, RenderMode};
pub use response::{Envelope, PageBody, PageResponse, CATALOG_VERSION_HEADER};
pub use store::{CatalogSnapshot, CatalogStore};
pub use watcher::{CatalogEvent, CatalogWatcher};

// Re-export the router and commonly used dependencies
pub use axum;
pub use axum::http::StatusCode;
pub use folio_router as router;
