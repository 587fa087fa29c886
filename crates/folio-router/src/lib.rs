//! # Folio Router
//!
//! File-system-based route resolution for Folio:
//! - Static routes (`pages/about/index.html` → `/about`)
//! - Dynamic segments (`pages/blog/[slug]/index.html` → `/blog/:slug`)
//! - Not-found resolution as a value, never an error
//! - Layout selection (default, standalone, named)
//!
//! ## Path Normalization
//!
//! Handles all common user mistakes gracefully and rejects escapes:
//! - Trailing slashes: `/path/` → `/path`
//! - Double slashes: `/path//to` → `/path/to`
//! - Dot segments: `/a/../b` → `/b`
//! - Escapes: `/../secret` → `InvalidPath`
//!
//! ## Precedence
//!
//! Static directories beat `[param]` directories at every depth. Two
//! parameters with different names at the same position are rejected when
//! the catalog is built, so resolution never has to guess.
//!
//! ## Example
//!
//! ```
//! use folio_router::{normalize, CatalogBuilder, MatchKind, Route};
//!
//! let catalog = CatalogBuilder::new()
//!     .route(Route::from_path("pages/about/index.html", "pages").unwrap())
//!     .route(Route::from_path("pages/users/[id]/index.html", "pages").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let route_match = catalog.resolve(&normalize("/users/123/").unwrap());
//! assert_eq!(route_match.kind(), MatchKind::Dynamic);
//! assert_eq!(route_match.param("id"), Some("123"));
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

mod catalog;
mod error;
mod layout;
pub mod path;
pub mod route;

pub use catalog::{CatalogBuilder, MatchKind, PageCatalog, RouteMatch};
pub use error::RouteError;
pub use layout::{select_layout, LayoutChoice, LayoutId, LayoutPolicy, LayoutSpec, CONTENT_SLOT};
pub use path::{normalize, RoutePath};
pub use route::pattern::{classify_segment, PatternSegment};
pub use route::{Route, TemplateId, INDEX_STEM};
