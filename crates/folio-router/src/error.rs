use crate::route::TemplateId;

/// Errors produced while normalizing request paths or building a catalog
///
/// `InvalidPath` is a request-time condition and callers answer it exactly
/// like a not-found resolution. The other variants only occur while a
/// catalog is being built and describe a defect in the page tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The request path could not be decoded or tried to leave the page root
    #[error("invalid path: {reason}")]
    InvalidPath { reason: &'static str },

    /// A directory name in the page tree is not a usable pattern segment
    #[error("invalid route segment `{segment}` in {template}: {reason}")]
    InvalidPattern {
        template: String,
        segment: String,
        reason: &'static str,
    },

    /// Two templates compete for the same position in the route table
    #[error("ambiguous route {pattern}: {first} conflicts with {second}")]
    AmbiguousRoute {
        pattern: String,
        first: TemplateId,
        second: TemplateId,
    },
}

impl RouteError {
    pub(crate) fn invalid_path(reason: &'static str) -> Self {
        RouteError::InvalidPath { reason }
    }
}
