/// Request path normalization
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use std::fmt;
use std::str::FromStr;

use crate::RouteError;

/// Canonical form of a request path
///
/// An ordered list of percent-decoded segments. The root path is the empty
/// list and displays as `/`. A `RoutePath` never holds empty, `.` or `..`
/// segments, so two requests that name the same page always compare equal.
///
/// # Examples
///
/// ```
/// use folio_router::RoutePath;
///
/// let path: RoutePath = "/blog//hello%20world/".parse().unwrap();
/// assert_eq!(path.segments(), ["blog", "hello world"]);
/// assert_eq!(path.to_string(), "/blog/hello world");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RoutePath {
    segments: Vec<String>,
}

impl RoutePath {
    /// The root path `/`
    pub fn root() -> Self {
        Self::default()
    }

    /// Decoded segments, outermost first
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for RoutePath {
    type Err = RouteError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        normalize(raw)
    }
}

/// Normalize a raw request path into a [`RoutePath`]
///
/// # Handles All User Mistakes
///
/// - Trailing slashes: `/path/` → `/path`
/// - Double slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
/// - Dot segments: `/a/./b/../c` → `/a/c`
/// - Query and fragment: `/path?x=1#top` → `/path`
///
/// Segments are percent-decoded one at a time, so an encoded dot segment
/// (`%2e%2e`) is resolved like a literal one.
///
/// # Errors
///
/// Returns [`RouteError::InvalidPath`] when a segment decodes to invalid
/// UTF-8, when a decoded segment smuggles a separator or NUL byte, or when
/// `..` would climb above the root.
///
/// # Examples
///
/// ```
/// use folio_router::normalize;
///
/// assert_eq!(normalize("/a/../b").unwrap(), normalize("/b").unwrap());
/// assert_eq!(normalize("/a//b/").unwrap(), normalize("/a/b").unwrap());
/// assert!(normalize("/../etc/passwd").is_err());
/// ```
pub fn normalize(raw: &str) -> Result<RoutePath, RouteError> {
    let path = raw.split(['?', '#']).next().unwrap_or_default();
    let mut segments: Vec<String> = Vec::new();

    for part in path.split(['/', '\\']).filter(|s| !s.is_empty()) {
        let decoded = urlencoding::decode(part)
            .map_err(|_| RouteError::invalid_path("segment is not valid UTF-8 once decoded"))?;

        if decoded.contains(['/', '\\', '\0']) {
            return Err(RouteError::invalid_path("segment decodes to a separator"));
        }

        match decoded.as_ref() {
            "." => {}
            ".." => {
                segments
                    .pop()
                    .ok_or_else(|| RouteError::invalid_path("path escapes the page root"))?;
            }
            _ => segments.push(decoded.into_owned()),
        }
    }

    Ok(RoutePath { segments })
}
