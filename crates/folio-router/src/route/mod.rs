/// Route module for file-based routing
///
/// A [`Route`] is one `index` template of the page tree together with the
/// pattern its directory path spells out.

pub mod pattern;

use std::collections::HashMap;
use std::fmt;

use crate::layout::LayoutChoice;
use crate::RouteError;
pub use pattern::{classify_segment, PatternSegment};

/// File stem every routable template carries
pub const INDEX_STEM: &str = "index";

/// Opaque identifier of a page template
///
/// For catalogs built from disk this is the index file path relative to the
/// page root, e.g. `blog/[slug]/index.html`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A routable page: its pattern, its template and what the template declares
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Pattern segments, outermost first (empty for `/`)
    pub pattern: Vec<PatternSegment>,
    /// Template rendered for this route
    pub template: TemplateId,
    /// Layout the page asks for, if it declares one
    pub layout: Option<LayoutChoice>,
    /// Page title known at build time
    pub title: Option<String>,
}

impl Route {
    /// Builds a route from a pattern written with directory names
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_router::Route;
    ///
    /// let route = Route::from_pattern("/blog/[slug]", "blog/[slug]/index.html").unwrap();
    /// assert_eq!(route.pattern_string(), "/blog/:slug");
    /// assert_eq!(route.param_names().collect::<Vec<_>>(), vec!["slug"]);
    /// ```
    pub fn from_pattern(
        pattern: &str,
        template: impl Into<TemplateId>,
    ) -> Result<Self, RouteError> {
        let template = template.into();
        let pattern = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|segment| {
                classify_segment(segment).map_err(|reason| RouteError::InvalidPattern {
                    template: template.to_string(),
                    segment: segment.to_string(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Route {
            pattern,
            template,
            layout: None,
            title: None,
        })
    }

    /// Builds a route from the path of an `index` template file
    ///
    /// `pages_dir` is stripped from the front; the remaining directories form
    /// the pattern and the remaining file path becomes the template id.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_router::Route;
    ///
    /// let route = Route::from_path("pages/users/[id]/index.html", "pages").unwrap();
    /// assert_eq!(route.pattern_string(), "/users/:id");
    /// assert_eq!(route.template.as_str(), "users/[id]/index.html");
    ///
    /// let root = Route::from_path("pages/index.html", "pages").unwrap();
    /// assert_eq!(root.pattern_string(), "/");
    /// ```
    pub fn from_path(file_path: &str, pages_dir: &str) -> Result<Self, RouteError> {
        let file_path = file_path.replace('\\', "/");
        let pages_dir = pages_dir.replace('\\', "/");
        let relative = file_path
            .strip_prefix(pages_dir.trim_end_matches('/'))
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(&file_path)
            .to_string();

        let (dirs, file) = relative.rsplit_once('/').unwrap_or(("", relative.as_str()));
        let stem = file.split('.').next().unwrap_or_default();
        if stem != INDEX_STEM {
            return Err(RouteError::InvalidPattern {
                template: relative.clone(),
                segment: file.to_string(),
                reason: "only index templates are routable",
            });
        }

        Self::from_pattern(dirs, relative.as_str())
    }

    /// Declares the layout this page wants
    pub fn with_layout(mut self, layout: LayoutChoice) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// True when no segment captures a parameter
    pub fn is_static(&self) -> bool {
        !self.pattern.iter().any(PatternSegment::is_param)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.pattern.iter().filter_map(|segment| match segment {
            PatternSegment::Param(name) => Some(name.as_str()),
            PatternSegment::Static(_) => None,
        })
    }

    /// Pattern in display form: `/users/:id`
    pub fn pattern_string(&self) -> String {
        if self.pattern.is_empty() {
            return "/".to_string();
        }
        self.pattern
            .iter()
            .map(|segment| format!("/{}", segment))
            .collect()
    }

    /// Generates a concrete URL by substituting parameter values
    ///
    /// Values are percent-encoded. Returns `None` if a parameter is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_router::Route;
    /// use std::collections::HashMap;
    ///
    /// let route = Route::from_pattern("/blog/[slug]", "blog/[slug]/index.html").unwrap();
    /// let params = HashMap::from([("slug".to_string(), "hello world".to_string())]);
    /// assert_eq!(route.url_for(&params).unwrap(), "/blog/hello%20world");
    /// ```
    pub fn url_for(&self, params: &HashMap<String, String>) -> Option<String> {
        if self.pattern.is_empty() {
            return Some("/".to_string());
        }
        self.pattern
            .iter()
            .map(|segment| match segment {
                PatternSegment::Static(name) => Some(format!("/{}", urlencoding::encode(name))),
                PatternSegment::Param(name) => params
                    .get(name)
                    .map(|value| format!("/{}", urlencoding::encode(value))),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_nested_static() {
        let route = Route::from_path("pages/about/team/index.htm", "pages").unwrap();
        assert_eq!(route.pattern_string(), "/about/team");
        assert!(route.is_static());
    }

    #[test]
    fn test_from_path_windows_separators() {
        let route = Route::from_path("pages\\blog\\[slug]\\index.html", "pages").unwrap();
        assert_eq!(route.pattern_string(), "/blog/:slug");
        assert_eq!(route.template.as_str(), "blog/[slug]/index.html");
    }

    #[test]
    fn test_from_path_trailing_slash_on_pages_dir() {
        let route = Route::from_path("site/pages/docs/index.html", "site/pages/").unwrap();
        assert_eq!(route.pattern_string(), "/docs");
    }

    #[test]
    fn test_from_path_requires_index() {
        let err = Route::from_path("pages/about.html", "pages").unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
    }

    #[test]
    fn test_from_pattern_rejects_bad_param() {
        let err = Route::from_pattern("/blog/[...rest]", "x").unwrap_err();
        match err {
            RouteError::InvalidPattern { segment, .. } => assert_eq!(segment, "[...rest]"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_url_for_missing_param() {
        let route = Route::from_pattern("/users/[id]", "u").unwrap();
        assert_eq!(route.url_for(&HashMap::new()), None);
    }

    #[test]
    fn test_builders() {
        let route = Route::from_pattern("/", "index.html")
            .unwrap()
            .with_layout(LayoutChoice::None)
            .with_title("Home");
        assert_eq!(route.layout, Some(LayoutChoice::None));
        assert_eq!(route.title.as_deref(), Some("Home"));
        assert_eq!(route.pattern_string(), "/");
    }
}
