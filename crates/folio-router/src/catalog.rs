/// Page catalog and route resolution
///
/// The catalog is compiled once from a list of routes and never mutated
/// afterwards. Static routes live in an exact-match table; every route also
/// lives in a segment trie that resolves dynamic patterns.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::route::{PatternSegment, Route, TemplateId};
use crate::{RouteError, RoutePath};

/// How a path was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Every segment matched a literal directory name
    Static,
    /// At least one segment was captured by a `[param]` directory
    Dynamic,
    /// No index template answers this path
    NotFound,
}

/// Result of resolving a path against a catalog
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    kind: MatchKind,
    route: Option<Arc<Route>>,
    params: HashMap<String, String>,
}

impl RouteMatch {
    pub fn not_found() -> Self {
        Self {
            kind: MatchKind::NotFound,
            route: None,
            params: HashMap::new(),
        }
    }

    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    pub fn is_found(&self) -> bool {
        self.kind != MatchKind::NotFound
    }

    /// Matched route, `None` for `NotFound`
    pub fn route(&self) -> Option<&Route> {
        self.route.as_deref()
    }

    pub fn template(&self) -> Option<&TemplateId> {
        self.route.as_ref().map(|route| &route.template)
    }

    /// Captured parameter values, percent-decoded
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Default)]
struct Node {
    statics: HashMap<String, Node>,
    param: Option<ParamEdge>,
    route: Option<Arc<Route>>,
}

#[derive(Debug)]
struct ParamEdge {
    name: String,
    /// First template that declared this parameter, for conflict reports
    declared_by: TemplateId,
    node: Box<Node>,
}

/// Builder that validates and compiles routes into a [`PageCatalog`]
///
/// # Examples
///
/// ```
/// use folio_router::{CatalogBuilder, MatchKind, Route};
///
/// let catalog = CatalogBuilder::new()
///     .route(Route::from_pattern("/about", "about/index.html").unwrap())
///     .route(Route::from_pattern("/[slug]", "[slug]/index.html").unwrap())
///     .build()
///     .unwrap();
///
/// let m = catalog.resolve(&"/about".parse().unwrap());
/// assert_eq!(m.kind(), MatchKind::Static);
///
/// let m = catalog.resolve(&"/contact".parse().unwrap());
/// assert_eq!(m.kind(), MatchKind::Dynamic);
/// assert_eq!(m.param("slug"), Some("contact"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    routes: Vec<Route>,
    case_insensitive: bool,
}

impl CatalogBuilder {
    /// Creates an empty, case-sensitive builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures case-insensitive matching of static segments
    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    pub fn routes<I>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = Route>,
    {
        self.routes.extend(routes);
        self
    }

    pub fn add(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Compiles the catalog
    ///
    /// # Errors
    ///
    /// [`RouteError::AmbiguousRoute`] when two templates declare the same
    /// pattern, or when two parameters with different names sit at the same
    /// position (`/[slug]` next to `/[id]`). Routes are inserted in template
    /// order so the reported pair does not depend on the input order.
    pub fn build(self) -> Result<PageCatalog, RouteError> {
        let case_insensitive = self.case_insensitive;
        let mut routes: Vec<Arc<Route>> = self.routes.into_iter().map(Arc::new).collect();
        routes.sort_by(|a, b| a.template.cmp(&b.template));

        let mut root = Node::default();
        let mut exact = HashMap::new();
        let mut by_template = HashMap::new();

        for route in &routes {
            insert(&mut root, route, case_insensitive)?;
            if route.is_static() {
                exact.insert(static_key(&route.pattern, case_insensitive), route.clone());
            }
            by_template.insert(route.template.clone(), route.clone());
        }

        routes.sort_by(|a, b| {
            a.pattern_string()
                .cmp(&b.pattern_string())
                .then_with(|| a.template.cmp(&b.template))
        });

        Ok(PageCatalog {
            root,
            exact,
            by_template,
            routes,
            case_insensitive,
        })
    }
}

fn fold(segment: &str, case_insensitive: bool) -> Cow<'_, str> {
    if case_insensitive {
        Cow::Owned(segment.to_ascii_lowercase())
    } else {
        Cow::Borrowed(segment)
    }
}

fn static_key(pattern: &[PatternSegment], case_insensitive: bool) -> String {
    pattern
        .iter()
        .map(|segment| match segment {
            PatternSegment::Static(name) => format!("/{}", fold(name, case_insensitive)),
            PatternSegment::Param(name) => format!("/[{}]", name),
        })
        .collect()
}

fn insert(root: &mut Node, route: &Arc<Route>, case_insensitive: bool) -> Result<(), RouteError> {
    let mut node = root;
    for (depth, segment) in route.pattern.iter().enumerate() {
        node = match segment {
            PatternSegment::Static(name) => node
                .statics
                .entry(fold(name, case_insensitive).into_owned())
                .or_default(),
            PatternSegment::Param(name) => {
                let edge = node.param.get_or_insert_with(|| ParamEdge {
                    name: name.clone(),
                    declared_by: route.template.clone(),
                    node: Box::default(),
                });
                if edge.name != *name {
                    return Err(RouteError::AmbiguousRoute {
                        pattern: display_prefix(&route.pattern[..=depth]),
                        first: edge.declared_by.clone(),
                        second: route.template.clone(),
                    });
                }
                edge.node.as_mut()
            }
        };
    }

    if let Some(existing) = &node.route {
        return Err(RouteError::AmbiguousRoute {
            pattern: route.pattern_string(),
            first: existing.template.clone(),
            second: route.template.clone(),
        });
    }
    node.route = Some(route.clone());
    Ok(())
}

fn display_prefix(pattern: &[PatternSegment]) -> String {
    pattern.iter().map(|segment| format!("/{}", segment)).collect()
}

/// Compiled, immutable route table
#[derive(Debug)]
pub struct PageCatalog {
    root: Node,
    exact: HashMap<String, Arc<Route>>,
    by_template: HashMap<TemplateId, Arc<Route>>,
    routes: Vec<Arc<Route>>,
    case_insensitive: bool,
}

impl PageCatalog {
    /// An empty catalog: everything resolves to `NotFound`
    pub fn empty() -> Self {
        Self {
            root: Node::default(),
            exact: HashMap::new(),
            by_template: HashMap::new(),
            routes: Vec::new(),
            case_insensitive: false,
        }
    }

    /// Resolves a normalized path
    ///
    /// 1. Exact match against fully static routes.
    /// 2. Trie walk that tries the literal child before the parameter child
    ///    at every depth and backtracks out of dead ends, so static beats
    ///    dynamic at each depth and longer static prefixes win.
    /// 3. A path that ends on a directory without an index template, or that
    ///    nothing matches, resolves to `NotFound`.
    pub fn resolve(&self, path: &RoutePath) -> RouteMatch {
        let segments = path.segments();
        let folded: Vec<Cow<'_, str>> = segments
            .iter()
            .map(|segment| fold(segment, self.case_insensitive))
            .collect();

        let key: String = folded.iter().map(|segment| format!("/{}", segment)).collect();
        if let Some(route) = self.exact.get(&key) {
            return RouteMatch {
                kind: MatchKind::Static,
                route: Some(route.clone()),
                params: HashMap::new(),
            };
        }

        let mut captured = Vec::new();
        match walk(&self.root, segments, &folded, &mut captured) {
            Some(route) => RouteMatch {
                kind: if route.is_static() {
                    MatchKind::Static
                } else {
                    MatchKind::Dynamic
                },
                route: Some(route.clone()),
                params: captured.into_iter().collect(),
            },
            None => RouteMatch::not_found(),
        }
    }

    /// All routes, sorted by pattern
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().map(|route| route.as_ref())
    }

    pub fn route_for(&self, template: &TemplateId) -> Option<&Route> {
        self.by_template.get(template).map(|route| route.as_ref())
    }

    /// URL of the page rendered by `template`, with `params` substituted
    pub fn url_for(&self, template: &TemplateId, params: &HashMap<String, String>) -> Option<String> {
        self.route_for(template)?.url_for(params)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl Default for PageCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

fn walk<'n>(
    node: &'n Node,
    segments: &[String],
    folded: &[Cow<'_, str>],
    captured: &mut Vec<(String, String)>,
) -> Option<&'n Arc<Route>> {
    let Some((head, rest)) = segments.split_first() else {
        return node.route.as_ref();
    };

    if let Some(child) = node.statics.get(folded[0].as_ref()) {
        if let Some(found) = walk(child, rest, &folded[1..], captured) {
            return Some(found);
        }
    }

    if let Some(edge) = &node.param {
        captured.push((edge.name.clone(), head.clone()));
        if let Some(found) = walk(&edge.node, rest, &folded[1..], captured) {
            return Some(found);
        }
        captured.pop();
    }

    None
}
