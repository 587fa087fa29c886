/// Layout selection
///
/// Decides which layout wraps a resolved page. The selector only names the
/// layout; slots are filled later by the render pipeline.

use std::collections::BTreeMap;
use std::fmt;

use crate::{MatchKind, RouteMatch};

/// Name of the slot that receives the rendered page body
pub const CONTENT_SLOT: &str = "content";

/// Layout resolution strategy a page (or caller) can ask for
///
/// # Examples
///
/// ```
/// use folio_router::LayoutChoice;
///
/// assert_eq!(LayoutChoice::parse("none"), LayoutChoice::None);
/// assert_eq!(LayoutChoice::parse("default"), LayoutChoice::Default);
/// assert_eq!(LayoutChoice::parse("admin"), LayoutChoice::Named("admin".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LayoutChoice {
    /// Use the process-wide default layout
    #[default]
    Default,
    /// Render the page standalone
    None,
    /// Use a specific layout by id
    Named(String),
}

impl LayoutChoice {
    /// Parses the value of a `layout` declaration
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "none" => LayoutChoice::None,
            "" | "default" => LayoutChoice::Default,
            name => LayoutChoice::Named(name.to_string()),
        }
    }
}

/// Opaque identifier of a layout template
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayoutId(String);

impl LayoutId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A layout plus the named slots rendered into it
///
/// A spec without an id is standalone: the content slot is the whole output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutSpec {
    id: Option<LayoutId>,
    slots: BTreeMap<String, String>,
}

impl LayoutSpec {
    pub fn new(id: LayoutId) -> Self {
        Self {
            id: Some(id),
            slots: BTreeMap::new(),
        }
    }

    pub fn standalone() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<&LayoutId> {
        self.id.as_ref()
    }

    pub fn is_standalone(&self) -> bool {
        self.id.is_none()
    }

    /// Fills (or replaces) a named slot
    pub fn fill(&mut self, slot: impl Into<String>, html: impl Into<String>) {
        self.slots.insert(slot.into(), html.into());
    }

    pub fn with_slot(mut self, slot: impl Into<String>, html: impl Into<String>) -> Self {
        self.fill(slot, html);
        self
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }

    pub fn slots(&self) -> &BTreeMap<String, String> {
        &self.slots
    }

    /// The rendered page body, empty until filled
    pub fn content(&self) -> &str {
        self.slot(CONTENT_SLOT).unwrap_or_default()
    }
}

/// Process-wide layout defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPolicy {
    pub default_layout: LayoutId,
    /// Layout for not-found responses, falls back to the default
    pub not_found_layout: Option<LayoutId>,
}

impl LayoutPolicy {
    pub fn new(default_layout: impl Into<String>) -> Self {
        Self {
            default_layout: LayoutId::new(default_layout),
            not_found_layout: None,
        }
    }

    pub fn with_not_found_layout(mut self, layout: impl Into<String>) -> Self {
        self.not_found_layout = Some(LayoutId::new(layout));
        self
    }
}

/// Selects the layout stub for a resolved match
///
/// Precedence: explicit `override_choice`, then the layout the matched page
/// declares, then the policy default. `NotFound` matches start from the
/// policy's not-found layout instead of the default.
///
/// # Examples
///
/// ```
/// use folio_router::{select_layout, LayoutChoice, LayoutPolicy, RouteMatch};
///
/// let policy = LayoutPolicy::new("default").with_not_found_layout("bare");
/// let spec = select_layout(&RouteMatch::not_found(), None, &policy);
/// assert_eq!(spec.id().unwrap().as_str(), "bare");
///
/// let spec = select_layout(&RouteMatch::not_found(), Some(&LayoutChoice::None), &policy);
/// assert!(spec.is_standalone());
/// ```
pub fn select_layout(
    route_match: &RouteMatch,
    override_choice: Option<&LayoutChoice>,
    policy: &LayoutPolicy,
) -> LayoutSpec {
    let fallback = match route_match.kind() {
        MatchKind::NotFound => policy
            .not_found_layout
            .as_ref()
            .unwrap_or(&policy.default_layout),
        MatchKind::Static | MatchKind::Dynamic => &policy.default_layout,
    };

    let choice = override_choice.or_else(|| route_match.route().and_then(|r| r.layout.as_ref()));

    match choice {
        None | Some(LayoutChoice::Default) => LayoutSpec::new(fallback.clone()),
        Some(LayoutChoice::None) => LayoutSpec::standalone(),
        Some(LayoutChoice::Named(name)) => LayoutSpec::new(LayoutId::new(name.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogBuilder, Route, RoutePath};

    fn resolve(routes: Vec<Route>, path: &str) -> RouteMatch {
        let catalog = CatalogBuilder::new().routes(routes).build().unwrap();
        catalog.resolve(&path.parse::<RoutePath>().unwrap())
    }

    #[test]
    fn test_default_layout_for_plain_page() {
        let m = resolve(vec![Route::from_pattern("/about", "about/index.html").unwrap()], "/about");
        let spec = select_layout(&m, None, &LayoutPolicy::new("main"));
        assert_eq!(spec.id(), Some(&LayoutId::new("main")));
        assert_eq!(spec.content(), "");
    }

    #[test]
    fn test_page_declared_layout_wins_over_default() {
        let route = Route::from_pattern("/admin", "admin/index.html")
            .unwrap()
            .with_layout(LayoutChoice::Named("admin".into()));
        let m = resolve(vec![route], "/admin");
        let spec = select_layout(&m, None, &LayoutPolicy::new("main"));
        assert_eq!(spec.id(), Some(&LayoutId::new("admin")));
    }

    #[test]
    fn test_override_wins_over_page_declaration() {
        let route = Route::from_pattern("/print", "print/index.html")
            .unwrap()
            .with_layout(LayoutChoice::Named("admin".into()));
        let m = resolve(vec![route], "/print");
        let spec = select_layout(&m, Some(&LayoutChoice::None), &LayoutPolicy::new("main"));
        assert!(spec.is_standalone());
    }

    #[test]
    fn test_not_found_falls_back_to_default() {
        let spec = select_layout(&RouteMatch::not_found(), None, &LayoutPolicy::new("main"));
        assert_eq!(spec.id(), Some(&LayoutId::new("main")));
    }

    #[test]
    fn test_explicit_default_on_not_found_uses_not_found_layout() {
        let policy = LayoutPolicy::new("main").with_not_found_layout("plain");
        let spec = select_layout(&RouteMatch::not_found(), Some(&LayoutChoice::Default), &policy);
        assert_eq!(spec.id(), Some(&LayoutId::new("plain")));
    }

    #[test]
    fn test_slots() {
        let spec = LayoutSpec::new(LayoutId::new("main"))
            .with_slot(CONTENT_SLOT, "<p>hi</p>")
            .with_slot("scripts", "<script></script>");
        assert_eq!(spec.content(), "<p>hi</p>");
        assert_eq!(spec.slots().len(), 2);
    }
}
