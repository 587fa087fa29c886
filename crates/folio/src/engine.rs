// File: src/engine.rs
// Purpose: Template engine seam and the file-backed default engine

use crate::config::Config;
use crate::front_matter;
use crate::page_loader::LAYOUTS_DIR;
use crate::renderer::Renderer;
use crate::request_context::RenderContext;
use anyhow::{anyhow, Context, Result};
use folio_router::{LayoutId, LayoutSpec, TemplateId};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// What executing a page template produces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOutput {
    /// Rendered body, fills the `content` slot
    pub html: String,
    pub title: Option<String>,
    /// Where to send the client instead of showing the body
    pub redirect: Option<String>,
    /// Extra layout slots (`scripts`, `head`, ...)
    pub slots: BTreeMap<String, String>,
}

impl PageOutput {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_redirect(mut self, location: impl Into<String>) -> Self {
        self.redirect = Some(location.into());
        self
    }

    pub fn with_slot(mut self, slot: impl Into<String>, html: impl Into<String>) -> Self {
        self.slots.insert(slot.into(), html.into());
        self
    }
}

/// Executes page templates and renders layouts
///
/// Implementations are shared across requests and must not keep per-request
/// state. Errors (and panics) are turned into a generic 500 by the pipeline.
pub trait TemplateEngine: Send + Sync {
    fn execute(
        &self,
        template: &TemplateId,
        params: &HashMap<String, String>,
        ctx: &RenderContext,
    ) -> Result<PageOutput>;

    /// Renders `layout` with its slots filled
    ///
    /// Never called for standalone specs.
    fn render_layout(
        &self,
        layout: &LayoutSpec,
        title: Option<&str>,
        ctx: &RenderContext,
    ) -> Result<String>;
}

/// Reads templates from the page root on every render
///
/// Edits to an existing template show up without a catalog rebuild.
#[derive(Debug, Clone)]
pub struct FileTemplates {
    pages_dir: PathBuf,
    app: BTreeMap<String, String>,
}

impl FileTemplates {
    pub fn new(pages_dir: impl Into<PathBuf>) -> Self {
        Self {
            pages_dir: pages_dir.into(),
            app: BTreeMap::new(),
        }
    }

    /// Values exposed as `{config.<key>}`
    pub fn with_app(mut self, app: BTreeMap<String, String>) -> Self {
        self.app = app;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.routing.pages_dir).with_app(config.app.clone())
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    fn scope(
        &self,
        ctx: &RenderContext,
        params: &HashMap<String, String>,
        title: Option<&str>,
    ) -> Renderer {
        Renderer::new()
            .with_var("params", string_map(params.iter()))
            .with_var("query", string_map(ctx.query.as_map().iter()))
            .with_var("config", string_map(self.app.iter()))
            .with_var("method", ctx.method.as_str())
            .with_var("path", ctx.path.as_str())
            .with_var("csrf_token", ctx.csrf_token.clone().unwrap_or_default())
            .with_var("title", title.unwrap_or_default())
    }

    /// Finds `_layouts/<id>.<ext>` by scanning the directory
    fn layout_path(&self, id: &LayoutId) -> Result<PathBuf> {
        let dir = self.pages_dir.join(LAYOUTS_DIR);
        let entries =
            fs::read_dir(&dir).with_context(|| format!("failed to read layouts in {:?}", dir))?;

        for entry in entries {
            let path = entry?.path();
            let stem = path.file_stem().and_then(|s| s.to_str());
            if path.is_file() && stem == Some(id.as_str()) {
                return Ok(path);
            }
        }

        Err(anyhow!("layout `{}` not found in {:?}", id, dir))
    }
}

impl TemplateEngine for FileTemplates {
    fn execute(
        &self,
        template: &TemplateId,
        params: &HashMap<String, String>,
        ctx: &RenderContext,
    ) -> Result<PageOutput> {
        let path = self.pages_dir.join(template.as_str());
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read template {:?}", path))?;
        let (front, body) = front_matter::split(&source)
            .with_context(|| format!("invalid front matter in {:?}", path))?;

        let renderer = self.scope(ctx, params, front.title.as_deref());
        let slots = front
            .slots
            .iter()
            .map(|(name, html)| (name.clone(), renderer.render(html)))
            .collect();

        Ok(PageOutput {
            html: renderer.render(body),
            title: front.title,
            redirect: front.redirect,
            slots,
        })
    }

    fn render_layout(
        &self,
        layout: &LayoutSpec,
        title: Option<&str>,
        ctx: &RenderContext,
    ) -> Result<String> {
        let Some(id) = layout.id() else {
            return Ok(layout.content().to_string());
        };

        let path = self.layout_path(id)?;
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read layout {:?}", path))?;
        let (_, body) = front_matter::split(&source)
            .with_context(|| format!("invalid front matter in {:?}", path))?;

        Ok(self
            .scope(ctx, &HashMap::new(), title)
            .render_with_slots(body, layout.slots()))
    }
}

fn string_map<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> Value {
    Value::Object(
        entries
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<String, Value>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_execute_interpolates_scope() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "blog/[slug]/index.html",
            "+++\ntitle = \"Post\"\n[slots]\nscripts = \"<script src='/{params.slug}.js'></script>\"\n+++\n<h1>{params.slug}</h1><p>{query.q} {config.site}</p>",
        );

        let mut app = BTreeMap::new();
        app.insert("site".to_string(), "Folio".to_string());
        let engine = FileTemplates::new(dir.path()).with_app(app);

        let mut params = HashMap::new();
        params.insert("slug".to_string(), "hello".to_string());
        let ctx = RenderContext::new(Method::GET, "/blog/hello")
            .with_query(crate::request_context::QueryParams::parse("q=a%3Cb"));

        let output = engine
            .execute(&TemplateId::new("blog/[slug]/index.html"), &params, &ctx)
            .unwrap();

        assert_eq!(output.html, "<h1>hello</h1><p>a&lt;b Folio</p>");
        assert_eq!(output.title.as_deref(), Some("Post"));
        assert_eq!(
            output.slots.get("scripts").map(String::as_str),
            Some("<script src='/hello.js'></script>")
        );
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileTemplates::new(dir.path());
        let ctx = RenderContext::new(Method::GET, "/");
        assert!(engine
            .execute(&TemplateId::new("index.html"), &HashMap::new(), &ctx)
            .is_err());
    }

    #[test]
    fn test_render_layout_fills_slots() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_layouts/default.html",
            "<html><head><title>{title}</title></head><body>{slots.content}{slots.scripts}</body></html>",
        );

        let engine = FileTemplates::new(dir.path());
        let spec = LayoutSpec::new(LayoutId::new("default")).with_slot("content", "<p>{title}</p>");
        let html = engine
            .render_layout(&spec, Some("Home"), &RenderContext::new(Method::GET, "/"))
            .unwrap();

        assert_eq!(
            html,
            "<html><head><title>Home</title></head><body><p>{title}</p></body></html>"
        );
    }

    #[test]
    fn test_query_spelling_a_slot_is_not_expanded() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "_layouts/default.html",
            "<html><head><title>{query.q}</title></head><body>{slots.content}</body></html>",
        );

        let engine = FileTemplates::new(dir.path());
        let spec = LayoutSpec::new(LayoutId::new("default")).with_slot("content", "<h1>About</h1>");
        let ctx = RenderContext::new(Method::GET, "/about")
            .with_query(crate::request_context::QueryParams::parse("q=%7Bslots.content%7D"));
        let html = engine.render_layout(&spec, None, &ctx).unwrap();

        assert_eq!(
            html,
            "<html><head><title>{slots.content}</title></head><body><h1>About</h1></body></html>"
        );
    }

    #[test]
    fn test_unknown_layout_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "_layouts/default.html", "{slots.content}");
        let engine = FileTemplates::new(dir.path());
        let spec = LayoutSpec::new(LayoutId::new("admin"));
        assert!(engine
            .render_layout(&spec, None, &RenderContext::new(Method::GET, "/"))
            .is_err());
    }
}
