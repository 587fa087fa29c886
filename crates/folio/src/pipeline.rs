// File: src/pipeline.rs
// Purpose: Request flow from raw path to rendered response

use crate::config::Config;
use crate::csrf::{CookieCsrf, CsrfProvider};
use crate::diagnostics::{DiagnosticsSink, RenderFailure, TracingDiagnostics};
use crate::engine::{FileTemplates, TemplateEngine};
use crate::request_context::RenderContext;
use crate::response::{
    fallback_not_found_document, internal_error_document, Envelope, PageResponse,
};
use crate::store::CatalogStore;
use axum::http::StatusCode;
use folio_router::{
    normalize, select_layout, LayoutId, LayoutPolicy, LayoutSpec, PageCatalog, Route, RouteMatch,
    CONTENT_SLOT,
};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// Which render of the request this is
///
/// A request gets one page render and, when nothing matched, one render of
/// the not-found page. The not-found attempt never falls back again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Page,
    NotFound,
}

impl Attempt {
    fn status(self) -> StatusCode {
        match self {
            Attempt::Page => StatusCode::OK,
            Attempt::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

/// An error or panic caught at the render boundary
struct Caught {
    message: String,
    panicked: bool,
}

/// Turns resolved matches into responses
///
/// Shared by every request; all per-request state lives in the
/// [`RenderContext`] and the catalog snapshot taken at the start.
#[derive(Clone)]
pub struct RenderPipeline {
    store: Arc<CatalogStore>,
    engine: Arc<dyn TemplateEngine>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    csrf: Option<Arc<dyn CsrfProvider>>,
    policy: LayoutPolicy,
    not_found_path: String,
}

impl RenderPipeline {
    pub fn new(store: Arc<CatalogStore>, engine: Arc<dyn TemplateEngine>) -> Self {
        Self {
            store,
            engine,
            diagnostics: Arc::new(TracingDiagnostics),
            csrf: None,
            policy: LayoutPolicy::new("default"),
            not_found_path: "/404".to_string(),
        }
    }

    /// File-backed engine, cookie CSRF and layout defaults from `config`
    pub fn from_config(config: &Config, store: Arc<CatalogStore>) -> Self {
        Self::new(store, Arc::new(FileTemplates::from_config(config)))
            .with_csrf(Arc::new(CookieCsrf::default()))
            .with_policy(config.routing.layout_policy())
            .with_not_found_path(config.routing.not_found_path.as_str())
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_csrf(mut self, csrf: Arc<dyn CsrfProvider>) -> Self {
        self.csrf = Some(csrf);
        self
    }

    pub fn with_policy(mut self, policy: LayoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_not_found_path(mut self, path: impl Into<String>) -> Self {
        self.not_found_path = path.into();
        self
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn policy(&self) -> &LayoutPolicy {
        &self.policy
    }

    /// Normalize, resolve, select a layout and render
    ///
    /// Invalid paths are treated like unmatched ones. The whole request is
    /// served from a single catalog snapshot.
    pub fn handle(&self, raw_path: &str, ctx: RenderContext) -> PageResponse {
        let snapshot = self.store.snapshot();
        let (ctx, cookie) = self.attach_csrf(ctx);

        let route_match = match normalize(raw_path) {
            Ok(path) => snapshot.catalog().resolve(&path),
            Err(e) => {
                debug!(path = raw_path, error = %e, "rejected request path");
                RouteMatch::not_found()
            }
        };
        if !route_match.is_found() {
            debug!(path = raw_path, "no page matched");
        }

        let layout = select_layout(&route_match, None, &self.policy);
        let response = self
            .render_in(snapshot.catalog(), &route_match, layout, &ctx)
            .with_catalog_version(snapshot.version());

        match cookie {
            Some(cookie) => response.with_cookie(cookie),
            None => response,
        }
    }

    /// Renders a resolved match with the given layout
    ///
    /// A `NotFound` match renders the configured not-found page instead.
    pub fn render(
        &self,
        route_match: &RouteMatch,
        layout: LayoutSpec,
        ctx: &RenderContext,
    ) -> PageResponse {
        let snapshot = self.store.snapshot();
        self.render_in(snapshot.catalog(), route_match, layout, ctx)
            .with_catalog_version(snapshot.version())
    }

    fn render_in(
        &self,
        catalog: &PageCatalog,
        route_match: &RouteMatch,
        layout: LayoutSpec,
        ctx: &RenderContext,
    ) -> PageResponse {
        match route_match.route() {
            Some(route) => self.render_page(route, route_match.params(), layout, ctx, Attempt::Page),
            None => self.render_not_found(catalog, layout, ctx),
        }
    }

    /// Resolves the not-found path once and renders what it finds
    fn render_not_found(
        &self,
        catalog: &PageCatalog,
        layout: LayoutSpec,
        ctx: &RenderContext,
    ) -> PageResponse {
        let page = normalize(&self.not_found_path)
            .map(|path| catalog.resolve(&path))
            .unwrap_or_else(|_| RouteMatch::not_found());

        let Some(route) = page.route() else {
            debug!(not_found_path = %self.not_found_path, "no not-found page, using fallback");
            return fallback_not_found(ctx);
        };

        // A layout declared by the not-found page itself wins over the policy
        let layout = match &route.layout {
            Some(choice) => select_layout(&page, Some(choice), &self.policy),
            None => layout,
        };
        self.render_page(route, page.params(), layout, ctx, Attempt::NotFound)
    }

    fn render_page(
        &self,
        route: &Route,
        params: &HashMap<String, String>,
        mut layout: LayoutSpec,
        ctx: &RenderContext,
        attempt: Attempt,
    ) -> PageResponse {
        let output = match guard(|| self.engine.execute(&route.template, params, ctx)) {
            Ok(output) => output,
            Err(caught) => return self.fail(route, None, ctx, caught),
        };

        let status = attempt.status();
        let title = output.title.or_else(|| route.title.clone());

        if ctx.is_partial() {
            let envelope = Envelope {
                ok: status.is_success(),
                title,
                redirect: output.redirect,
                html: output.html,
            };
            return PageResponse::fragment(status, envelope);
        }

        if let Some(location) = output.redirect {
            return PageResponse::see_other(location);
        }

        if layout.is_standalone() {
            return PageResponse::document(status, output.html);
        }

        for (slot, html) in output.slots {
            layout.fill(slot, html);
        }
        layout.fill(CONTENT_SLOT, output.html);

        match guard(|| self.engine.render_layout(&layout, title.as_deref(), ctx)) {
            Ok(html) => PageResponse::document(status, html),
            Err(caught) => self.fail(route, layout.id().cloned(), ctx, caught),
        }
    }

    /// Reports the failure once and answers with a generic 500
    fn fail(
        &self,
        route: &Route,
        layout: Option<LayoutId>,
        ctx: &RenderContext,
        caught: Caught,
    ) -> PageResponse {
        self.diagnostics.report(&RenderFailure {
            template: route.template.clone(),
            layout,
            path: ctx.path.clone(),
            mode: ctx.mode,
            message: caught.message,
            panicked: caught.panicked,
        });

        if ctx.is_partial() {
            PageResponse::fragment(StatusCode::INTERNAL_SERVER_ERROR, Envelope::default())
        } else {
            PageResponse::document(StatusCode::INTERNAL_SERVER_ERROR, internal_error_document())
        }
    }

    fn attach_csrf(&self, mut ctx: RenderContext) -> (RenderContext, Option<String>) {
        let Some(csrf) = &self.csrf else {
            return (ctx, None);
        };
        let token = csrf.token(&ctx);
        let cookie = csrf.set_cookie(&token);
        ctx.csrf_token = Some(token.value);
        (ctx, cookie)
    }
}

fn fallback_not_found(ctx: &RenderContext) -> PageResponse {
    if ctx.is_partial() {
        let envelope = Envelope {
            ok: false,
            title: Some("Not found".to_string()),
            redirect: None,
            html: maud::html! { h1 { "Page not found" } }.into_string(),
        };
        PageResponse::fragment(StatusCode::NOT_FOUND, envelope)
    } else {
        PageResponse::document(StatusCode::NOT_FOUND, fallback_not_found_document())
    }
}

fn guard<T>(render: impl FnOnce() -> anyhow::Result<T>) -> Result<T, Caught> {
    match panic::catch_unwind(AssertUnwindSafe(render)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Caught {
            message: format!("{:#}", e),
            panicked: false,
        }),
        Err(payload) => Err(Caught {
            message: panic_message(payload.as_ref()),
            panicked: true,
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
