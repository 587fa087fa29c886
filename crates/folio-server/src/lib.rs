// Folio server - HTTP front for the render pipeline
// Every request goes through one fallback handler; routing is the catalog's job.

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Router,
};
use folio::response::internal_error_document;
use folio::{PartialDetection, RenderContext, RenderPipeline};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<RenderPipeline>,
    detection: Arc<PartialDetection>,
}

/// Builds the router serving every path from `pipeline`
pub fn app(pipeline: RenderPipeline, detection: PartialDetection) -> Router {
    let state = AppState {
        pipeline: Arc::new(pipeline),
        detection: Arc::new(detection),
    };

    Router::new()
        .fallback(page_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn page_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let ctx = RenderContext::from_parts(&method, &uri, &headers, &state.detection);
    let raw_path = uri.path().to_string();
    let pipeline = state.pipeline.clone();

    // Templates do blocking file I/O
    match tokio::task::spawn_blocking(move || pipeline.handle(&raw_path, ctx)).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            error!(error = %e, path = %uri.path(), "render task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(internal_error_document()),
            )
                .into_response()
        }
    }
}
