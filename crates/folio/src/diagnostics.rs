// File: src/diagnostics.rs
// Purpose: Where render failures are reported

use crate::request_context::RenderMode;
use folio_router::{LayoutId, TemplateId};
use std::sync::{Mutex, PoisonError};

/// Full detail of a failed render, never shown to the client
#[derive(Debug, Clone)]
pub struct RenderFailure {
    /// Page being rendered
    pub template: TemplateId,
    /// Set when the layout failed rather than the page
    pub layout: Option<LayoutId>,
    pub path: String,
    pub mode: RenderMode,
    /// Error chain, or the panic message
    pub message: String,
    pub panicked: bool,
}

/// Receives render failures
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, failure: &RenderFailure);
}

/// Logs failures through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&self, failure: &RenderFailure) {
        tracing::error!(
            template = %failure.template,
            layout = ?failure.layout.as_ref().map(LayoutId::as_str),
            path = %failure.path,
            mode = ?failure.mode,
            panicked = failure.panicked,
            error = %failure.message,
            "page render failed"
        );
    }
}

/// Keeps failures in memory, for dev tooling and tests
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<RenderFailure>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<RenderFailure> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticsSink for MemoryDiagnostics {
    fn report(&self, failure: &RenderFailure) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure.clone());
    }
}
