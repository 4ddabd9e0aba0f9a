//! HTTP API for the document assistant

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::assistant::TemplateAssistant;
use crate::runtime::RuntimeManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeManager>,
    /// Serves `POST /api/assistant` and the template catalog
    pub assistant: Arc<TemplateAssistant>,
}

impl AppState {
    pub fn new(runtime: Arc<RuntimeManager>, assistant: Arc<TemplateAssistant>) -> Self {
        Self { runtime, assistant }
    }
}
