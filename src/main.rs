//! Trustroom document assistant
//!
//! Serves deal-room conversations that walk a user through choosing a
//! document template, answering its questions and generating the draft.

mod api;
mod assistant;
mod config;
mod controller;
mod deal;
mod llm;
mod runtime;
mod session;
mod state_machine;
mod transport;

use api::{create_router, AppState};
use assistant::{Drafter, LlmDrafter, TemplateAssistant, TemplateCatalog, TemplateDrafter};
use config::{AppConfig, AssistantBackend, DealBackend};
use deal::{DealSource, RestDealSource, StaticDealSource};
use runtime::RuntimeManager;
use state_machine::{StateValidator, StrictTransitions, TrustServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use transport::{EdgeFunctionTransport, LocalTransport, LoggingTransport, Transport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trustroom_docgen=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Drafting: polish with an LLM when one is configured
    let drafter: Arc<dyn Drafter> = match config.llm.build_service()? {
        Some(llm) => {
            tracing::info!(model = %llm.model_id(), "Drafting with LLM");
            Arc::new(LlmDrafter::new(llm))
        }
        None => {
            tracing::info!("No LLM configured; drafting from templates only");
            Arc::new(TemplateDrafter)
        }
    };
    let assistant = Arc::new(TemplateAssistant::new(TemplateCatalog::builtin(), drafter));

    let inner: Arc<dyn Transport> = match &config.assistant {
        AssistantBackend::Local => Arc::new(LocalTransport::new(assistant.clone())),
        AssistantBackend::Edge {
            base_url,
            function,
            api_key,
        } => {
            let edge = EdgeFunctionTransport::new(base_url, function, api_key.clone())?;
            tracing::info!(url = %edge.url(), "Using remote assistant");
            Arc::new(edge)
        }
    };
    let transport: Arc<dyn Transport> = Arc::new(LoggingTransport::new(inner));

    let deals: Arc<dyn DealSource> = match &config.deals {
        DealBackend::Rest { base_url, api_key } => {
            Arc::new(RestDealSource::new(base_url, api_key.clone())?)
        }
        DealBackend::Static { file: Some(path) } => {
            tracing::info!(path = %path.display(), "Loading deals from file");
            Arc::new(StaticDealSource::from_file(path)?)
        }
        DealBackend::Static { file: None } => {
            tracing::warn!("No deal source configured. Set DOCGEN_REST_URL or DOCGEN_DEALS_FILE.");
            Arc::new(StaticDealSource::new())
        }
    };

    let validator: Arc<dyn StateValidator> = if config.strict_transitions {
        Arc::new(StrictTransitions)
    } else {
        Arc::new(TrustServer)
    };

    let runtime = Arc::new(
        RuntimeManager::new(transport, deals, validator, config.turn_timeout)
            .with_idle_timeout(config.session_idle),
    );
    let _sweeper = runtime.spawn_sweeper();
    tracing::info!(
        transport = runtime.transport_name(),
        strict = config.strict_transitions,
        turn_timeout_secs = ?config.turn_timeout.map(|t| t.as_secs()),
        session_idle_secs = config.session_idle.as_secs(),
        "Runtime initialized"
    );

    let state = AppState::new(runtime, assistant);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Document assistant listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
