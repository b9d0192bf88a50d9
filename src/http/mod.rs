//! HTTP surface — axum router, CORS policy and the server component.
//!
//! ## URL layout
//!
//! ```text
//! POST /predict    — classify a feature record
//! POST /recommend  — rank output categories for a token list
//! GET  /ping       — liveness probe
//! ```
//!
//! All handlers share one immutable [`AppState`], built once at startup from
//! the loaded artifacts and injected through [`axum::extract::State`].

mod api;
pub mod error;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::classifier::{Classifier, SoftmaxModel};
use crate::config::{Config, HttpConfig, RecommendConfig};
use crate::error::AppError;
use crate::graph::{self, CooccurrenceGraph};
use crate::recommend::Recommender;
use crate::runtime::{Component, ComponentFuture};

// ── Shared request state ──────────────────────────────────────────────────────

/// Artifact summary reported by the liveness probe.
#[derive(Debug, Clone, Default)]
pub struct ArtifactInfo {
    pub service_name: String,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub graph_fingerprint: String,
    pub model_fingerprint: String,
}

/// Router state injected into every handler.
///
/// Cheap to clone — shared parts are reference-counted and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Recommender,
    pub classifier: Arc<dyn Classifier>,
    pub recommend: RecommendConfig,
    pub include_probabilities: bool,
    pub request_timeout: Duration,
    pub info: Arc<ArtifactInfo>,
}

impl AppState {
    /// Assemble state from already-built collaborators.
    pub fn new(
        config: &Config,
        graph: Arc<CooccurrenceGraph>,
        classifier: Arc<dyn Classifier>,
        mut info: ArtifactInfo,
    ) -> Self {
        info.service_name = config.service_name.clone();
        info.graph_nodes = graph.node_count();
        info.graph_edges = graph.edge_count();
        Self {
            recommender: Recommender::new(graph),
            classifier,
            recommend: config.recommend.clone(),
            include_probabilities: config.classifier.include_probabilities,
            request_timeout: config.http.request_timeout,
            info: Arc::new(info),
        }
    }

    /// Load both reference artifacts named in `config`.  Any failure here is
    /// a startup error.
    pub fn load(config: &Config) -> Result<Self, AppError> {
        let loaded_graph = graph::load(&config.artifacts.graph)?;
        let loaded_model = SoftmaxModel::load(&config.artifacts.model)?;

        let info = ArtifactInfo {
            graph_fingerprint: loaded_graph.fingerprint,
            model_fingerprint: loaded_model.fingerprint,
            ..ArtifactInfo::default()
        };
        Ok(Self::new(
            config,
            Arc::new(loaded_graph.graph),
            Arc::new(loaded_model.model),
            info,
        ))
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState, http: &HttpConfig) -> Router {
    Router::new()
        .route("/predict", post(api::predict))
        .route("/recommend", post(api::recommend))
        .route("/ping", get(api::ping))
        .layer(cors_layer(http))
        .with_state(state)
}

/// Explicit origins get credentials (when enabled) and a fixed header list.
/// An empty origin list, or one containing `"*"`, allows any origin without
/// credentials.
fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    let wildcard = http.cors_origins.iter().any(|o| o.trim() == "*");
    if http.cors_origins.is_empty() || wildcard {
        if wildcard && http.cors_credentials {
            warn!("cors_origins contains \"*\"; credentials are not sent to wildcard origins");
        }
        return base.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = http
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(origin = %o, "ignoring invalid CORS origin: {e}");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(http.cors_credentials)
}

// ── HttpServer ────────────────────────────────────────────────────────────────

pub struct HttpServer {
    id: String,
    bind_addr: String,
    router: Router,
}

impl HttpServer {
    pub fn new(id: impl Into<String>, bind_addr: impl Into<String>, router: Router) -> Self {
        Self { id: id.into(), bind_addr: bind_addr.into(), router }
    }
}

impl Component for HttpServer {
    fn id(&self) -> &str {
        &self.id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(serve(self.id, self.bind_addr, self.router, shutdown))
    }
}

async fn serve(
    id: String,
    bind_addr: String,
    router: Router,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Server(format!("bind failed on {bind_addr}: {e}")))?;

    info!(component = %id, %bind_addr, "http server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Server(format!("http server error: {e}")))?;

    info!(component = %id, "http server shut down");
    Ok(())
}
