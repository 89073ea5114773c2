// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, ws::WebSocketUpgrade, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::chat::handle_chat_socket;
use super::handlers::{AskRequest, HealthResponse, SparqlRequest};
use super::ApiError;
use crate::rag::RagPipeline;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: String,
    pub enable_chat: bool,
    pub shutdown_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_chat: true,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Request counters exposed on `/metrics`
#[derive(Debug, Default)]
pub struct Metrics {
    pub total_requests: AtomicU64,
    pub total_errors: AtomicU64,
    pub ask_requests: AtomicU64,
    pub sparql_requests: AtomicU64,
    pub chat_messages: AtomicU64,
    pub active_chats: AtomicU64,
}

impl Metrics {
    pub fn record_request(&self, counter: &AtomicU64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.total_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render(&self) -> String {
        let counters = [
            ("kg_requests_total", "Total HTTP and chat requests", &self.total_requests),
            ("kg_errors_total", "Requests that failed", &self.total_errors),
            ("kg_ask_requests_total", "Questions answered over /ask", &self.ask_requests),
            ("kg_sparql_requests_total", "Queries generated over /sparql", &self.sparql_requests),
            ("kg_chat_messages_total", "Messages received over /chat", &self.chat_messages),
        ];

        let mut out = String::new();
        for (name, help, value) in counters {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
                value.load(Ordering::Relaxed)
            ));
        }
        out.push_str(&format!(
            "# HELP kg_active_chats Open chat sockets\n# TYPE kg_active_chats gauge\nkg_active_chats {}\n",
            self.active_chats.load(Ordering::Relaxed)
        ));
        out
    }
}

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub metrics: Arc<Metrics>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>, config: ApiConfig) -> Self {
        Self {
            pipeline,
            metrics: Arc::new(Metrics::default()),
            config,
        }
    }

    pub async fn health_check(&self) -> HealthResponse {
        let mut issues = Vec::new();

        let documents = match self.pipeline.kg_store().count().await {
            Ok(0) => {
                issues.push("Document index is empty".to_string());
                Some(0)
            }
            Ok(count) => Some(count),
            Err(e) => {
                issues.push(format!("Vector store unavailable: {}", e));
                None
            }
        };

        if !self.pipeline.llm().health_check().await {
            issues.push("Language model unreachable".to_string());
        }

        let status = if issues.is_empty() {
            "healthy"
        } else if issues.len() == 1 {
            "degraded"
        } else {
            "unhealthy"
        };

        HealthResponse {
            status: status.to_string(),
            version: crate::version::VERSION_NUMBER.to_string(),
            model: self.pipeline.llm().model_name().to_string(),
            documents,
            examples_enabled: self.pipeline.has_examples(),
            kg_attached: self.pipeline.has_triple_store(),
            issues: if issues.is_empty() {
                None
            } else {
                Some(issues)
            },
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/ask", post(ask_handler))
        .route("/sparql", post(sparql_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/version", get(version_handler));
    if state.config.enable_chat {
        router = router.route("/chat", get(chat_handler));
    }
    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ApiServer {
    state: AppState,
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    /// Bind the listen address and start serving in the background
    pub async fn new(config: ApiConfig, pipeline: Arc<RagPipeline>) -> Result<Self> {
        let addr: SocketAddr = config.listen_addr.parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_addr = listener.local_addr()?;

        let state = AppState::new(pipeline, config);
        let app = create_router(state.clone());
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let serve_future = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve_future.await {
                warn!("HTTP server stopped with error: {}", e);
            }
        });

        info!("API server listening on {}", actual_addr);
        Ok(Self {
            state,
            addr: actual_addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.state.metrics.clone()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let timeout = self.state.config.shutdown_timeout;
            if tokio::time::timeout(timeout, handle).await.is_err() {
                warn!("Server did not stop within {:?}", timeout);
            }
        }
        info!("API server stopped");
    }
}

fn error_response(state: &AppState, error: ApiError) -> Response {
    state.metrics.record_error();
    if error.status_code() >= 500 {
        warn!("Request failed: {}", error);
    }
    error.into_response()
}

fn rejection_error(rejection: JsonRejection) -> ApiError {
    ApiError::InvalidRequest(rejection.body_text())
}

async fn ask_handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Response {
    state.metrics.record_request(&state.metrics.ask_requests);
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(&state, rejection_error(rejection)),
    };
    if let Err(e) = request.validate() {
        return error_response(&state, e);
    }

    match state.pipeline.answer(&request.question).await {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(e) => error_response(&state, e.into()),
    }
}

async fn sparql_handler(
    State(state): State<AppState>,
    payload: Result<Json<SparqlRequest>, JsonRejection>,
) -> Response {
    state.metrics.record_request(&state.metrics.sparql_requests);
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return error_response(&state, rejection_error(rejection)),
    };
    if let Err(e) = request.validate() {
        return error_response(&state, e);
    }

    match state
        .pipeline
        .generate_sparql(&request.question, request.execute)
        .await
    {
        Ok(answer) => (StatusCode::OK, Json(answer)).into_response(),
        Err(e) => error_response(&state, e.into()),
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.health_check().await)
}

async fn version_handler() -> impl IntoResponse {
    Json(crate::version::get_version_info())
}

async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        state.metrics.render(),
    )
}

async fn chat_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state))
}
