//! HTTP surface of the pre-screening chat proxy.
//!
//! Thin axum layer over the services in `prescreen-core`: each handler
//! decodes the request (including the session cookie), calls one service
//! operation, and maps the outcome to the fixed status/message pair for that
//! branch. Two deliberate quirks of the API are preserved here rather than
//! "fixed": relaying a message or deleting a session without a session cookie
//! answers 200 with a restart prompt, not a 4xx — the client treats it as a
//! signal to start over.

pub mod cookie;
pub mod error;

pub use error::{Result, ServerError};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json as AxumJson, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use prescreen_core::{
    AgentApi, AgentVariable, ApplicationForm, ApplicationSubmitter, CreateSessionRequest,
    EinsteinAgentClient, EmbedConfig, EndSessionOutcome, FlowInvoker, HttpFlowInvoker, JobBoard,
    MessageOutcome, ProxyError, SalesforceConfig, SalesforceTokenProvider, SessionManager,
    TokenProvider,
};

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

/// Configuration for the proxy server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Enable request logging
    pub enable_logging: bool,
    /// Mark session cookies Secure (on in production deployments)
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".parse().unwrap(),
            enable_cors: true,
            cors_origins: None, // Allow any origin
            enable_logging: true,
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Parse and set the bind address from a string.
    pub fn with_bind_addr_str(mut self, addr: &str) -> Result<Self> {
        self.bind_addr = addr
            .parse()
            .map_err(|e| ServerError::config_error(format!("Invalid bind address: {}", e)))?;
        Ok(self)
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Mark session cookies Secure.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

/// Shared application state holding the services and configuration.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub jobs: Arc<JobBoard>,
    pub applications: Arc<ApplicationSubmitter>,
    pub embed: EmbedConfig,
    pub config: ServerConfig,
}

impl AppState {
    /// Wire the services to the real Salesforce clients.
    pub fn from_salesforce(salesforce: SalesforceConfig, config: ServerConfig) -> Self {
        let salesforce = Arc::new(salesforce);
        let tokens: Arc<dyn TokenProvider> = Arc::new(SalesforceTokenProvider::new(&salesforce));
        let flows: Arc<dyn FlowInvoker> = Arc::new(HttpFlowInvoker::new(&salesforce));
        let agent: Arc<dyn AgentApi> = Arc::new(EinsteinAgentClient::new(&salesforce));
        Self::with_collaborators(tokens, flows, agent, salesforce, config)
    }

    /// Wire the services to arbitrary collaborators. Used by tests to run the
    /// full stack against doubles.
    pub fn with_collaborators(
        tokens: Arc<dyn TokenProvider>,
        flows: Arc<dyn FlowInvoker>,
        agent: Arc<dyn AgentApi>,
        salesforce: Arc<SalesforceConfig>,
        config: ServerConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(
                tokens.clone(),
                flows.clone(),
                agent,
                salesforce.clone(),
            )),
            jobs: Arc::new(JobBoard::new(
                tokens.clone(),
                flows.clone(),
                salesforce.clone(),
            )),
            applications: Arc::new(ApplicationSubmitter::new(tokens, flows, salesforce.clone())),
            embed: salesforce.embed.clone(),
            config,
        }
    }
}

fn status_of(err: &ProxyError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Handler for the /agent/session/create POST endpoint.
async fn create_session_handler(
    State(state): State<AppState>,
    AxumJson(request): AxumJson<CreateSessionRequest>,
) -> Response {
    log::info!(
        "Received session create request for application {}",
        request.job_application_number
    );

    match state.sessions.create_session(&request).await {
        Ok(session) => {
            let body = serde_json::to_value(&session).unwrap_or_else(|_| json!({}));
            let mut response = (StatusCode::OK, Json(body)).into_response();
            response.headers_mut().insert(
                header::SET_COOKIE,
                cookie::set_session_cookie(&session, state.config.secure_cookies),
            );
            response
        }
        Err(e) => {
            log::error!("Session creation failed: {}", e);
            (
                status_of(&e),
                Json(json!({ "message": e.public_message(), "sessionId": "" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    #[serde(default)]
    msg: String,
    #[serde(default)]
    vars: Vec<AgentVariable>,
}

/// Handler for the /agent/message POST endpoint.
async fn send_message_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    AxumJson(body): AxumJson<MessageBody>,
) -> (StatusCode, Json<Value>) {
    let handle = cookie::session_from_headers(&headers);

    match state
        .sessions
        .send_message(handle.as_ref(), &body.msg, body.vars)
        .await
    {
        Ok(MessageOutcome::Delivered(messages)) => (
            StatusCode::OK,
            Json(json!({ "message": "success", "data": messages })),
        ),
        Ok(MessageOutcome::SessionMissing) => (
            StatusCode::OK,
            Json(json!({ "message": "Invalid Session ID. Start a new session." })),
        ),
        Err(e) => {
            log::error!("Message relay failed: {}", e);
            (status_of(&e), Json(json!({ "message": e.public_message() })))
        }
    }
}

/// Handler for the /agent/session/delete DELETE endpoint.
async fn delete_session_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let handle = cookie::session_from_headers(&headers);

    match state.sessions.end_session(handle.as_ref()).await {
        Ok(EndSessionOutcome::Ended) => {
            let mut response =
                (StatusCode::OK, Json(json!({ "message": "success" }))).into_response();
            response
                .headers_mut()
                .insert(header::SET_COOKIE, cookie::clear_session_cookie());
            response
        }
        Ok(EndSessionOutcome::SessionMissing) => (
            StatusCode::OK,
            Json(json!({ "message": "Invalid Session ID" })),
        )
            .into_response(),
        Err(e) => {
            // Cookie stays untouched so the client can retry the teardown
            log::error!("Session deletion failed: {}", e);
            (status_of(&e), Json(json!({ "message": e.public_message() }))).into_response()
        }
    }
}

/// Handler for the /jobs GET endpoint.
async fn list_jobs_handler(
    State(state): State<AppState>,
) -> std::result::Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.jobs.list_jobs().await {
        Ok(jobs) => {
            log::info!("Listing {} job postings", jobs.len());
            Ok(Json(serde_json::to_value(jobs).unwrap_or_else(|_| json!([]))))
        }
        Err(e) => {
            log::error!("Job listing failed: {}", e);
            Err((status_of(&e), Json(json!({ "message": e.public_message() }))))
        }
    }
}

/// Handler for the /applications POST endpoint.
async fn submit_application_handler(
    State(state): State<AppState>,
    AxumJson(form): AxumJson<ApplicationForm>,
) -> std::result::Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.applications.submit(&form).await {
        Ok(receipt) => {
            log::info!(
                "Created job application {}",
                receipt.job_application_number
            );
            Ok(Json(
                serde_json::to_value(receipt).unwrap_or_else(|_| json!({})),
            ))
        }
        Err(e) => {
            log::error!("Application submission failed: {}", e);
            Err((
                status_of(&e),
                Json(json!({ "message": e.public_message(), "jobApplicationNumber": "" })),
            ))
        }
    }
}

/// Handler for the /embed/config GET endpoint: the fixed bootstrap object for
/// the embedded chat widget.
async fn embed_config_handler(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::to_value(&state.embed).unwrap_or_else(|_| json!({})))
}

/// The proxy HTTP server.
pub struct ProxyServer {
    state: AppState,
}

impl ProxyServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let config = self.state.config.clone();

        let mut router = Router::new()
            .route(
                "/health",
                get(|| async {
                    Json(HealthResponse {
                        status: "healthy".to_string(),
                        timestamp: chrono::Utc::now(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    })
                }),
            )
            .route("/agent/session/create", post(create_session_handler))
            .route("/agent/message", post(send_message_handler))
            .route("/agent/session/delete", delete(delete_session_handler))
            .route("/jobs", get(list_jobs_handler))
            .route("/applications", post(submit_application_handler))
            .route("/embed/config", get(embed_config_handler))
            .with_state(self.state.clone());

        if config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>,
                 next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    log::info!("Request {} {} {}", request_id, method, uri);

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    let duration = start.elapsed();

                    log::info!("Response {} completed in {:?}", request_id, duration);

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if config.enable_cors {
            let cors_layer = if let Some(ref origins) = config.cors_origins {
                let origins: std::result::Result<Vec<_>, _> =
                    origins.iter().map(|s| s.parse()).collect();
                match origins {
                    Ok(origins) => CorsLayer::new()
                        .allow_origin(origins)
                        .allow_methods(Any)
                        .allow_headers(Any),
                    Err(_) => CorsLayer::permissive(),
                }
            } else {
                CorsLayer::permissive()
            };
            router = router.layer(cors_layer);
        }

        router
    }

    /// Start the server and listen for connections.
    ///
    /// This method will block until the server is shut down.
    pub async fn serve(self) -> Result<()> {
        let bind_addr = self.state.config.bind_addr;
        let router = self.build_router();
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            ServerError::config_error(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        log::info!("prescreen server starting on {}", bind_addr);
        log::info!("Health check: http://{}/health", bind_addr);
        log::info!("Session create: http://{}/agent/session/create", bind_addr);
        log::info!("Message relay: http://{}/agent/message", bind_addr);
        log::info!("Session delete: http://{}/agent/session/delete", bind_addr);
        log::info!("Job listing: http://{}/jobs", bind_addr);
        log::info!("Applications: http://{}/applications", bind_addr);

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Start the server with graceful shutdown support.
    ///
    /// The server will shut down when the provided shutdown signal is received.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.state.config.bind_addr;
        let router = self.build_router();
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            ServerError::config_error(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        log::info!(
            "prescreen server starting on {} with graceful shutdown",
            bind_addr
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("prescreen server shut down gracefully");
        Ok(())
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}
