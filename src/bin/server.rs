//! Rolegate REST API Server
//!
//! Run with: cargo run --features server --bin rolegate-server -- --config config/rolegate.toml
//!
//! Endpoints:
//!   GET  /health      - Liveness
//!   GET  /status      - Current snapshot version and fingerprint
//!   POST /check       - Is an action allowed on a module
//!   POST /actions     - Allowed actions on a module
//!   POST /navigation  - Resolved navigation for a role and path
//!   POST /reload      - Replace the permission configuration

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use rolegate::{logging, Error, Gate, NavItem, RawConfig, Role, Settings, SnapshotStore};

// ============================================================================
// CLI
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "rolegate-server", version, about = "Role-scoped module permission service")]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the permission configuration file
    #[arg(long)]
    permissions: Option<String>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

type AppState = Arc<Gate>;

#[derive(Debug, Deserialize)]
struct CheckRequest {
    role: String,
    module: String,
    action: String,
}

#[derive(Debug, Deserialize)]
struct ActionsRequest {
    role: String,
    module: String,
}

#[derive(Debug, Deserialize)]
struct NavigationRequest {
    role: String,
    path: String,
    #[serde(default)]
    visible_only: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct RoleSummary {
    role: Role,
    label: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    version: u64,
    fingerprint: String,
    modules: usize,
    roles: Vec<RoleSummary>,
    stored_versions: Option<Vec<u64>>,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    allowed: bool,
    version: u64,
}

#[derive(Debug, Serialize)]
struct ActionsResponse {
    actions: Vec<String>,
    deciding_module: Option<String>,
    version: u64,
}

#[derive(Debug, Serialize)]
struct NavigationResponse {
    items: Vec<NavItem>,
    version: u64,
}

#[derive(Debug, Serialize)]
struct ReloadResponse {
    version: u64,
    fingerprint: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    errors: Vec<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, e: &Error) -> ApiError {
    (status, Json(ErrorResponse { errors: e.details() }))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn status(State(gate): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let snapshot = gate.current();
    let stored_versions = match gate.store() {
        Some(store) => Some(
            store
                .versions()
                .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &Error::from(e)))?,
        ),
        None => None,
    };
    Ok(Json(StatusResponse {
        version: snapshot.version(),
        fingerprint: snapshot.fingerprint().to_string(),
        modules: snapshot.hierarchy().len(),
        roles: Role::ALL
            .into_iter()
            .map(|role| RoleSummary { role, label: role.label() })
            .collect(),
        stored_versions,
    }))
}

// Unknown roles, modules and actions resolve to denial, never to an error

async fn check(State(gate): State<AppState>, Json(req): Json<CheckRequest>) -> Json<CheckResponse> {
    let snapshot = gate.current();
    Json(CheckResponse {
        allowed: snapshot
            .resolver()
            .is_allowed_by_name(&req.role, &req.module, &req.action),
        version: snapshot.version(),
    })
}

async fn actions(State(gate): State<AppState>, Json(req): Json<ActionsRequest>) -> Json<ActionsResponse> {
    let snapshot = gate.current();
    let resolver = snapshot.resolver();
    let (actions, deciding_module) = match req.role.parse::<Role>() {
        Ok(role) => (
            resolver
                .allowed_actions(role, &req.module)
                .into_iter()
                .map(str::to_string)
                .collect(),
            resolver.deciding_module(role, &req.module).map(str::to_string),
        ),
        Err(_) => (Vec::new(), None),
    };
    Json(ActionsResponse { actions, deciding_module, version: snapshot.version() })
}

async fn navigation(State(gate): State<AppState>, Json(req): Json<NavigationRequest>) -> Json<NavigationResponse> {
    let snapshot = gate.current();
    let items = match req.role.parse::<Role>() {
        Ok(role) if req.visible_only => rolegate::project_visible_navigation(&snapshot, role, &req.path),
        Ok(role) => snapshot.project_navigation(role, &req.path),
        Err(_) => Vec::new(),
    };
    Json(NavigationResponse { items, version: snapshot.version() })
}

async fn reload(
    State(gate): State<AppState>,
    Json(raw): Json<RawConfig>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let snapshot = gate.reload(raw).map_err(|e| match e {
        Error::Store(_) => api_error(StatusCode::INTERNAL_SERVER_ERROR, &e),
        _ => api_error(StatusCode::UNPROCESSABLE_ENTITY, &e),
    })?;
    info!("reloaded permission snapshot v{}", snapshot.version());
    Ok(Json(ReloadResponse {
        version: snapshot.version(),
        fingerprint: snapshot.fingerprint().to_string(),
    }))
}

// ============================================================================
// Main
// ============================================================================

fn open_gate(settings: &Settings) -> Result<Gate, Error> {
    let raw = match RawConfig::from_json_file(&settings.permissions_file) {
        Ok(raw) => Some(raw),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };
    match &settings.store_path {
        Some(path) => Gate::with_store(raw, SnapshotStore::open(path)?),
        None => Gate::new(raw.ok_or(Error::NoSnapshot)?),
    }
}

fn fail(msg: &str, details: Vec<String>) -> ! {
    for d in details {
        error!("{}: {}", msg, d);
        eprintln!("{}: {}", msg, d);
    }
    logging::shutdown();
    std::process::exit(1)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path).unwrap_or_else(|e| fail("settings", vec![e.to_string()])),
        None => Settings::default(),
    };
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(permissions) = args.permissions {
        settings.permissions_file = permissions;
    }

    if let Err(e) = logging::init(&settings.log) {
        eprintln!("file logging disabled: {}", e);
    }

    let gate = Arc::new(open_gate(&settings).unwrap_or_else(|e| fail("startup", e.details())));
    info!("serving permission snapshot v{}", gate.version());

    // CORS for front-end consumers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/check", post(check))
        .route("/actions", post(actions))
        .route("/navigation", post(navigation))
        .route("/reload", post(reload))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(gate);

    let addr = settings.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => fail("bind", vec![e.to_string()]),
    };
    info!("rolegate server running at http://{}", addr);
    println!("rolegate server running at http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {}", e);
    }
    logging::shutdown();
}
