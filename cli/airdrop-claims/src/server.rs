use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::ClaimCache;
use crate::claims::ClaimRecord;
use crate::config::ServerConfig;
use crate::error::ClaimError;

const CODE_ADDRESS_MISSING: &str = "ADDRESS_MISSING";
const CODE_ADDRESS_INVALID: &str = "ADDRESS_INVALID";
const CODE_CLAIM_NOT_FOUND: &str = "CLAIM_NOT_FOUND";
const CODE_CLAIMS_UNAVAILABLE: &str = "CLAIMS_UNAVAILABLE";

#[derive(Clone)]
pub struct AppState {
    cache: Arc<ClaimCache>,
}

impl AppState {
    pub fn new(cache: Arc<ClaimCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ClaimCache {
        &self.cache
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            CODE_ADDRESS_INVALID,
            rejection.body_text(),
        )
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::InvalidAddress { .. } => {
                Self::new(StatusCode::BAD_REQUEST, CODE_ADDRESS_INVALID, err.to_string())
            }
            ClaimError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, CODE_CLAIM_NOT_FOUND, err.to_string())
            }
            // the cause is already logged; keep file paths out of responses
            ClaimError::Unavailable(_) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                CODE_CLAIMS_UNAVAILABLE,
                "claim data is not available",
            ),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    error_code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            error_code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ClaimQuery {
    address: Option<String>,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/claim", get(claim_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn claim_handler(
    State(state): State<AppState>,
    query: Result<Query<ClaimQuery>, QueryRejection>,
) -> Result<Json<ClaimRecord>, ApiError> {
    let Query(query) = query?;
    let address = query.address.ok_or_else(|| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            CODE_ADDRESS_MISSING,
            "missing required query parameter: address",
        )
    })?;
    let record = state.cache().lookup(&address).await?;
    Ok(Json(record))
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let cache = Arc::new(ClaimCache::new(config.claims_path));
    if config.preload {
        // a failed preload is retried by the first request
        if cache.get_or_load().await.is_err() {
            warn!(path = %cache.path().display(), "claim table preload failed");
        }
    }

    let app = app_router(AppState::new(cache));
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "claim API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("claim API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
