//! HTTP API server for the intake gate

use crate::error::GateError;
use crate::gate::IntakeGate;
use crate::types::{Redemption, SubmitRequest, SubmitResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server address
    pub addr: SocketAddr,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 3000).into(),
        }
    }
}

/// API server state
#[derive(Clone)]
struct AppState {
    gate: Arc<IntakeGate>,
    instance_id: String,
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    gate: Arc<IntakeGate>,
    instance_id: String,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, gate: Arc<IntakeGate>) -> Self {
        let instance_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        Self {
            config,
            gate,
            instance_id,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Router with every endpoint, without binding a socket
    pub fn router(&self) -> Router {
        Self::build_router(AppState {
            gate: self.gate.clone(),
            instance_id: self.instance_id.clone(),
        })
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/submit", post(submit_handler))
            .route("/summary", get(summary_handler))
            .route("/report", get(report_handler))
            .route("/redeem", post(redeem_handler))
            // Health check
            .route("/health", get(health_handler))
            .with_state(state)
            // Middleware
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until Ctrl-C
    pub async fn serve(self) -> anyhow::Result<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(self.config.addr).await?;
        info!(
            "API server [{}] listening on http://{}",
            self.instance_id, self.config.addr
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("API server [{}] stopped", self.instance_id);
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Gate error rendered as an HTTP response
struct ApiError(GateError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            GateError::Validation(_) | GateError::InvalidCode(_) => StatusCode::BAD_REQUEST,
            GateError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GateError::UnknownCode(_) => StatusCode::NOT_FOUND,
            GateError::AlreadyRedeemed(_) => StatusCode::CONFLICT,
            GateError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> (StatusCode, Json<SubmitResponse>) {
    let user_id = request.user_id.trim().to_string();
    let now = Utc::now();
    match state.gate.submit_at(request, now).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            let response = state.gate.rejection(&user_id, &e, now).await;
            (ApiError(e).status(), Json(response))
        }
    }
}

async fn summary_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.gate.summary().await)
}

async fn report_handler(State(state): State<AppState>) -> String {
    state.gate.report().await
}

#[derive(Debug, Deserialize)]
struct RedeemRequest {
    code: String,
    vendor_id: String,
}

async fn redeem_handler(
    State(state): State<AppState>,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<Redemption>, ApiError> {
    state
        .gate
        .redeem(&request.code, &request.vendor_id)
        .await
        .map(Json)
        .map_err(ApiError)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    instance_id: String,
    event: String,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_id: state.instance_id.clone(),
        event: state.gate.config().event.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let status = |e| ApiError(e).status();
        assert_eq!(
            status(GateError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(GateError::AlreadyRedeemed("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(GateError::UnknownCode("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(GateError::Persistence("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
