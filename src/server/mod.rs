//! HTTP surface: `POST /predict` plus read-only status endpoints.
//!
//! All handlers share one immutable [`ServingContext`] behind an `Arc`; nothing is
//! locked on the request path.

use crate::config::ServerConfig;
use crate::core::pipeline::{ServingContext, Stage};
use crate::utils::error::{PredictorError, Result};
use crate::utils::validation::validate_socket_addr;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub type AppState = Arc<ServingContext>;

impl IntoResponse for PredictorError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        error_response(status, &self.user_friendly_message())
    }
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Build the router with every route and the shared context.
pub fn build_router(state: AppState, cors: bool) -> Router {
    let router = Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .route("/encoders", get(encoders_handler))
        .route("/insights", get(insights_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

pub async fn predict_handler(
    State(ctx): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            return PredictorError::InvalidJson {
                message: rejection.body_text(),
            }
            .into_response();
        }
    };

    match ctx.predict_value(body) {
        Ok(prediction) => {
            tracing::debug!(stage = %Stage::Responded, "prediction returned");
            (StatusCode::OK, Json(prediction)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn health_handler(State(ctx): State<AppState>) -> Response {
    let uptime = (chrono::Utc::now() - ctx.started_at()).num_seconds().max(0);
    let mut body = json!({
        "status": "ok",
        "model": ctx.predictor().kind(),
        "features": ctx.predictor().feature_names(),
        "started_at": ctx.started_at().to_rfc3339(),
        "uptime_secs": uptime,
        "insights": ctx.insights().is_some(),
    });
    if let Some(stats) = ctx.monitor().get_stats() {
        body["system"] = json!(stats);
    }
    (StatusCode::OK, Json(body)).into_response()
}

pub async fn encoders_handler(State(ctx): State<AppState>) -> Response {
    (StatusCode::OK, Json(ctx.registry().vocabularies())).into_response()
}

pub async fn insights_handler(State(ctx): State<AppState>) -> Response {
    match ctx.insights() {
        Some(insights) => (StatusCode::OK, Json(insights)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "No sales data configured"),
    }
}

/// 綁定埠並服務，直到收到中斷信號
pub async fn serve(context: ServingContext, config: &ServerConfig) -> Result<()> {
    let addr = validate_socket_addr("server.listen", &config.server.listen)?;
    let app = build_router(Arc::new(context), config.server.cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let client = PredictorError::MinorMarried { age: 16.0 }.into_response();
        assert_eq!(client.status(), StatusCode::BAD_REQUEST);

        let internal: PredictorError = crate::utils::error::ModelError::ShapeMismatch {
            expected: 7,
            got: 3,
        }
        .into();
        assert_eq!(
            internal.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
