//! Module for the `serve` subcommand: `POST /obfuscate` over HTTP.
//!
//! Every request runs its own pipeline invocation on the blocking pool. The
//! router state holds only the shared, read-only parser and reserved set, so
//! concurrent requests never see each other's keys or rename tables.

use crate::commands::ObfuscateError;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use clap::Args;
use murk_core::seed::Seed;
use murk_core::{LuaParser, ParserAdapter, ReservedSet};
use murk_transform::layers::LayerKind;
use murk_transform::obfuscator::{ObfuscationConfig, obfuscate_source};
use murk_transform::{PassConfig, build_passes};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

/// Arguments for the `serve` subcommand.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,
    /// Transforms applied to every request.
    #[arg(long, default_value = "default")]
    pub passes: String,
    /// Layers applied when a request does not name its own.
    #[arg(long, default_value = "")]
    pub layers: String,
}

/// Shared, read-only state of the HTTP front-end.
#[derive(Clone)]
pub struct AppState {
    pub passes: String,
    pub layers: Vec<LayerKind>,
    pub pass_config: PassConfig,
    pub reserved: Arc<ReservedSet>,
    pub parser: Arc<dyn ParserAdapter>,
}

impl AppState {
    pub fn new(passes: impl Into<String>, layers: Vec<LayerKind>) -> Self {
        Self {
            passes: passes.into(),
            layers,
            pass_config: PassConfig::default(),
            reserved: Arc::new(ReservedSet::lua()),
            parser: Arc::new(LuaParser::new()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ObfuscateRequest {
    #[serde(alias = "source")]
    pub code: String,
    #[serde(default)]
    pub layers: Option<Vec<LayerKind>>,
    #[serde(default)]
    pub seed: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ObfuscateResponse {
    pub success: bool,
    pub obfuscated_code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = ErrorResponse {
        error: error.to_string(),
        details,
    };
    (status, Json(body)).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/obfuscate", post(obfuscate_handler))
        .with_state(state)
}

pub async fn obfuscate_handler(
    State(state): State<AppState>,
    Json(request): Json<ObfuscateRequest>,
) -> Response {
    if request.code.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no code provided", None);
    }

    let seed = match request.seed.as_deref().map(Seed::from_hex).transpose() {
        Ok(seed) => seed.unwrap_or_else(Seed::generate),
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid seed", Some(e.to_string()));
        }
    };

    let transforms = match build_passes(&state.passes, &state.pass_config) {
        Ok(transforms) => transforms,
        Err(e) => {
            tracing::error!("bad pass list {:?}: {}", state.passes, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "obfuscation failed", None);
        }
    };

    let config = ObfuscationConfig {
        seed,
        transforms,
        layers: request.layers.unwrap_or_else(|| state.layers.clone()),
        pass_config: state.pass_config.clone(),
        reserved: Arc::clone(&state.reserved),
        parser: Arc::clone(&state.parser),
    };
    let code = request.code;
    let outcome = tokio::task::spawn_blocking(move || obfuscate_source(&code, &config)).await;

    match outcome {
        Ok(Ok(result)) => {
            tracing::info!(
                "obfuscated {} -> {} bytes",
                result.original_size,
                result.obfuscated_size
            );
            let body = ObfuscateResponse {
                success: true,
                obfuscated_code: result.obfuscated_code,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(Err(e)) if e.is_parse_error() => {
            error_response(StatusCode::BAD_REQUEST, "parse error", Some(e.to_string()))
        }
        Ok(Err(e)) => {
            tracing::error!("obfuscation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "obfuscation failed", None)
        }
        Err(e) => {
            tracing::error!("obfuscation task failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "obfuscation failed", None)
        }
    }
}

#[async_trait]
impl super::Command for ServeArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let layers = LayerKind::parse_list(&self.layers).map_err(ObfuscateError::from)?;
        // Reject a bad pass list at startup rather than on the first request.
        build_passes(&self.passes, &PassConfig::default()).map_err(ObfuscateError::from)?;

        let app = router(AppState::new(self.passes, layers));
        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| ObfuscateError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        tracing::info!("listening on http://{}", self.addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| ObfuscateError::Server(e.to_string()))?;
        Ok(())
    }
}
