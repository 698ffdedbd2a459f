//! CORS gate for participant routes.
//!
//! Runs after routing (installed with `route_layer`) so the experiment id is
//! available from the matched path. A failed lookup ends the request with a
//! bare 500 before the handler runs.

use std::collections::HashMap;

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::AppState;
use crate::store::DocumentStore;

pub(crate) async fn origin_gate<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(experiment_id) = params.get("experiment_id") else {
        tracing::error!("participant route without experiment id");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let cors = match state.origins.resolve(experiment_id).await {
        Ok(cors) => cors,
        Err(e) => {
            tracing::error!(%experiment_id, error = %e, "origin resolution failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = next.run(request).await;
    cors.apply(response.headers_mut());
    response
}

/// `OPTIONS` on participant routes; headers are added by the gate.
pub(crate) async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
