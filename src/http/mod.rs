//! HTTP surface
//!
//! ```text
//! GET|POST          /experiment
//! GET|POST|DELETE   /experiment/{experiment_id}
//! GET               /time
//! ── behind the CORS gate ─────────────────────────────────────────────
//! GET|POST          /experiment/{experiment_id}/participant
//! GET|DELETE        /experiment/{experiment_id}/participant/{participant_id}
//! POST              /experiment/{experiment_id}/participant/{participant_id}/start
//! POST              /experiment/{experiment_id}/participant/{participant_id}/stop
//! POST              /experiment/{experiment_id}/participant/{participant_id}/reopen
//! POST              /experiment/{experiment_id}/participant/{participant_id}/sink
//! ```
//!
//! Participant routes also answer `OPTIONS` for CORS preflight.

mod cors;
mod error;
mod experiments;
mod participants;

pub use experiments::ExperimentBody;
pub use participants::ParticipantView;

use std::future::Future;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::ingest::ResponseSink;
use crate::lifecycle::LifecycleManager;
use crate::origin::OriginResolver;
use crate::store::DocumentStore;
use crate::{Error, Result};

/// JSON body of status responses: `{"message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Human-readable outcome.
    pub message: String,
}

/// Shared handler state. Cheap to clone.
pub struct AppState<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    lifecycle: LifecycleManager<S>,
    sink: ResponseSink<S>,
    origins: OriginResolver<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            lifecycle: self.lifecycle.clone(),
            sink: self.sink.clone(),
            origins: self.origins.clone(),
        }
    }
}

impl<S: DocumentStore> AppState<S> {
    /// Wire the lifecycle manager, response sink and origin resolver to one
    /// store and clock.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            lifecycle: LifecycleManager::new(Arc::clone(&store), Arc::clone(&clock)),
            sink: ResponseSink::new(Arc::clone(&store)),
            origins: OriginResolver::new(Arc::clone(&store)),
            store,
            clock,
        }
    }

    /// The underlying document store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }
}

/// Decode a JSON body; an empty body decodes as `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| Error::InvalidInput(format!("request body: {e}")))
}

async fn time<S: DocumentStore + 'static>(State(state): State<AppState<S>>) -> impl IntoResponse {
    (
        [
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "GET"),
        ],
        state.clock.now_millis().to_string(),
    )
}

/// Build the application router.
pub fn router<S: DocumentStore + 'static>(state: AppState<S>, config: &ServerConfig) -> Router {
    const PARTICIPANTS: &str = "/experiment/{experiment_id}/participant";
    const PARTICIPANT: &str = "/experiment/{experiment_id}/participant/{participant_id}";

    let gated = Router::new()
        .route(
            PARTICIPANTS,
            get(participants::list::<S>)
                .post(participants::create::<S>)
                .options(cors::preflight),
        )
        .route(
            PARTICIPANT,
            get(participants::fetch::<S>)
                .delete(participants::delete::<S>)
                .options(cors::preflight),
        )
        .route(
            &format!("{PARTICIPANT}/start"),
            post(participants::start::<S>).options(cors::preflight),
        )
        .route(
            &format!("{PARTICIPANT}/stop"),
            post(participants::stop::<S>).options(cors::preflight),
        )
        .route(
            &format!("{PARTICIPANT}/reopen"),
            post(participants::reopen::<S>).options(cors::preflight),
        )
        .route(
            &format!("{PARTICIPANT}/sink"),
            post(participants::sink::<S>).options(cors::preflight),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            cors::origin_gate::<S>,
        ));

    Router::new()
        .route(
            "/experiment",
            get(experiments::list::<S>).post(experiments::create::<S>),
        )
        .route(
            "/experiment/{experiment_id}",
            get(experiments::fetch::<S>)
                .post(experiments::update::<S>)
                .delete(experiments::delete::<S>),
        )
        .route("/time", get(time::<S>))
        .merge(gated)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `router(state, config)` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns `Error::Io` if the listener fails.
pub async fn serve<S: DocumentStore + 'static>(
    listener: tokio::net::TcpListener,
    state: AppState<S>,
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, router(state, config))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_empty_is_default() {
        let body: ExperimentBody = parse_body(b"  \n").unwrap();
        assert!(body.url.is_none());
    }

    #[test]
    fn test_parse_body_rejects_garbage() {
        let err = parse_body::<ExperimentBody>(b"{not json").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_parse_body_ignores_unknown_fields() {
        let body: ExperimentBody =
            parse_body(br#"{"url": "https://example.org", "title": "Stroop"}"#).unwrap();
        assert_eq!(body.url.as_deref(), Some("https://example.org"));
    }
}
