//! Experiment CRUD handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{parse_body, AppState};
use crate::experiment::ExperimentRecord;
use crate::origin::AllowedOrigin;
use crate::store::DocumentStore;
use crate::{Error, Result};

/// Writable experiment fields. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ExperimentBody {
    /// Page hosting the experiment; drives the CORS origin.
    #[serde(default)]
    pub url: Option<String>,
}

impl ExperimentBody {
    /// Reject urls the origin gate could never use.
    fn validated_url(self) -> Result<Option<String>> {
        if let Err(e) = AllowedOrigin::from_declared_url(self.url.as_deref()) {
            return Err(Error::InvalidInput(e.to_string()));
        }
        Ok(self.url)
    }
}

pub(crate) async fn list<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<ExperimentRecord>>> {
    Ok(Json(state.store.list_experiments().await?))
}

pub(crate) async fn fetch<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(experiment_id): Path<String>,
) -> Result<Json<ExperimentRecord>> {
    state
        .store
        .get_experiment(&experiment_id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::experiment_not_found(experiment_id))
}

pub(crate) async fn create<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<(StatusCode, Json<ExperimentRecord>)> {
    let url = parse_body::<ExperimentBody>(&body)?.validated_url()?;

    let mut builder =
        ExperimentRecord::builder(Uuid::new_v4().to_string()).created_at(state.clock.now());
    if let Some(url) = url {
        builder = builder.url(url);
    }
    let record = builder.build();

    state.store.insert_experiment(record.clone()).await?;
    tracing::info!(experiment_id = record.id(), "experiment created");
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn update<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(experiment_id): Path<String>,
    body: Bytes,
) -> Result<Json<ExperimentRecord>> {
    let url = parse_body::<ExperimentBody>(&body)?.validated_url()?;

    let mut record = state
        .store
        .get_experiment(&experiment_id)
        .await?
        .ok_or_else(|| Error::experiment_not_found(&experiment_id))?;
    record.set_url(url);

    if !state.store.replace_experiment(record.clone()).await? {
        return Err(Error::experiment_not_found(experiment_id));
    }
    tracing::info!(%experiment_id, "experiment updated");
    Ok(Json(record))
}

pub(crate) async fn delete<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(experiment_id): Path<String>,
) -> Result<StatusCode> {
    if !state.store.delete_experiment(&experiment_id).await? {
        return Err(Error::experiment_not_found(experiment_id));
    }
    tracing::info!(%experiment_id, "experiment deleted");
    Ok(StatusCode::NO_CONTENT)
}
