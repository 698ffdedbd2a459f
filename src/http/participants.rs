//! Participant handlers: CRUD, lifecycle transitions and the response sink.
//!
//! All of these sit behind the CORS gate.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::{parse_body, AppState, Message};
use crate::experiment::{ParticipantRecord, ParticipantState, ResponseBatch};
use crate::lifecycle::Transition;
use crate::store::DocumentStore;
use crate::{Error, Result};

/// Participant document as served, with its derived state.
#[derive(Debug, Serialize)]
pub struct ParticipantView {
    #[serde(flatten)]
    record: ParticipantRecord,
    state: ParticipantState,
}

impl From<ParticipantRecord> for ParticipantView {
    fn from(record: ParticipantRecord) -> Self {
        let state = record.state();
        Self { record, state }
    }
}

pub(crate) async fn list<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(experiment_id): Path<String>,
) -> Result<Json<Vec<ParticipantView>>> {
    let participants = state.store.list_participants(&experiment_id).await?;
    Ok(Json(participants.into_iter().map(Into::into).collect()))
}

pub(crate) async fn fetch<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path((_experiment_id, participant_id)): Path<(String, String)>,
) -> Result<Json<ParticipantView>> {
    state
        .store
        .get_participant(&participant_id)
        .await?
        .map(|record| Json(record.into()))
        .ok_or_else(|| Error::participant_not_found(participant_id))
}

pub(crate) async fn create<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path(experiment_id): Path<String>,
) -> Result<(StatusCode, Json<ParticipantView>)> {
    let record = ParticipantRecord::new(Uuid::new_v4().to_string(), experiment_id);
    state.store.insert_participant(record.clone()).await?;
    tracing::info!(
        participant_id = record.id(),
        experiment_id = record.experiment_id(),
        "participant enrolled"
    );
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub(crate) async fn delete<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path((_experiment_id, participant_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    if !state.store.delete_participant(&participant_id).await? {
        return Err(Error::participant_not_found(participant_id));
    }
    tracing::info!(%participant_id, "participant deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn transition<S: DocumentStore + 'static>(
    state: &AppState<S>,
    participant_id: &str,
    transition: Transition,
) -> Result<Json<Message>> {
    let applied = state.lifecycle.apply(participant_id, transition).await?;
    Ok(Json(Message {
        message: applied.message().to_string(),
    }))
}

pub(crate) async fn start<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path((_experiment_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Message>> {
    transition(&state, &participant_id, Transition::Start).await
}

pub(crate) async fn stop<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path((_experiment_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Message>> {
    transition(&state, &participant_id, Transition::Stop).await
}

pub(crate) async fn reopen<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path((_experiment_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Message>> {
    transition(&state, &participant_id, Transition::Reopen).await
}

pub(crate) async fn sink<S: DocumentStore + 'static>(
    State(state): State<AppState<S>>,
    Path((_experiment_id, participant_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Vec<String>>> {
    let batch = parse_body::<ResponseBatch>(&body)?;
    Ok(Json(state.sink.submit(&participant_id, batch).await?))
}
