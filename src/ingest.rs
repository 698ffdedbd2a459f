//! Response ingestion for Active participants
//!
//! A submission is appended as one unit: either every record in the batch
//! lands, in arrival order, or the call fails. The append is conditional on
//! the participant still being Active at commit time and is applied to the
//! stored sequence inside the store, so two concurrent submissions both
//! land instead of one overwriting the other.

use std::sync::Arc;

use crate::experiment::{Conflict, ParticipantState, ResponseBatch};
use crate::store::{Condition, DocumentStore};
use crate::{Error, Result};

/// Accepts response batches on behalf of participants.
pub struct ResponseSink<S> {
    store: Arc<S>,
}

impl<S> Clone for ResponseSink<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// State check for submissions: only Active participants accept responses.
const fn accepts_responses(state: ParticipantState) -> std::result::Result<(), Conflict> {
    match state {
        ParticipantState::Active => Ok(()),
        ParticipantState::Finished => Err(Conflict::AlreadyTerminated),
        ParticipantState::Pending => Err(Conflict::NotStarted),
    }
}

impl<S: DocumentStore> ResponseSink<S> {
    /// Create a sink writing to `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append every record of `batch` and return the accepted keys in order.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the participant doesn't exist
    /// - `Error::Conflict` if the participant is Pending or Finished
    /// - `Error::WriteConflict` if it stopped (or vanished) before the append
    /// - `Error::WriteFailed` if the store failed during the append
    /// - any store error from the initial fetch
    pub async fn submit(&self, participant_id: &str, batch: ResponseBatch) -> Result<Vec<String>> {
        let state = self
            .store
            .participant_state(participant_id)
            .await?
            .ok_or_else(|| Error::participant_not_found(participant_id))?;

        if let Err(conflict) = accepts_responses(state) {
            tracing::warn!(participant_id, %conflict, "submission refused by state check");
            return Err(conflict.into());
        }

        let (keys, records) = batch.into_parts();
        let matched = self
            .store
            .append_responses_if(participant_id, Condition::Active, records)
            .await
            .map_err(|e| {
                tracing::error!(participant_id, error = %e, "response append failed");
                Error::WriteFailed(e.to_string())
            })?;

        if matched == 0 {
            tracing::warn!(participant_id, "conditional append matched no document");
            return Err(Error::WriteConflict {
                id: participant_id.to_string(),
            });
        }

        tracing::debug!(participant_id, accepted = keys.len(), "responses appended");
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_responses_only_when_active() {
        assert_eq!(accepts_responses(ParticipantState::Active), Ok(()));
        assert_eq!(
            accepts_responses(ParticipantState::Pending),
            Err(Conflict::NotStarted)
        );
        assert_eq!(
            accepts_responses(ParticipantState::Finished),
            Err(Conflict::AlreadyTerminated)
        );
    }
}
