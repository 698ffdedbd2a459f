//! Participant lifecycle state machine
//!
//! ```text
//!            start              stop
//!  Pending ─────────► Active ─────────► Finished
//!                        ▲                  │
//!                        └──────────────────┘
//!                              reopen
//! ```
//!
//! Every transition is two phases: read the participant and check its state
//! (cheap, gives a precise conflict reason), then issue a conditional write
//! whose storage condition restates the same precondition. Only the
//! conditional write decides the race; the read is advisory. Of two
//! concurrent identical requests at most one write matches, and the loser
//! gets `Error::WriteConflict` rather than a state conflict.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::experiment::{Conflict, ParticipantState};
use crate::store::{Condition, DocumentStore, ParticipantUpdate};
use crate::{Error, Result};

/// Externally triggered lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Pending → Active
    Start,
    /// Active → Finished
    Stop,
    /// Finished → Active
    Reopen,
}

impl Transition {
    /// State check performed before the conditional write.
    ///
    /// # Errors
    ///
    /// Returns the conflict the client is told about when `state` does not
    /// permit this transition.
    pub const fn check(self, state: ParticipantState) -> std::result::Result<(), Conflict> {
        match (self, state) {
            (Self::Start, ParticipantState::Pending)
            | (Self::Stop, ParticipantState::Active)
            | (Self::Reopen, ParticipantState::Finished) => Ok(()),
            (Self::Start | Self::Stop, ParticipantState::Finished) => {
                Err(Conflict::AlreadyTerminated)
            }
            (Self::Start, ParticipantState::Active) => Err(Conflict::Running),
            (Self::Stop, ParticipantState::Pending) => Err(Conflict::NotStarted),
            (Self::Reopen, ParticipantState::Pending | ParticipantState::Active) => {
                Err(Conflict::StillRunning)
            }
        }
    }

    /// Storage-level precondition restating `check`.
    #[must_use]
    pub const fn condition(self) -> Condition {
        match self {
            Self::Start => Condition::NotStarted,
            Self::Stop => Condition::Active,
            Self::Reopen => Condition::Finished,
        }
    }

    /// Mutation applied when the condition holds.
    #[must_use]
    pub const fn update(self, now: DateTime<Utc>) -> ParticipantUpdate {
        match self {
            Self::Start => ParticipantUpdate::Start(now),
            Self::Stop => ParticipantUpdate::Finish(now),
            Self::Reopen => ParticipantUpdate::Reopen(now),
        }
    }

    /// Client-facing success message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Start => "Started",
            Self::Stop => "Finished",
            Self::Reopen => "Reopened",
        }
    }

    /// Lowercase verb for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reopen => "reopen",
        }
    }
}

/// Drives participant transitions against a document store.
pub struct LifecycleManager<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for LifecycleManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: DocumentStore> LifecycleManager<S> {
    /// Create a manager over `store`, stamping transitions with `clock`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Start a Pending participant.
    ///
    /// # Errors
    ///
    /// See [`LifecycleManager::apply`].
    pub async fn start(&self, participant_id: &str) -> Result<Transition> {
        self.apply(participant_id, Transition::Start).await
    }

    /// Stop an Active participant.
    ///
    /// # Errors
    ///
    /// See [`LifecycleManager::apply`].
    pub async fn stop(&self, participant_id: &str) -> Result<Transition> {
        self.apply(participant_id, Transition::Stop).await
    }

    /// Return a Finished participant to Active.
    ///
    /// # Errors
    ///
    /// See [`LifecycleManager::apply`].
    pub async fn reopen(&self, participant_id: &str) -> Result<Transition> {
        self.apply(participant_id, Transition::Reopen).await
    }

    /// Run one transition: state check, then conditional write.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the participant doesn't exist
    /// - `Error::Conflict` if its current state forbids the transition
    /// - `Error::WriteConflict` if the conditional write matched nothing
    /// - `Error::WriteFailed` if the store failed during the write
    /// - any store error from the initial fetch
    pub async fn apply(&self, participant_id: &str, transition: Transition) -> Result<Transition> {
        let state = self
            .store
            .participant_state(participant_id)
            .await?
            .ok_or_else(|| Error::participant_not_found(participant_id))?;

        if let Err(conflict) = transition.check(state) {
            tracing::warn!(
                participant_id,
                transition = transition.name(),
                ?state,
                %conflict,
                "transition refused by state check"
            );
            return Err(conflict.into());
        }
        tracing::debug!(participant_id, transition = transition.name(), ?state, "state check passed");

        let update = transition.update(self.clock.now());
        let matched = self
            .store
            .update_participant_if(participant_id, transition.condition(), update)
            .await
            .map_err(|e| {
                tracing::error!(participant_id, transition = transition.name(), error = %e, "transition write failed");
                Error::WriteFailed(e.to_string())
            })?;

        if matched == 0 {
            tracing::warn!(
                participant_id,
                transition = transition.name(),
                "conditional write matched no document"
            );
            return Err(Error::WriteConflict {
                id: participant_id.to_string(),
            });
        }

        tracing::info!(participant_id, transition = transition.name(), "transition applied");
        Ok(transition)
    }
}
