//! Participant Record - one enrollee's run through an experiment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical lifecycle state of a participant.
///
/// Derived from the nullity of `started` and `finished`; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantState {
    /// Enrolled, not yet started.
    Pending,
    /// Started and accepting responses.
    Active,
    /// Stopped. Can only be reopened.
    Finished,
}

impl ParticipantState {
    /// Classify a pair of lifecycle timestamps.
    ///
    /// `finished` wins: a document that somehow carries `finished` without
    /// `started` is Finished. It can never be started again; reopening it
    /// stamps `started` so it comes back Active.
    #[must_use]
    pub const fn classify(started: bool, finished: bool) -> Self {
        match (started, finished) {
            (_, true) => Self::Finished,
            (true, false) => Self::Active,
            (false, false) => Self::Pending,
        }
    }
}

/// Why a lifecycle request was refused by the state check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conflict {
    /// The participant is Finished.
    AlreadyTerminated,
    /// `start` on an Active participant.
    Running,
    /// `reopen` on a participant that is not Finished.
    StillRunning,
    /// `stop` or `sink` on a Pending participant.
    NotStarted,
}

impl Conflict {
    /// Client-facing message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::AlreadyTerminated => "Experiment has already been terminated",
            Self::Running => "Experiment is running",
            Self::StillRunning => "Experiment is still running",
            Self::NotStarted => "Experiment has not yet been started",
        }
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Participant Record tracks one enrollee.
///
/// Lifecycle timestamps move Pending → Active → Finished (and back to
/// Active on reopen). `responses` only ever grows, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantRecord {
    id: String,
    experiment_id: String,
    created_at: DateTime<Utc>,
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
    #[serde(default)]
    responses: Vec<serde_json::Value>,
}

impl ParticipantRecord {
    /// Create a new participant record in Pending state.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for the participant
    /// * `experiment_id` - ID of the experiment the participant enrolled in
    #[must_use]
    pub fn new(id: impl Into<String>, experiment_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            experiment_id: experiment_id.into(),
            created_at: Utc::now(),
            started: None,
            finished: None,
            responses: Vec::new(),
        }
    }

    /// Create a builder, mostly for fixtures that need a non-Pending record.
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        experiment_id: impl Into<String>,
    ) -> ParticipantRecordBuilder {
        ParticipantRecordBuilder::new(id, experiment_id)
    }

    /// Get the participant ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the enrollment timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the start timestamp, if started.
    #[must_use]
    pub const fn started(&self) -> Option<DateTime<Utc>> {
        self.started
    }

    /// Get the finish timestamp, if finished.
    #[must_use]
    pub const fn finished(&self) -> Option<DateTime<Utc>> {
        self.finished
    }

    /// Get the stored responses in arrival order.
    #[must_use]
    pub fn responses(&self) -> &[serde_json::Value] {
        &self.responses
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ParticipantState {
        ParticipantState::classify(self.started.is_some(), self.finished.is_some())
    }

    pub(crate) fn set_started(&mut self, at: DateTime<Utc>) {
        self.started = Some(at);
    }

    pub(crate) fn set_finished(&mut self, at: Option<DateTime<Utc>>) {
        self.finished = at;
    }

    pub(crate) fn extend_responses(&mut self, records: Vec<serde_json::Value>) {
        self.responses.extend(records);
    }
}

/// Builder for `ParticipantRecord`.
#[derive(Debug)]
pub struct ParticipantRecordBuilder {
    record: ParticipantRecord,
}

impl ParticipantRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, experiment_id: impl Into<String>) -> Self {
        Self {
            record: ParticipantRecord::new(id, experiment_id),
        }
    }

    /// Set the start timestamp.
    #[must_use]
    pub const fn started(mut self, at: DateTime<Utc>) -> Self {
        self.record.started = Some(at);
        self
    }

    /// Set the finish timestamp.
    #[must_use]
    pub const fn finished(mut self, at: DateTime<Utc>) -> Self {
        self.record.finished = Some(at);
        self
    }

    /// Seed previously stored responses.
    #[must_use]
    pub fn responses(mut self, responses: Vec<serde_json::Value>) -> Self {
        self.record.responses = responses;
        self
    }

    /// Build the `ParticipantRecord`.
    #[must_use]
    pub fn build(self) -> ParticipantRecord {
        self.record
    }
}
