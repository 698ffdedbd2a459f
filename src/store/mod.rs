//! Document Store Module
//!
//! Persistence boundary for experiment and participant documents:
//! - Plain CRUD on both collections
//! - Per-document atomic conditional update ("update iff the document still
//!   matches this condition")
//! - Per-document atomic conditional append to the response sequence
//!
//! The conditional operations are what make lifecycle transitions race-free.
//! A read followed by a conditional write is a compare-and-swap: a second
//! writer that raced past the same read sees zero matched documents.
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use sinklab::experiment::ParticipantRecord;
//! use sinklab::store::{Condition, DocumentStore, MemoryDocumentStore, ParticipantUpdate};
//!
//! # async fn example() -> sinklab::Result<()> {
//! let store = MemoryDocumentStore::new();
//! store.insert_participant(ParticipantRecord::new("p-1", "exp-1")).await?;
//!
//! // Only the first of these matches.
//! let first = store
//!     .update_participant_if("p-1", Condition::NotStarted, ParticipantUpdate::Start(Utc::now()))
//!     .await?;
//! let second = store
//!     .update_participant_if("p-1", Condition::NotStarted, ParticipantUpdate::Start(Utc::now()))
//!     .await?;
//! assert_eq!((first, second), (1, 0));
//! # Ok(())
//! # }
//! ```

mod memory;

pub use memory::MemoryDocumentStore;

use crate::experiment::{ExperimentRecord, ParticipantRecord, ParticipantState};
use crate::Result;
use chrono::{DateTime, Utc};
use std::future::Future;

/// Storage-level precondition on a participant document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Neither `started` nor `finished` is set.
    NotStarted,
    /// `started` is set and `finished` is unset.
    Active,
    /// `finished` is set.
    Finished,
}

impl Condition {
    /// Evaluate the condition against the current document.
    #[must_use]
    pub const fn matches(self, record: &ParticipantRecord) -> bool {
        let started = record.started().is_some();
        let finished = record.finished().is_some();
        match self {
            Self::NotStarted => !started && !finished,
            Self::Active => started && !finished,
            Self::Finished => finished,
        }
    }
}

/// Mutation applied by a conditional update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantUpdate {
    /// Set `started`.
    Start(DateTime<Utc>),
    /// Set `finished`.
    Finish(DateTime<Utc>),
    /// Clear `finished`; stamp `started` if it was never set.
    Reopen(DateTime<Utc>),
}

impl ParticipantUpdate {
    /// Apply the mutation to a document.
    pub fn apply(self, record: &mut ParticipantRecord) {
        match self {
            Self::Start(at) => record.set_started(at),
            Self::Finish(at) => record.set_finished(Some(at)),
            Self::Reopen(at) => {
                record.set_finished(None);
                if record.started().is_none() {
                    record.set_started(at);
                }
            }
        }
    }
}

/// Document store trait.
///
/// Every method is a single bounded request/response; implementations must
/// make `update_participant_if` and `append_responses_if` atomic per
/// document. Returned counts are the number of matched documents (0 or 1).
pub trait DocumentStore: Send + Sync {
    /// List all experiments, oldest first.
    fn list_experiments(&self) -> impl Future<Output = Result<Vec<ExperimentRecord>>> + Send;

    /// Fetch an experiment by ID.
    ///
    /// Returns `None` if the document doesn't exist.
    fn get_experiment(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<ExperimentRecord>>> + Send;

    /// Insert a new experiment. Fails if the ID is taken.
    fn insert_experiment(&self, record: ExperimentRecord)
        -> impl Future<Output = Result<()>> + Send;

    /// Replace an existing experiment.
    ///
    /// Returns `false` if no document has that ID.
    fn replace_experiment(
        &self,
        record: ExperimentRecord,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Delete an experiment.
    ///
    /// Returns `false` if no document has that ID.
    fn delete_experiment(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// List participants enrolled in an experiment, oldest first.
    fn list_participants(
        &self,
        experiment_id: &str,
    ) -> impl Future<Output = Result<Vec<ParticipantRecord>>> + Send;

    /// Fetch a participant by ID.
    ///
    /// Returns `None` if the document doesn't exist.
    fn get_participant(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<ParticipantRecord>>> + Send;

    /// Lifecycle state of a participant, without copying its responses.
    ///
    /// Returns `None` if the document doesn't exist.
    fn participant_state(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<ParticipantState>>> + Send;

    /// Insert a new participant. Fails if the ID is taken.
    fn insert_participant(
        &self,
        record: ParticipantRecord,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a participant.
    ///
    /// Returns `false` if no document has that ID.
    fn delete_participant(&self, id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Apply `update` iff the participant exists and matches `condition`.
    fn update_participant_if(
        &self,
        id: &str,
        condition: Condition,
        update: ParticipantUpdate,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Append `records` to the participant's responses iff it exists and
    /// matches `condition`. All records land together or none do.
    fn append_responses_if(
        &self,
        id: &str,
        condition: Condition,
        records: Vec<serde_json::Value>,
    ) -> impl Future<Output = Result<u64>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_matches_each_state() {
        let now = Utc::now();
        let pending = ParticipantRecord::new("p", "e");
        let active = ParticipantRecord::builder("p", "e").started(now).build();
        let finished = ParticipantRecord::builder("p", "e")
            .started(now)
            .finished(now)
            .build();

        assert!(Condition::NotStarted.matches(&pending));
        assert!(!Condition::NotStarted.matches(&active));
        assert!(!Condition::NotStarted.matches(&finished));

        assert!(Condition::Active.matches(&active));
        assert!(!Condition::Active.matches(&pending));
        assert!(!Condition::Active.matches(&finished));

        assert!(Condition::Finished.matches(&finished));
        assert!(!Condition::Finished.matches(&pending));
        assert!(!Condition::Finished.matches(&active));
    }

    #[test]
    fn test_update_apply() {
        let now = Utc::now();
        let mut record = ParticipantRecord::new("p", "e");

        ParticipantUpdate::Start(now).apply(&mut record);
        assert_eq!(record.started(), Some(now));

        ParticipantUpdate::Finish(now).apply(&mut record);
        assert_eq!(record.finished(), Some(now));

        ParticipantUpdate::Reopen(Utc::now()).apply(&mut record);
        assert!(record.finished().is_none());
        assert_eq!(record.started(), Some(now));
    }

    #[test]
    fn test_finished_without_started() {
        let now = Utc::now();
        let mut record = ParticipantRecord::builder("p", "e").finished(now).build();

        assert!(!Condition::NotStarted.matches(&record));
        assert!(!Condition::Active.matches(&record));
        assert!(Condition::Finished.matches(&record));

        ParticipantUpdate::Reopen(now).apply(&mut record);
        assert!(record.finished().is_none());
        assert_eq!(record.started(), Some(now));
        assert!(Condition::Active.matches(&record));
    }
}
