//! In-memory document store using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.
//! Conditional operations evaluate and mutate under the entry's shard write
//! lock, so they are atomic with respect to every other operation on the
//! same document.

use super::{Condition, DocumentStore, ParticipantUpdate};
use crate::experiment::{ExperimentRecord, ParticipantRecord, ParticipantState};
use crate::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-memory document store using lock-free concurrent hashmaps.
///
/// Thread-safe and optimized for high-concurrency read/write workloads.
///
/// # Example
///
/// ```rust
/// use sinklab::experiment::ExperimentRecord;
/// use sinklab::store::{DocumentStore, MemoryDocumentStore};
///
/// # async fn example() -> sinklab::Result<()> {
/// let store = MemoryDocumentStore::new();
/// store.insert_experiment(ExperimentRecord::new("exp-1")).await?;
/// assert!(store.get_experiment("exp-1").await?.is_some());
/// # Ok(())
/// # }
/// ```
pub struct MemoryDocumentStore {
    experiments: DashMap<String, ExperimentRecord>,
    participants: DashMap<String, ParticipantRecord>,
}

impl MemoryDocumentStore {
    /// Create a new in-memory document store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            experiments: DashMap::new(),
            participants: DashMap::new(),
        }
    }

    /// Number of experiment documents.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Number of participant documents.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Check if the store holds no documents at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty() && self.participants.is_empty()
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryDocumentStore {
    async fn list_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        let mut records: Vec<ExperimentRecord> =
            self.experiments.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(records)
    }

    async fn get_experiment(&self, id: &str) -> Result<Option<ExperimentRecord>> {
        Ok(self.experiments.get(id).map(|e| e.value().clone()))
    }

    async fn insert_experiment(&self, record: ExperimentRecord) -> Result<()> {
        match self.experiments.entry(record.id().to_string()) {
            Entry::Occupied(_) => Err(Error::StoreFailure(format!(
                "experiment {} already exists",
                record.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn replace_experiment(&self, record: ExperimentRecord) -> Result<bool> {
        Ok(self.experiments.get_mut(record.id()).map_or(false, |mut current| {
            *current = record;
            true
        }))
    }

    async fn delete_experiment(&self, id: &str) -> Result<bool> {
        Ok(self.experiments.remove(id).is_some())
    }

    async fn list_participants(&self, experiment_id: &str) -> Result<Vec<ParticipantRecord>> {
        let mut records: Vec<ParticipantRecord> = self
            .participants
            .iter()
            .filter(|p| p.experiment_id() == experiment_id)
            .map(|p| p.value().clone())
            .collect();
        records.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(records)
    }

    async fn get_participant(&self, id: &str) -> Result<Option<ParticipantRecord>> {
        Ok(self.participants.get(id).map(|p| p.value().clone()))
    }

    async fn participant_state(&self, id: &str) -> Result<Option<ParticipantState>> {
        Ok(self.participants.get(id).map(|p| p.state()))
    }

    async fn insert_participant(&self, record: ParticipantRecord) -> Result<()> {
        match self.participants.entry(record.id().to_string()) {
            Entry::Occupied(_) => Err(Error::StoreFailure(format!(
                "participant {} already exists",
                record.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn delete_participant(&self, id: &str) -> Result<bool> {
        Ok(self.participants.remove(id).is_some())
    }

    async fn update_participant_if(
        &self,
        id: &str,
        condition: Condition,
        update: ParticipantUpdate,
    ) -> Result<u64> {
        let Some(mut current) = self.participants.get_mut(id) else {
            return Ok(0);
        };
        if !condition.matches(&current) {
            return Ok(0);
        }
        update.apply(&mut current);
        Ok(1)
    }

    async fn append_responses_if(
        &self,
        id: &str,
        condition: Condition,
        records: Vec<serde_json::Value>,
    ) -> Result<u64> {
        let Some(mut current) = self.participants.get_mut(id) else {
            return Ok(0);
        };
        if !condition.matches(&current) {
            return Ok(0);
        }
        current.extend_responses(records);
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_memory_store_participant_state() {
        let store = MemoryDocumentStore::new();
        assert_eq!(store.participant_state("p-1").await.unwrap(), None);

        store
            .insert_participant(
                ParticipantRecord::builder("p-1", "exp-1")
                    .started(Utc::now())
                    .responses(vec![serde_json::json!({"rt": 1}); 64])
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(
            store.participant_state("p-1").await.unwrap(),
            Some(ParticipantState::Active)
        );
    }

    #[tokio::test]
    async fn test_memory_store_experiment_crud() {
        let store = MemoryDocumentStore::new();

        store
            .insert_experiment(ExperimentRecord::new("exp-1"))
            .await
            .unwrap();
        assert_eq!(store.experiment_count(), 1);

        let mut updated = store.get_experiment("exp-1").await.unwrap().unwrap();
        updated.set_url(Some("https://example.org".to_string()));
        assert!(store.replace_experiment(updated).await.unwrap());
        assert_eq!(
            store.get_experiment("exp-1").await.unwrap().unwrap().url(),
            Some("https://example.org")
        );

        assert!(store.delete_experiment("exp-1").await.unwrap());
        assert!(!store.delete_experiment("exp-1").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_duplicate_insert_rejected() {
        let store = MemoryDocumentStore::new();
        store
            .insert_participant(ParticipantRecord::new("p-1", "exp-1"))
            .await
            .unwrap();

        let err = store
            .insert_participant(ParticipantRecord::new("p-1", "exp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreFailure(_)));
    }

    #[tokio::test]
    async fn test_memory_store_replace_missing() {
        let store = MemoryDocumentStore::new();
        assert!(!store
            .replace_experiment(ExperimentRecord::new("ghost"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_lists_participants_by_experiment() {
        let store = MemoryDocumentStore::new();
        store
            .insert_participant(ParticipantRecord::new("p-1", "exp-1"))
            .await
            .unwrap();
        store
            .insert_participant(ParticipantRecord::new("p-2", "exp-2"))
            .await
            .unwrap();

        let listed = store.list_participants("exp-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), "p-1");
    }

    #[tokio::test]
    async fn test_memory_store_conditional_update_missing_document() {
        let store = MemoryDocumentStore::new();
        let matched = store
            .update_participant_if(
                "ghost",
                Condition::NotStarted,
                ParticipantUpdate::Start(Utc::now()),
            )
            .await
            .unwrap();
        assert_eq!(matched, 0);
    }

    #[tokio::test]
    async fn test_memory_store_append_requires_condition() {
        let store = MemoryDocumentStore::new();
        store
            .insert_participant(ParticipantRecord::new("p-1", "exp-1"))
            .await
            .unwrap();

        let matched = store
            .append_responses_if("p-1", Condition::Active, vec![serde_json::json!(1)])
            .await
            .unwrap();
        assert_eq!(matched, 0);
        assert!(store
            .get_participant("p-1")
            .await
            .unwrap()
            .unwrap()
            .responses()
            .is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_concurrent_conditional_start() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .insert_participant(ParticipantRecord::new("p-1", "exp-1"))
            .await
            .unwrap();

        let mut handles = vec![];
        for _ in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update_participant_if(
                        "p-1",
                        Condition::NotStarted,
                        ParticipantUpdate::Start(Utc::now()),
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut matched = 0;
        for handle in handles {
            matched += handle.await.unwrap();
        }
        assert_eq!(matched, 1);
    }

    #[tokio::test]
    async fn test_memory_store_concurrent_appends_all_land() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .insert_participant(
                ParticipantRecord::builder("p-1", "exp-1")
                    .started(Utc::now())
                    .build(),
            )
            .await
            .unwrap();

        let mut handles = vec![];
        for i in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_responses_if("p-1", Condition::Active, vec![serde_json::json!(i)])
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1);
        }

        let record = store.get_participant("p-1").await.unwrap().unwrap();
        assert_eq!(record.responses().len(), 50);
    }
}
