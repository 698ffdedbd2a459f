//! Shared fixtures for integration tests
//!
//! `InstrumentedStore` wraps `MemoryDocumentStore` and can:
//! - hold every conditional write at a gate until the test releases it,
//!   which deterministically reproduces check-then-write races
//! - inject read or write failures

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use sinklab::experiment::{ExperimentRecord, ParticipantRecord, ParticipantState};
use sinklab::store::{Condition, DocumentStore, MemoryDocumentStore, ParticipantUpdate};
use sinklab::{Error, Result};
use tokio::sync::Barrier;

/// Deterministic timestamp.
pub fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

/// Participant fixture in the requested state.
pub fn participant(id: &str, experiment_id: &str, state: ParticipantState) -> ParticipantRecord {
    let builder = ParticipantRecord::builder(id, experiment_id);
    match state {
        ParticipantState::Pending => builder.build(),
        ParticipantState::Active => builder.started(at(1_000)).build(),
        ParticipantState::Finished => builder.started(at(1_000)).finished(at(2_000)).build(),
    }
}

struct WriteGate {
    arrived: Barrier,
    resume: Barrier,
}

/// Memory store with failure injection and an optional write gate.
pub struct InstrumentedStore {
    inner: MemoryDocumentStore,
    gate: Option<WriteGate>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InstrumentedStore {
    /// Pass-through store.
    pub fn new() -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            gate: None,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Store whose conditional writes wait until `writers` of them have
    /// arrived and the test has called `release_writers`.
    pub fn gated(writers: usize) -> Self {
        Self {
            gate: Some(WriteGate {
                arrived: Barrier::new(writers + 1),
                resume: Barrier::new(writers + 1),
            }),
            ..Self::new()
        }
    }

    /// Underlying store, bypassing gates and faults.
    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    /// Make every fetch fail.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Make every conditional write fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Wait until all gated writers have passed their state checks.
    pub async fn wait_for_writers(&self) {
        if let Some(gate) = &self.gate {
            gate.arrived.wait().await;
        }
    }

    /// Let the gated writers proceed.
    pub async fn release_writers(&self) {
        if let Some(gate) = &self.gate {
            gate.resume.wait().await;
        }
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::StoreFailure("injected read failure".to_string()));
        }
        Ok(())
    }

    async fn before_write(&self) -> Result<()> {
        if let Some(gate) = &self.gate {
            gate.arrived.wait().await;
            gate.resume.wait().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::StoreFailure("injected write failure".to_string()));
        }
        Ok(())
    }
}

impl DocumentStore for InstrumentedStore {
    async fn list_experiments(&self) -> Result<Vec<ExperimentRecord>> {
        self.check_read()?;
        self.inner.list_experiments().await
    }

    async fn get_experiment(&self, id: &str) -> Result<Option<ExperimentRecord>> {
        self.check_read()?;
        self.inner.get_experiment(id).await
    }

    async fn insert_experiment(&self, record: ExperimentRecord) -> Result<()> {
        self.inner.insert_experiment(record).await
    }

    async fn replace_experiment(&self, record: ExperimentRecord) -> Result<bool> {
        self.inner.replace_experiment(record).await
    }

    async fn delete_experiment(&self, id: &str) -> Result<bool> {
        self.inner.delete_experiment(id).await
    }

    async fn list_participants(&self, experiment_id: &str) -> Result<Vec<ParticipantRecord>> {
        self.check_read()?;
        self.inner.list_participants(experiment_id).await
    }

    async fn get_participant(&self, id: &str) -> Result<Option<ParticipantRecord>> {
        self.check_read()?;
        self.inner.get_participant(id).await
    }

    async fn participant_state(&self, id: &str) -> Result<Option<ParticipantState>> {
        self.check_read()?;
        self.inner.participant_state(id).await
    }

    async fn insert_participant(&self, record: ParticipantRecord) -> Result<()> {
        self.inner.insert_participant(record).await
    }

    async fn delete_participant(&self, id: &str) -> Result<bool> {
        self.inner.delete_participant(id).await
    }

    async fn update_participant_if(
        &self,
        id: &str,
        condition: Condition,
        update: ParticipantUpdate,
    ) -> Result<u64> {
        self.before_write().await?;
        self.inner.update_participant_if(id, condition, update).await
    }

    async fn append_responses_if(
        &self,
        id: &str,
        condition: Condition,
        records: Vec<serde_json::Value>,
    ) -> Result<u64> {
        self.before_write().await?;
        self.inner.append_responses_if(id, condition, records).await
    }
}
