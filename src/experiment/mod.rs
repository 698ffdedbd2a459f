//! Experiment documents
//!
//! This module provides the data structures the store persists and the
//! lifecycle manager reasons about.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< ParticipantRecord (N)
//!                              │
//!                              └── responses: [Value] (append-only)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use sinklab::experiment::{ExperimentRecord, ParticipantRecord, ParticipantState};
//!
//! let experiment = ExperimentRecord::builder("exp-001")
//!     .url("https://lab.example.org/stroop")
//!     .build();
//!
//! let participant = ParticipantRecord::new("p-001", experiment.id());
//! assert_eq!(participant.state(), ParticipantState::Pending);
//! ```

mod experiment_record;
mod participant_record;
mod response_batch;

pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder};
pub use participant_record::{
    Conflict, ParticipantRecord, ParticipantRecordBuilder, ParticipantState,
};
pub use response_batch::ResponseBatch;
