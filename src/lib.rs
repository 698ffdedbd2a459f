//! # sinklab: Backend for Scripted Behavioral Experiments
//!
//! **Version**: 0.1.0
//!
//! Researchers define experiments; participants enroll, move through a
//! strict Pending → Active → Finished lifecycle, and stream response records
//! while Active. Every participant-scoped request is gated by the CORS
//! origin its experiment declares.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Transitions are compare-and-swap writes; a lost
//!   race is reported, never silently applied
//! - **Jidoka**: Every refused request says exactly why (wrong state vs. lost race)
//! - **Muda elimination**: No in-process locks; the store's conditional
//!   update is the only synchronization point
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use sinklab::clock::SystemClock;
//! use sinklab::experiment::{ParticipantRecord, ResponseBatch};
//! use sinklab::ingest::ResponseSink;
//! use sinklab::lifecycle::LifecycleManager;
//! use sinklab::store::{DocumentStore, MemoryDocumentStore};
//!
//! # async fn example() -> sinklab::Result<()> {
//! let store = Arc::new(MemoryDocumentStore::new());
//! store.insert_participant(ParticipantRecord::new("p-1", "exp-1")).await?;
//!
//! let lifecycle = LifecycleManager::new(Arc::clone(&store), Arc::new(SystemClock::new()));
//! lifecycle.start("p-1").await?;
//!
//! let sink = ResponseSink::new(Arc::clone(&store));
//! let batch = ResponseBatch::new().with("trial-1", serde_json::json!({"rt": 412}));
//! assert_eq!(sink.submit("p-1", batch).await?, vec!["trial-1"]);
//!
//! lifecycle.stop("p-1").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod clock;
pub mod config;
pub mod error;
pub mod experiment;
pub mod http;
pub mod ingest;
pub mod lifecycle;
pub mod logging;
pub mod origin;
pub mod store;

pub use error::{DocumentKind, Error, Result};
