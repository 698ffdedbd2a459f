//! Participant Session Demo
//!
//! Run with: `cargo run --example participant_session`
//!
//! Walks one participant through start → sink → stop → reopen against the
//! in-memory store, then shows what a lost race looks like.

use std::sync::Arc;

use serde_json::json;
use sinklab::clock::SystemClock;
use sinklab::experiment::{ExperimentRecord, ParticipantRecord, ResponseBatch};
use sinklab::ingest::ResponseSink;
use sinklab::lifecycle::LifecycleManager;
use sinklab::origin::OriginResolver;
use sinklab::store::{DocumentStore, MemoryDocumentStore};

#[tokio::main]
async fn main() -> sinklab::Result<()> {
    println!("=== sinklab Participant Session Demo ===\n");

    let store = Arc::new(MemoryDocumentStore::new());
    let lifecycle = LifecycleManager::new(Arc::clone(&store), Arc::new(SystemClock::new()));
    let sink = ResponseSink::new(Arc::clone(&store));

    demo_origin(&store).await?;
    demo_lifecycle(&store, &lifecycle, &sink).await?;
    demo_concurrent_start(&store, &lifecycle).await?;

    println!("All demos completed successfully!");
    Ok(())
}

async fn demo_origin(store: &Arc<MemoryDocumentStore>) -> sinklab::Result<()> {
    println!("1. Origin Resolution");
    println!("   -----------------");

    store
        .insert_experiment(
            ExperimentRecord::builder("stroop")
                .url("https://lab.example.org/stroop/index.html?v=2")
                .build(),
        )
        .await?;
    store
        .insert_experiment(ExperimentRecord::new("open"))
        .await?;

    let resolver = OriginResolver::new(Arc::clone(store));
    for id in ["stroop", "open"] {
        let cors = resolver.resolve(id).await?;
        println!("   {id:<8} → Access-Control-Allow-Origin: {}", cors.allowed_origin());
    }
    println!();
    Ok(())
}

async fn demo_lifecycle(
    store: &Arc<MemoryDocumentStore>,
    lifecycle: &LifecycleManager<MemoryDocumentStore>,
    sink: &ResponseSink<MemoryDocumentStore>,
) -> sinklab::Result<()> {
    println!("2. Lifecycle");
    println!("   ---------");

    store
        .insert_participant(ParticipantRecord::new("p-1", "stroop"))
        .await?;

    if let Err(e) = sink
        .submit("p-1", ResponseBatch::new().with("early", json!({})))
        .await
    {
        println!("   sink before start  → {e}");
    }

    println!("   start              → {}", lifecycle.start("p-1").await?.message());

    let batch = ResponseBatch::new()
        .with("trial-1", json!({"word": "RED", "ink": "blue", "rt": 412}))
        .with("trial-2", json!({"word": "BLUE", "ink": "blue", "rt": 388}));
    println!("   sink               → {:?}", sink.submit("p-1", batch).await?);

    println!("   stop               → {}", lifecycle.stop("p-1").await?.message());
    if let Err(e) = lifecycle.stop("p-1").await {
        println!("   stop again         → {e}");
    }
    println!("   reopen             → {}", lifecycle.reopen("p-1").await?.message());

    if let Some(record) = store.get_participant("p-1").await? {
        println!(
            "   state = {:?}, {} responses stored",
            record.state(),
            record.responses().len()
        );
    }
    println!();
    Ok(())
}

async fn demo_concurrent_start(
    store: &Arc<MemoryDocumentStore>,
    lifecycle: &LifecycleManager<MemoryDocumentStore>,
) -> sinklab::Result<()> {
    println!("3. Concurrent Start");
    println!("   ----------------");

    store
        .insert_participant(ParticipantRecord::new("p-2", "stroop"))
        .await?;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let lifecycle = lifecycle.clone();
        handles.push(tokio::spawn(async move { lifecycle.start("p-2").await }));
    }

    let mut started = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => started += 1,
            Ok(Err(e)) => println!("   refused: {e}"),
            Err(e) => println!("   task failed: {e}"),
        }
    }
    println!("   8 concurrent starts → {started} applied\n");
    Ok(())
}
