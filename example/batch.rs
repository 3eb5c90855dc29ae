// vecto-ingest — example/batch.rs
// Demonstrates batched ingestion with per-batch failure reporting,
// using an in-memory transport instead of the network.

use vingest::{
    Batch, BatchUploadResult, IngestOptions, IngestOutcome, Ingestor, Item, LogProgress,
    Modality, Reset, Transport, TransportError,
};

/// Rejects every third batch.
struct FlakyTransport {
    next_id: u64,
}

impl Transport for FlakyTransport {
    fn submit(&mut self, batch: Batch<'_>) -> Result<BatchUploadResult, TransportError> {
        if batch.index % 3 == 2 {
            return Err(TransportError::Status { status: 503, body: "try later".into() });
        }
        let ids = (self.next_id..self.next_id + batch.len() as u64).collect();
        self.next_id += batch.len() as u64;
        Ok(BatchUploadResult { ids })
    }
}

struct PrintReset;

impl Reset for PrintReset {
    fn reset_all(&mut self) -> Result<(), TransportError> {
        println!("(reset: existing entries deleted)");
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let items: Vec<Item> = (0..20).map(|i| Item::text(format!("sentence {}", i))).collect();
    let options = IngestOptions { batch_size: 4, ..Default::default() };

    let report = Ingestor::new(options)
        .run(&mut FlakyTransport { next_id: 100 }, &mut PrintReset, &mut LogProgress, Modality::Text, &items, None)
        .expect("configuration is valid");

    println!("Batches:  {}", report.total_batches);
    println!("Ingested: {}", report.items_ingested());
    for outcome in &report.outcomes {
        match outcome {
            IngestOutcome::Success { batch_index, result, .. } => {
                println!("  batch {} => ids {:?}", batch_index, result.ids)
            }
            IngestOutcome::Failure { batch_index, error, .. } => {
                println!("  batch {} => FAILED: {}", batch_index, error)
            }
        }
    }
}
