// vecto-ingest — example/basic.rs
// Demonstrates a text lookup and a small text ingestion against a live space.
// Run with:  cargo run --example basic
//
// Needs user_token and vector_space_id in the environment (or a .env file).

use vingest::toolbelt::ingest_texts;
use vingest::{Attribute, IngestOptions, Item, VectoClient, VectoConfig};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let _ = dotenv::dotenv();

    println!("── vecto-ingest Basic Example ────────────────");

    let client = VectoClient::new(VectoConfig::from_env()?)?;

    let texts = ["a small black cat", "a large brown dog", "a red double-decker bus"];
    let labels: Vec<Attribute> = ["cat", "dog", "bus"].into_iter().map(Attribute::from).collect();

    let report = ingest_texts(&client, &texts, Some(&labels), IngestOptions::default())?;
    println!("Ingested ids: {:?}\n", report.ingested_ids());

    let response = client.lookup(&Item::text("kitten"), 3, None)?;
    println!("Top-3 results for query \"kitten\":");
    for r in &response.results {
        println!("  id={:4}  similarity={:.4}  attributes={}", r.id, r.similarity, r.attributes);
    }

    println!("\nExpected: cat first");
    println!("\n── Done ──────────────────────────────────────");
    Ok(())
}
