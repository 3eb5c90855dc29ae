// vecto-ingest — toolbelt.rs
// One-call ingestion helpers wiring a VectoClient into the Ingestor.
// Author: d65v <https://github.com/d65v>

use std::path::PathBuf;

use crate::client::VectoClient;
use crate::ingest::{IngestionReport, Ingestor, LogProgress};
use crate::item::{Attribute, Item, Modality};
use crate::{IngestOptions, Result};

/// Ingest image files, using the client as both transport and reset.
pub fn ingest_images(
    client: &VectoClient,
    paths: &[PathBuf],
    attributes: Option<&[Attribute]>,
    options: IngestOptions,
) -> Result<IngestionReport> {
    let items: Vec<Item> = paths.iter().map(Item::image).collect();
    ingest_items(client, Modality::Image, &items, attributes, options)
}

/// Ingest inline text.
pub fn ingest_texts<S: AsRef<str>>(
    client: &VectoClient,
    texts: &[S],
    attributes: Option<&[Attribute]>,
    options: IngestOptions,
) -> Result<IngestionReport> {
    let items: Vec<Item> = texts.iter().map(|t| Item::text(t.as_ref())).collect();
    ingest_items(client, Modality::Text, &items, attributes, options)
}

pub fn ingest_items(
    client: &VectoClient,
    modality: Modality,
    items: &[Item],
    attributes: Option<&[Attribute]>,
    options: IngestOptions,
) -> Result<IngestionReport> {
    let mut transport = client;
    let mut reset = client;
    let report = Ingestor::new(options).run(
        &mut transport,
        &mut reset,
        &mut LogProgress,
        modality,
        items,
        attributes,
    )?;

    for (index, err) in report.failures() {
        log::error!("batch {} was not ingested: {}", index, err);
    }
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
