// vecto-ingest — dataset.rs
// Load ingest records from delimited files.
// Author: d65v <https://github.com/d65v>

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::item::{Attribute, Item};
use crate::{Result, VectoError};

/// A row to ingest: the text itself plus its attribute label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestRecord {
    pub data: String,
    pub attribute: Attribute,
}

impl IngestRecord {
    /// Split records into text items and their lock-step attributes.
    pub fn split_text(records: Vec<IngestRecord>) -> (Vec<Item>, Vec<Attribute>) {
        records
            .into_iter()
            .map(|r| (Item::Text { content: r.data }, r.attribute))
            .unzip()
    }
}

/// Read `data_column` and `attribute_column` from every row of a CSV file
/// with a header line.
///
/// # Errors
/// `VectoError::Dataset` on I/O or parse failures; `VectoError::ConfigError`
/// if either column is missing from the header.
pub fn load_csv(
    path: impl AsRef<Path>,
    data_column: &str,
    attribute_column: &str,
    delimiter: u8,
) -> Result<Vec<IngestRecord>> {
    let path = path.as_ref();
    log::debug!("loading ingest records from {}", path.display());
    let reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;
    read_records(reader, data_column, attribute_column)
}

/// Same as [`load_csv`] but from any reader.
pub fn load_csv_from_reader<R: Read>(
    rdr: R,
    data_column: &str,
    attribute_column: &str,
    delimiter: u8,
) -> Result<Vec<IngestRecord>> {
    let reader = csv::ReaderBuilder::new().delimiter(delimiter).from_reader(rdr);
    read_records(reader, data_column, attribute_column)
}

fn read_records<R: Read>(
    mut reader: csv::Reader<R>,
    data_column: &str,
    attribute_column: &str,
) -> Result<Vec<IngestRecord>> {
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| VectoError::ConfigError(format!("column '{}' not found in CSV header", name)))
    };
    let data_idx = column(data_column)?;
    let attr_idx = column(attribute_column)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        // Rows are length-checked by the reader against the header.
        records.push(IngestRecord {
            data: row.get(data_idx).unwrap_or_default().to_string(),
            attribute: Attribute::Label(row.get(attr_idx).unwrap_or_default().to_string()),
        });
    }

    log::info!("loaded {} ingest records", records.len());
    Ok(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
