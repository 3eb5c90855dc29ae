// vecto-ingest — batch.rs
// Batch partitioning and the per-batch view handed to a transport.
// Author: d65v <https://github.com/d65v>

use std::ops::Range;

use crate::item::{Attribute, Item, Modality, Payload};
use crate::{Result, VectoError};

/// Default number of items per upload call.
pub const DEFAULT_BATCH_SIZE: usize = 64;

// ── Partitioning ──────────────────────────────────────────────────────────────

/// Split `len` positions into contiguous, ordered ranges of at most
/// `batch_size`. The last range holds the remainder.
///
/// # Errors
/// Returns `VectoError::ConfigError` if `batch_size` is zero.
pub fn partition(len: usize, batch_size: usize) -> Result<Vec<Range<usize>>> {
    if batch_size == 0 {
        return Err(VectoError::ConfigError(
            "batch_size must be at least 1".to_string(),
        ));
    }

    let mut ranges = Vec::with_capacity(len.div_ceil(batch_size));
    let mut start = 0;
    while start < len {
        let end = (start + batch_size).min(len);
        ranges.push(start..end);
        start = end;
    }
    Ok(ranges)
}

/// A batch of items with the attributes that travel with them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chunk<'a> {
    pub index: usize,
    pub items: &'a [Item],
    pub attributes: Option<&'a [Attribute]>,
}

/// Partition items and, if present, their attributes on identical boundaries.
///
/// # Errors
/// `VectoError::LengthMismatch` when the attribute list does not line up with
/// the item list; `VectoError::ConfigError` for a zero batch size.
pub fn partition_with_attributes<'a>(
    items: &'a [Item],
    attributes: Option<&'a [Attribute]>,
    batch_size: usize,
) -> Result<Vec<Chunk<'a>>> {
    if let Some(attrs) = attributes {
        if attrs.len() != items.len() {
            return Err(VectoError::LengthMismatch {
                items: items.len(),
                attributes: attrs.len(),
            });
        }
    }

    let chunks = partition(items.len(), batch_size)?
        .into_iter()
        .enumerate()
        .map(|(index, range)| Chunk {
            index,
            items: &items[range.clone()],
            attributes: attributes.map(|a| &a[range]),
        })
        .collect();

    Ok(chunks)
}

// ── Transport View ────────────────────────────────────────────────────────────

/// One item of a batch, opened and ready to upload.
#[derive(Debug)]
pub struct BatchEntry<'a> {
    pub item: &'a Item,
    pub payload: Payload,
    pub attribute: Option<&'a Attribute>,
}

/// What a transport receives for a single upload call.
///
/// Owns the opened payloads; dropping the batch releases any file handles.
#[derive(Debug)]
pub struct Batch<'a> {
    pub index: usize,
    pub modality: Modality,
    pub entries: Vec<BatchEntry<'a>>,
}

impl<'a> Batch<'a> {
    /// Open every item in the chunk.
    ///
    /// # Errors
    /// Fails on the first item whose payload cannot be opened; handles opened
    /// before it are dropped with the partial batch.
    pub fn open(chunk: &Chunk<'a>, modality: Modality) -> std::io::Result<Self> {
        let mut entries = Vec::with_capacity(chunk.items.len());
        for (i, item) in chunk.items.iter().enumerate() {
            entries.push(BatchEntry {
                item,
                payload: item.open()?,
                attribute: chunk.attributes.map(|a| &a[i]),
            });
        }
        Ok(Self {
            index: chunk.index,
            modality,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
