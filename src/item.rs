// vecto-ingest — item.rs
// Ingest items, attributes, and modality dispatch into readable payloads.
// Author: d65v <https://github.com/d65v>

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Content type of a run. Declared by the caller, sent to the service as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    /// Wire name used in form fields (`TEXT` / `IMAGE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "TEXT",
            Modality::Image => "IMAGE",
        }
    }

    /// MIME type attached to uploaded parts of this modality.
    pub fn mime(&self) -> &'static str {
        match self {
            Modality::Text => "text/plain",
            Modality::Image => "application/octet-stream",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Modality::Text),
            "IMAGE" => Ok(Modality::Image),
            other => Err(format!("unknown modality '{}' (expected TEXT or IMAGE)", other)),
        }
    }
}

// ── Items ─────────────────────────────────────────────────────────────────────

/// One unit to ingest or query with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Inline text content.
    Text { content: String },
    /// Reference to an image file on disk.
    Image { path: PathBuf },
}

impl Item {
    pub fn text(content: impl Into<String>) -> Self {
        Item::Text { content: content.into() }
    }

    pub fn image(path: impl AsRef<Path>) -> Self {
        Item::Image { path: path.as_ref().to_path_buf() }
    }

    pub fn modality(&self) -> Modality {
        match self {
            Item::Text { .. } => Modality::Text,
            Item::Image { .. } => Modality::Image,
        }
    }

    /// Name given to the uploaded part: the file name for images, a
    /// positional placeholder for text.
    pub fn file_name(&self, position: usize) -> String {
        match self {
            Item::Text { .. } => format!("text_{}.txt", position),
            Item::Image { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("image_{}", position)),
        }
    }

    /// Turn the item into a readable payload.
    ///
    /// Images are opened from disk; the returned handle lives as long as the
    /// payload does. Text becomes an in-memory reader over its content.
    ///
    /// # Errors
    /// Returns the underlying I/O error if an image path cannot be opened.
    pub fn open(&self) -> io::Result<Payload> {
        match self {
            Item::Text { content } => Ok(Payload::Text(Cursor::new(content.clone()))),
            Item::Image { path } => File::open(path).map(Payload::File),
        }
    }
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// A byte stream ready to hand to a transport.
#[derive(Debug)]
pub enum Payload {
    File(File),
    Text(Cursor<String>),
}

impl Payload {
    /// Drain the payload into a buffer.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for Payload {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Payload::File(f) => f.read(buf),
            Payload::Text(c) => c.read(buf),
        }
    }
}

// ── Attributes ────────────────────────────────────────────────────────────────

/// Caller metadata attached to an item; returned with lookup results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    Label(String),
    Fields(serde_json::Map<String, serde_json::Value>),
}

impl Attribute {
    /// JSON encoding sent in the `attributes` form field.
    pub fn to_field(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&str> for Attribute {
    fn from(s: &str) -> Self {
        Attribute::Label(s.to_string())
    }
}

impl From<String> for Attribute {
    fn from(s: String) -> Self {
        Attribute::Label(s)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
