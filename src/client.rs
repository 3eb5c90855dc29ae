// vecto-ingest — client.rs
// Blocking HTTP client for the Vecto service. Implements the ingestion
// Transport and Reset collaborators plus the rest of the v0 API.
// Author: d65v <https://github.com/d65v>

use std::fmt;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::batch::Batch;
use crate::ingest::{BatchUploadResult, Reset, Transport};
use crate::item::{Attribute, Item, Modality, Payload};
use crate::{Result, TransportError, VectoError};

pub const DEFAULT_BASE_URL: &str = "https://api.vecto.ai";
pub const DEFAULT_TOP_K: usize = 5;

/// Longest error body kept in `TransportError::Status`.
const MAX_ERROR_BODY: usize = 1024;

// ── Config ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct VectoConfig {
    pub token: String,
    pub base_url: String,
    pub vector_space_id: u64,
    pub timeout: Duration,
}

impl fmt::Debug for VectoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectoConfig")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("vector_space_id", &self.vector_space_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl VectoConfig {
    pub fn new(token: impl Into<String>, vector_space_id: u64) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            vector_space_id,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Load config entirely from the environment.
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None, None)
    }

    /// Explicit values win; otherwise `user_token`, `vecto_base_url` and
    /// `vector_space_id` are read from the environment. The base URL falls
    /// back to the public endpoint.
    ///
    /// # Errors
    /// Returns `VectoError::ConfigError` if the token or space id is missing,
    /// or the space id is not an integer.
    pub fn resolve(
        token: Option<String>,
        base_url: Option<String>,
        vector_space_id: Option<u64>,
    ) -> Result<Self> {
        Self::resolve_with(token, base_url, vector_space_id, |k| std::env::var(k).ok())
    }

    fn resolve_with(
        token: Option<String>,
        base_url: Option<String>,
        vector_space_id: Option<u64>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let token = token
            .filter(|t| !t.is_empty())
            .or_else(|| env("user_token"))
            .ok_or_else(|| VectoError::ConfigError("no token given and user_token is not set".into()))?;

        let base_url = base_url
            .filter(|u| !u.is_empty())
            .or_else(|| env("vecto_base_url"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let vector_space_id = match vector_space_id {
            Some(id) => id,
            None => {
                let raw = env("vector_space_id").ok_or_else(|| {
                    VectoError::ConfigError("no vector space id given and vector_space_id is not set".into())
                })?;
                raw.trim().parse().map_err(|_| {
                    VectoError::ConfigError(format!("vector_space_id '{}' is not an integer", raw))
                })?
            }
        };

        Ok(Self {
            base_url,
            vector_space_id,
            ..Self::new(token, vector_space_id)
        })
    }
}

// ── Request / Response Types ──────────────────────────────────────────────────

/// One lookup hit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LookupResult {
    pub id: u64,
    pub similarity: f32,
    #[serde(default, alias = "data")]
    pub attributes: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub results: Vec<LookupResult>,
}

/// Start and end of an analogy ("start is to end as query is to ?").
#[derive(Debug, Clone)]
pub struct AnalogyStartEnd {
    pub start: Item,
    pub end: Item,
}

/// Replace the stored embedding of `id` with one computed from `data`.
#[derive(Debug, Clone)]
pub struct EmbeddingUpdate {
    pub id: u64,
    pub data: Item,
}

/// Replace the attribute stored for `id`.
#[derive(Debug, Clone)]
pub struct AttributeUpdate {
    pub id: u64,
    pub attribute: Attribute,
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Handle to one vector space. Pass it explicitly to whatever needs it.
#[derive(Debug, Clone)]
pub struct VectoClient {
    http: Client,
    config: VectoConfig,
}

impl VectoClient {
    /// # Errors
    /// Returns `VectoError::Transport` if the HTTP client cannot be built.
    pub fn new(config: VectoConfig) -> Result<Self> {
        log::debug!(
            "creating Vecto client: base_url={}, vector_space_id={}",
            config.base_url,
            config.vector_space_id
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TransportError::from)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &VectoConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn form(&self) -> Form {
        Form::new().text("vector_space_id", self.config.vector_space_id.to_string())
    }

    fn post<T: DeserializeOwned>(&self, path: &str, form: Form) -> std::result::Result<T, TransportError> {
        let url = self.url(path);
        log::debug!("POST {}", url);
        let response = self
            .http
            .post(url.as_str())
            .bearer_auth(&self.config.token)
            .multipart(form)
            .send()?;
        decode(response)
    }

    /// Upload one batch. Payloads move into the form and are dropped with the request.
    pub fn ingest(&self, batch: Batch<'_>) -> std::result::Result<BatchUploadResult, TransportError> {
        let modality = batch.modality;
        let mut form = self.form().text("modality", modality.as_str());
        for (i, entry) in batch.entries.into_iter().enumerate() {
            let name = entry.item.file_name(i);
            let attribute = match entry.attribute {
                Some(attr) => attr.to_field()?,
                None => String::from("null"),
            };
            form = form
                .part("data", payload_part(entry.payload, name, modality)?)
                .text("attributes", attribute);
        }
        self.post("index", form)
    }

    /// Find the `top_k` nearest entries to `query`, optionally restricted to `ids`.
    pub fn lookup(&self, query: &Item, top_k: usize, ids: Option<&[u64]>) -> Result<LookupResponse> {
        let modality = query.modality();
        let mut form = self
            .form()
            .text("modality", modality.as_str())
            .text("top_k", top_k.to_string())
            .part("query", item_part(query, 0)?);
        for id in ids.unwrap_or_default() {
            form = form.text("ids", id.to_string());
        }
        Ok(self.post("lookup", form)?)
    }

    /// Compute one or more analogies against the space. Nothing is stored.
    ///
    /// # Errors
    /// `ModalityMismatch` if any start/end item differs in modality from `query`.
    pub fn compute_analogy(
        &self,
        query: &Item,
        analogies: &[AnalogyStartEnd],
        top_k: usize,
    ) -> Result<LookupResponse> {
        let modality = query.modality();
        let mut form = self
            .form()
            .text("modality", modality.as_str())
            .text("top_k", top_k.to_string())
            .part("query", item_part(query, 0)?);

        for (i, pair) in analogies.iter().enumerate() {
            for item in [&pair.start, &pair.end] {
                if item.modality() != modality {
                    return Err(VectoError::ModalityMismatch {
                        index: i,
                        expected: modality,
                        got: item.modality(),
                    });
                }
            }
            form = form
                .part("start", item_part(&pair.start, i)?)
                .part("end", item_part(&pair.end, i)?);
        }
        Ok(self.post("analogy", form)?)
    }

    /// Recompute embeddings for existing ids from new data.
    pub fn update_vector_embeddings(
        &self,
        updates: &[EmbeddingUpdate],
        modality: Modality,
    ) -> Result<serde_json::Value> {
        let mut form = self.form().text("modality", modality.as_str());
        for (i, update) in updates.iter().enumerate() {
            if update.data.modality() != modality {
                return Err(VectoError::ModalityMismatch {
                    index: i,
                    expected: modality,
                    got: update.data.modality(),
                });
            }
            form = form
                .text("id", update.id.to_string())
                .part("data", item_part(&update.data, i)?);
        }
        Ok(self.post("update/vectors", form)?)
    }

    pub fn update_vector_attribute(&self, updates: &[AttributeUpdate]) -> Result<serde_json::Value> {
        let mut form = self.form();
        for update in updates {
            form = form
                .text("id", update.id.to_string())
                .text("attributes", update.attribute.to_field().map_err(TransportError::from)?);
        }
        Ok(self.post("update/attributes", form)?)
    }

    pub fn delete_vector_embeddings(&self, ids: &[u64]) -> Result<serde_json::Value> {
        let form = ids
            .iter()
            .fold(self.form(), |form, id| form.text("id", id.to_string()));
        Ok(self.post("delete", form)?)
    }

    /// Delete every entry in the vector space.
    pub fn delete_vector_space_entries(&self) -> Result<serde_json::Value> {
        Ok(self.delete_all()?)
    }

    fn delete_all(&self) -> std::result::Result<serde_json::Value, TransportError> {
        log::info!("deleting all entries of vector space {}", self.config.vector_space_id);
        self.post("delete_all", self.form())
    }
}

impl Transport for &VectoClient {
    fn submit(&mut self, batch: Batch<'_>) -> std::result::Result<BatchUploadResult, TransportError> {
        self.ingest(batch)
    }
}

impl Reset for &VectoClient {
    fn reset_all(&mut self) -> std::result::Result<(), TransportError> {
        self.delete_all().map(|_| ())
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Sized parts, so the form goes out with a Content-Length instead of chunked.
fn payload_part(
    payload: Payload,
    file_name: String,
    modality: Modality,
) -> std::result::Result<Part, TransportError> {
    let part = match payload {
        Payload::File(file) => {
            let len = file.metadata()?.len();
            Part::reader_with_length(file, len)
        }
        Payload::Text(cursor) => Part::text(cursor.into_inner()),
    };
    Ok(part.file_name(file_name).mime_str(modality.mime())?)
}

fn item_part(item: &Item, position: usize) -> std::result::Result<Part, TransportError> {
    payload_part(item.open()?, item.file_name(position), item.modality())
}

fn decode<T: DeserializeOwned>(response: Response) -> std::result::Result<T, TransportError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_else(|e| {
            log::debug!("could not read {} error body: {}", status, e);
            String::new()
        });
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }
    let bytes = response.bytes()?;
    parse_body(&bytes)
}

/// Empty bodies decode as JSON `null`.
fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> std::result::Result<T, TransportError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null".as_slice()
    } else {
        bytes
    };
    Ok(serde_json::from_slice(bytes)?)
}

fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
