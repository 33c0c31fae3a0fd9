//! Byte-producing input sources.
//!
//! The analysis only ever sees bytes plus a [`SourceId`]; where those bytes
//! come from is decided by the [`DataSource`] implementation.

mod basic;
mod blob;
mod client;
mod http;
mod local;

pub use basic::BasicClient;
pub use blob::{BlobSource, blob_client};
pub use client::HttpClient;
pub use http::{HttpSource, fetch_bytes};
pub use local::LocalFile;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Identifies where a run's data came from. Recorded in the run metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Blob { container: String, blob: String },
    Url { url: String },
    File { path: String },
}

impl SourceId {
    /// File name for the processed-dataset export, e.g. `All_Diets_processed.csv`.
    pub fn processed_file_name(&self) -> String {
        let name = match self {
            SourceId::Blob { blob, .. } => blob.as_str(),
            SourceId::File { path } => path.as_str(),
            SourceId::Url { url } => url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .trim_end_matches('/'),
        };
        let name = name.rsplit(['/', '\\']).next().unwrap_or_default();
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("dataset");
        format!("{stem}_processed.csv")
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Blob { container, blob } => write!(f, "{container}/{blob}"),
            SourceId::Url { url } => f.write_str(url),
            SourceId::File { path } => f.write_str(path),
        }
    }
}

/// Anything that can hand over the full dataset as bytes.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn id(&self) -> SourceId;

    /// Reads the whole resource. Fails with `SourceUnavailable` when it
    /// cannot be reached or does not exist.
    async fn read_bytes(&self) -> Result<Bytes, PipelineError>;
}

/// True when `location` names an HTTP(S) resource rather than a local path.
pub fn is_http_url(location: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        location
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}
