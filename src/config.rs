//! Blob-store connection settings.
//!
//! A connection string is a `;`-separated list of `Key=Value` pairs:
//! ```text
//! Endpoint=http://127.0.0.1:9000;AccessKeyId=minioadmin;SecretAccessKey=<secret>;Region=us-east-1
//! ```
//! Keys are matched case-insensitively. `Endpoint`, `AccessKeyId` and
//! `SecretAccessKey` are required; `Region` defaults to `us-east-1` and
//! `ForcePathStyle` to `true` (local emulators such as MinIO need it).
//!
//! There is no built-in default. The value comes from the command line or
//! from the [`CONNECTION_STRING_ENV`] environment variable.

use std::fmt;

use crate::error::PipelineError;

/// Environment variable consulted when no connection string is passed explicitly.
pub const CONNECTION_STRING_ENV: &str = "BLOB_CONNECTION_STRING";

const DEFAULT_REGION: &str = "us-east-1";

#[derive(Clone, PartialEq, Eq)]
pub struct BlobConnection {
    pub endpoint: String,
    pub access_key_id: String,
    secret_access_key: String,
    pub region: String,
    pub force_path_style: bool,
}

impl BlobConnection {
    /// Parses a connection string.
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let mut endpoint = None;
        let mut access_key_id = None;
        let mut secret_access_key = None;
        let mut region = None;
        let mut force_path_style = true;

        for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // The pair is not echoed back: it may hold a secret.
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                PipelineError::Config("connection string entries must be Key=Value pairs".to_string())
            })?;
            let value = value.trim().to_string();

            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value),
                "accesskeyid" => access_key_id = Some(value),
                "secretaccesskey" => secret_access_key = Some(value),
                "region" => region = Some(value),
                "forcepathstyle" => {
                    force_path_style = value.parse::<bool>().map_err(|_| {
                        PipelineError::Config(format!("ForcePathStyle must be true or false, got '{value}'"))
                    })?;
                }
                other => {
                    return Err(PipelineError::Config(format!(
                        "unrecognized connection string key '{other}'"
                    )));
                }
            }
        }

        let require = |name: &str, v: Option<String>| {
            v.filter(|s| !s.is_empty())
                .ok_or_else(|| PipelineError::Config(format!("connection string is missing '{name}'")))
        };

        Ok(Self {
            endpoint: require("Endpoint", endpoint)?,
            access_key_id: require("AccessKeyId", access_key_id)?,
            secret_access_key: require("SecretAccessKey", secret_access_key)?,
            region: region
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            force_path_style,
        })
    }

    /// Resolves the connection from an explicit value, falling back to
    /// [`CONNECTION_STRING_ENV`].
    pub fn resolve(explicit: Option<&str>) -> Result<Self, PipelineError> {
        Self::resolve_with(explicit, |name| std::env::var(name).ok())
    }

    /// Same as [`BlobConnection::resolve`] with an injectable environment lookup.
    pub fn resolve_with(
        explicit: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, PipelineError> {
        match explicit {
            Some(raw) => Self::parse(raw),
            None => match env(CONNECTION_STRING_ENV) {
                Some(raw) => Self::parse(&raw),
                None => Err(PipelineError::Config(format!(
                    "no blob connection string given; pass --connection-string or set {CONNECTION_STRING_ENV}"
                ))),
            },
        }
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for BlobConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobConnection")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}
