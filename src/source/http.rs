use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::client::HttpClient;
use super::{DataSource, SourceId};
use crate::error::PipelineError;

/// Issues a GET and returns the body. Non-2xx statuses are errors.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, PipelineError> {
    let unavailable = |e: &dyn std::fmt::Display| PipelineError::source_unavailable(url, e);

    let parsed = url.parse::<reqwest::Url>().map_err(|e| unavailable(&e))?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client
        .execute(req)
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| unavailable(&e))?;
    resp.bytes().await.map_err(|e| unavailable(&e))
}

/// A dataset served over HTTP(S).
pub struct HttpSource<C> {
    client: C,
    url: String,
}

impl<C: HttpClient> HttpSource<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> DataSource for HttpSource<C> {
    fn id(&self) -> SourceId {
        SourceId::Url {
            url: self.url.clone(),
        }
    }

    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn read_bytes(&self) -> Result<Bytes, PipelineError> {
        let bytes = fetch_bytes(&self.client, &self.url).await?;
        debug!(bytes = bytes.len(), "Downloaded dataset");
        Ok(bytes)
    }
}
