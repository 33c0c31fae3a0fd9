use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use bytes::Bytes;
use tracing::{debug, info};

use super::{DataSource, SourceId};
use crate::config::BlobConnection;
use crate::error::PipelineError;

/// Builds an S3-compatible client for the given connection.
///
/// Credentials come only from the connection; nothing is picked up from
/// the ambient AWS profile.
pub async fn blob_client(conn: &BlobConnection) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        conn.access_key_id.clone(),
        conn.secret_access_key().to_string(),
        None,
        None,
        "connection-string",
    );

    let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(conn.region.clone()))
        .endpoint_url(&conn.endpoint)
        .credentials_provider(credentials)
        .load()
        .await;

    let config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(conn.force_path_style)
        .build();

    info!(endpoint = %conn.endpoint, region = %conn.region, "Blob client configured");
    aws_sdk_s3::Client::from_conf(config)
}

/// A named object (`blob`) inside a bucket (`container`).
#[derive(Debug, Clone)]
pub struct BlobSource {
    client: aws_sdk_s3::Client,
    container: String,
    blob: String,
}

impl BlobSource {
    pub fn new(client: aws_sdk_s3::Client, container: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            client,
            container: container.into(),
            blob: blob.into(),
        }
    }
}

#[async_trait]
impl DataSource for BlobSource {
    fn id(&self) -> SourceId {
        SourceId::Blob {
            container: self.container.clone(),
            blob: self.blob.clone(),
        }
    }

    #[tracing::instrument(skip(self), fields(container = %self.container, blob = %self.blob))]
    async fn read_bytes(&self) -> Result<Bytes, PipelineError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.container)
            .key(&self.blob)
            .send()
            .await
            .map_err(|e| PipelineError::source_unavailable(self.id(), DisplayErrorContext(e)))?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| PipelineError::source_unavailable(self.id(), e))?
            .into_bytes();

        debug!(bytes = body.len(), "Downloaded blob");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> aws_sdk_s3::Client {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }

    #[test]
    fn test_id_carries_container_and_blob() {
        let source = BlobSource::new(offline_client(), "datasets", "All_Diets.csv");
        assert_eq!(
            source.id(),
            SourceId::Blob {
                container: "datasets".into(),
                blob: "All_Diets.csv".into()
            }
        );
    }

    #[tokio::test]
    async fn test_client_from_connection_uses_its_region() {
        let conn = BlobConnection::parse(
            "Endpoint=http://127.0.0.1:9000;AccessKeyId=local;SecretAccessKey=local-secret;Region=eu-central-1",
        )
        .unwrap();
        let client = blob_client(&conn).await;
        assert_eq!(
            client.config().region().map(|r| r.as_ref()),
            Some("eu-central-1")
        );
    }
}
