use aws_sdk_s3::error::DisplayErrorContext;
use serde::Serialize;
use tracing::info;

use crate::analyzers::types::RunResult;
use crate::error::PipelineError;

/// Serializes a value to JSON and uploads it with `application/json` content type.
pub async fn write_json_to_blob(
    client: &aws_sdk_s3::Client,
    container: &str,
    key: &str,
    value: &impl Serialize,
) -> Result<(), PipelineError> {
    let target = format!("{container}/{key}");
    let body = serde_json::to_vec_pretty(value).map_err(|e| PipelineError::sink(&target, e))?;

    client
        .put_object()
        .bucket(container)
        .key(key)
        .body(body.into())
        .content_type("application/json")
        .send()
        .await
        .map_err(|e| PipelineError::sink(&target, DisplayErrorContext(e)))?;

    Ok(())
}

/// Uploads `results.json` and `avg_macros.json` under `prefix`.
#[tracing::instrument(skip(client, result))]
pub async fn publish_results(
    client: &aws_sdk_s3::Client,
    container: &str,
    prefix: &str,
    result: &RunResult,
) -> Result<Vec<String>, PipelineError> {
    let results_key = join_key(prefix, "results.json");
    let averages_key = join_key(prefix, "avg_macros.json");

    write_json_to_blob(client, container, &results_key, result).await?;
    write_json_to_blob(client, container, &averages_key, &result.avg_macros_by_diet_type).await?;

    info!(container, results_key, averages_key, "Published results to blob store");
    Ok(vec![results_key, averages_key])
}

fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}
