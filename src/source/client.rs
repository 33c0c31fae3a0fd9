use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a prepared request. Lets [`super::HttpSource`] run against a stub in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
