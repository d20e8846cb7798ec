use async_trait::async_trait;
use reqwest::{Request, Response};

/// Minimal HTTP seam so downloads can be wrapped or faked.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
