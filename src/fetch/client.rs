use async_trait::async_trait;
use reqwest::{Request, Response};

/// Transport used to pull the station and trip feeds over HTTP.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
