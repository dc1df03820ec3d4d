//! Retrieval of the raw record table and the stop catalog.
//!
//! Any failure to obtain a source, including a non-success HTTP status, is
//! reported as [`PipelineError::Retrieval`] and is never retried.

mod basic;

pub use basic::BasicClient;

use async_trait::async_trait;
use reqwest::{Request, Response, StatusCode};
use tracing::debug;

use crate::error::{PipelineError, Result};

#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

fn retrieval_error(url: &str, reason: impl ToString) -> PipelineError {
    PipelineError::Retrieval {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Fails unless `status` is a 2xx code.
pub fn check_status(url: &str, status: StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(retrieval_error(url, format!("status {status}")))
    }
}

/// Downloads the body at `url`.
#[tracing::instrument(skip(client))]
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = url.parse::<reqwest::Url>().map_err(|e| retrieval_error(url, e))?;
    let req = Request::new(reqwest::Method::GET, parsed);

    let resp = client
        .execute(req)
        .await
        .map_err(|e| retrieval_error(url, e))?;
    check_status(url, resp.status())?;

    let bytes = resp.bytes().await.map_err(|e| retrieval_error(url, e))?;
    debug!(bytes = bytes.len(), "Source downloaded");
    Ok(bytes.to_vec())
}

/// Loads a source from an HTTP(S) URL or a local file path.
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(client, source).await
    } else {
        std::fs::read(source).map_err(|e| retrieval_error(source, e))
    }
}
