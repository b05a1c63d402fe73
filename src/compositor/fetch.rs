//! Artwork image download.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("empty body")]
    Empty,
    #[error("no image url")]
    NoUrl,
}

/// Shared HTTP client for artwork images. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ArtworkFetcher {
    client: Client,
}

impl ArtworkFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .build()
            .map_err(|e| FetchError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// GET `url` within `timeout`. Non-2xx and empty bodies are errors.
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::NoUrl);
        }

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        if body.is_empty() {
            return Err(FetchError::Empty);
        }

        debug!(%url, bytes = body.len(), "fetched artwork image");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fetches_body() {
        let base = spawn(Router::new().route("/a.png", get(|| async { "pixels" }))).await;
        let fetcher = ArtworkFetcher::new().unwrap();
        let body = fetcher.fetch(&format!("{base}/a.png"), Duration::from_secs(2)).await.unwrap();
        assert_eq!(body, b"pixels");
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let base = spawn(Router::new().route("/gone", get(|| async { StatusCode::NOT_FOUND }))).await;
        let fetcher = ArtworkFetcher::new().unwrap();
        let err = fetcher.fetch(&format!("{base}/gone"), Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404)));
    }

    #[tokio::test]
    async fn empty_body_is_error() {
        let base = spawn(Router::new().route("/empty", get(|| async { "" }))).await;
        let fetcher = ArtworkFetcher::new().unwrap();
        let err = fetcher.fetch(&format!("{base}/empty"), Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, FetchError::Empty));
    }

    #[tokio::test]
    async fn blank_url_is_error() {
        let fetcher = ArtworkFetcher::new().unwrap();
        let err = fetcher.fetch("  ", Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, FetchError::NoUrl));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "late"
            }),
        );
        let base = spawn(router).await;
        let fetcher = ArtworkFetcher::new().unwrap();
        let err = fetcher
            .fetch(&format!("{base}/slow"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
