//! Gemini `generateContent` image-edit provider.
//!
//! Sends the instruction plus two inline images (wall, artwork) and returns
//! the first non-empty inline image in the reply. All Gemini wire types are
//! private to this module.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::imagegen::{InlineImage, ProviderError};

const API_KEY_HEADER: &str = "x-goog-api-key";
const PING_TIMEOUT: Duration = Duration::from_secs(5);

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for the Gemini REST API.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_base_url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    pub fn new(
        api_base_url: String,
        model: String,
        timeout_seconds: u64,
        api_key: String,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, api_key })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.api_base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// HEAD the base URL. Any HTTP response counts as reachable; only a
    /// transport failure is an error.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        self.client
            .head(&self.api_base_url)
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::Request(format!("unreachable: {e}")))
    }

    /// One `generateContent` round-trip.
    pub async fn edit(
        &self,
        instruction: &str,
        wall: &InlineImage,
        artwork: &InlineImage,
    ) -> Result<InlineImage, ProviderError> {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::text(instruction),
                    Part::inline(wall),
                    Part::inline(artwork),
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["TEXT".into(), "IMAGE".into()],
            },
        };

        debug!(
            model = %self.model,
            wall_bytes = wall.data.len(),
            artwork_bytes = artwork.data.len(),
            "sending image edit request"
        );

        let url = self.endpoint();
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(%url, error = %e, timeout = e.is_timeout(), "image edit request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<GenerateContentResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize image edit response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        if let Some(text) = parsed.first_text() {
            trace!(text = %text, "model text part");
        }

        match parsed.first_image()? {
            Some(image) => {
                debug!(bytes = image.data.len(), mime = %image.mime_type, "received edited image");
                Ok(image)
            }
            None => {
                let reason = parsed
                    .prompt_feedback
                    .and_then(|f| f.block_reason)
                    .unwrap_or_else(|| "no inline image in response".to_string());
                debug!(%reason, "image edit returned no image");
                Err(ProviderError::NoImage)
            }
        }
    }
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(
        rename = "inlineData",
        alias = "inline_data",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    inline_data: Option<Blob>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self { text: Some(text.to_string()), inline_data: None }
    }

    fn inline(image: &InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: image.mime_type.clone(),
                data: BASE64.encode(&image.data),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Blob {
    #[serde(rename = "mimeType", alias = "mime_type", default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    fn first_text(&self) -> Option<&str> {
        self.parts().find_map(|p| p.text.as_deref())
    }

    /// First inline blob that decodes to a non-empty payload.
    fn first_image(&self) -> Result<Option<InlineImage>, ProviderError> {
        for blob in self.parts().filter_map(|p| p.inline_data.as_ref()) {
            if blob.data.is_empty() {
                continue;
            }
            let data = BASE64
                .decode(blob.data.as_bytes())
                .map_err(|e| ProviderError::Request(format!("invalid base64 image data: {e}")))?;
            if data.is_empty() {
                continue;
            }
            let mime_type = if blob.mime_type.is_empty() {
                crate::imagegen::sniff_mime(&data).to_string()
            } else {
                blob.mime_type.clone()
            };
            return Ok(Some(InlineImage { mime_type, data }));
        }
        Ok(None)
    }
}

// Error envelope used by Google APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Pass a successful response through; turn anything else into a
/// `ProviderError` carrying the API's message when it sent one.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(env) => {
            let tag = env.error.status.map(|s| format!(" [{s}]")).unwrap_or_default();
            format!("HTTP {status}{tag}: {}", env.error.message)
        }
        Err(_) => format!("HTTP {status}: {body}"),
    };

    error!(%status, %message, "image edit request returned HTTP error");
    Err(ProviderError::Request(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
    };
    use serde_json::{Value, json};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta/models")
    }

    fn provider(base: String, timeout_seconds: u64) -> GeminiProvider {
        GeminiProvider::new(base, "test-model".into(), timeout_seconds, "secret".into()).unwrap()
    }

    fn wall() -> InlineImage {
        InlineImage::new("image/jpeg", b"wall-bytes".to_vec())
    }

    fn art() -> InlineImage {
        InlineImage::new("image/png", b"art-bytes".to_vec())
    }

    #[tokio::test]
    async fn returns_first_inline_image() {
        async fn handler(
            Path(rest): Path<String>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> impl IntoResponse {
            assert_eq!(rest, "test-model:generateContent");
            assert_eq!(headers.get(API_KEY_HEADER).unwrap(), "secret");
            let parts = body["contents"][0]["parts"].as_array().unwrap();
            assert_eq!(parts.len(), 3);
            assert!(parts[0]["text"].as_str().unwrap().contains("place"));
            assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
            assert_eq!(parts[2]["inlineData"]["data"], BASE64.encode(b"art-bytes"));
            Json(json!({
                "candidates": [{
                    "content": { "parts": [
                        { "text": "Here you go" },
                        { "inlineData": { "mimeType": "image/png", "data": "" } },
                        { "inlineData": { "mimeType": "image/png", "data": BASE64.encode(b"edited") } }
                    ]}
                }]
            }))
        }

        let base = spawn(Router::new().route("/v1beta/models/{*rest}", post(handler))).await;
        let out = provider(base, 5).edit("place the art", &wall(), &art()).await.unwrap();
        assert_eq!(out.data, b"edited");
        assert_eq!(out.mime_type, "image/png");
    }

    #[tokio::test]
    async fn text_only_reply_is_no_image() {
        let router = Router::new().route(
            "/v1beta/models/{*rest}",
            post(|| async {
                Json(json!({ "candidates": [{ "content": { "parts": [{ "text": "sorry" }] } }] }))
            }),
        );
        let base = spawn(router).await;
        let err = provider(base, 5).edit("x", &wall(), &art()).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoImage));
    }

    #[tokio::test]
    async fn http_error_carries_api_message() {
        let router = Router::new().route(
            "/v1beta/models/{*rest}",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": { "code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT" } })),
                )
            }),
        );
        let base = spawn(router).await;
        match provider(base, 5).edit("x", &wall(), &art()).await {
            Err(ProviderError::Request(msg)) => {
                assert!(msg.contains("API key not valid"));
                assert!(msg.contains("INVALID_ARGUMENT"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let router = Router::new().route(
            "/v1beta/models/{*rest}",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({}))
            }),
        );
        let base = spawn(router).await;
        let err = provider(base, 1).edit("x", &wall(), &art()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Request(_)));
    }

    #[test]
    fn endpoint_joins_model() {
        let p = provider("http://host/v1beta/models/".into(), 1);
        assert_eq!(p.endpoint(), "http://host/v1beta/models/test-model:generateContent");
    }

    #[test]
    fn debug_hides_api_key() {
        let p = provider("http://host".into(), 1);
        assert!(!format!("{p:?}").contains("secret"));
    }
}
