use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ImageBackend, ImageFailure, ImagePayload};
use crate::config::PrimaryImageConfig;

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'a str,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Image backend for the OpenAI images API (`/images/generations`).
#[derive(Clone)]
pub struct OpenAiImageClient {
    client: Client,
    config: PrimaryImageConfig,
}

impl OpenAiImageClient {
    #[must_use]
    pub const fn with_shared_client(client: Client, config: PrimaryImageConfig) -> Self {
        Self { client, config }
    }
}

/// Maps an error response to a failure kind.
///
/// Content-policy rejections come back as 400 with code
/// `content_policy_violation`; older responses only mention the safety system.
fn classify(status: StatusCode, body: &str) -> ImageFailure {
    let (message, code) = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| (body.to_string(), None),
        |e| (e.error.message, e.error.code),
    );

    if status == StatusCode::TOO_MANY_REQUESTS || code.as_deref() == Some("rate_limit_exceeded") {
        return ImageFailure::rate_limited(message);
    }

    let rejected = code.as_deref() == Some("content_policy_violation")
        || message.to_lowercase().contains("safety system");
    if status == StatusCode::BAD_REQUEST && rejected {
        return ImageFailure::content_rejected(message);
    }

    ImageFailure::other(format!("OpenAI images API error: {status} - {message}"))
}

#[async_trait::async_trait]
impl ImageBackend for OpenAiImageClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, ImageFailure> {
        let url = format!(
            "{}/images/generations",
            self.config.base_url.trim_end_matches('/')
        );
        let request = ImageRequest {
            model: &self.config.model,
            prompt,
            size: &self.config.size,
            quality: &self.config.quality,
            n: 1,
        };

        debug!(model = %self.config.model, "Requesting image");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &body));
        }

        let body: ImageResponse = response.json().await?;
        let data = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ImageFailure::other("OpenAI returned no image"))?;

        if let Some(url) = data.url {
            return Ok(ImagePayload::Url(url));
        }

        let encoded = data
            .b64_json
            .ok_or_else(|| ImageFailure::other("OpenAI image had neither url nor b64_json"))?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map(ImagePayload::Bytes)
            .map_err(|e| ImageFailure::other(format!("Invalid base64 image: {e}")))
    }
}
