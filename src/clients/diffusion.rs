use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ImageBackend, ImageFailure, ImagePayload};
use crate::config::SecondaryImageConfig;

#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    steps: u32,
    cfg_scale: f32,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    nsfw_content_detected: Vec<bool>,
}

/// Image backend for a self-hosted diffusion server exposing `/sdapi/v1/txt2img`.
#[derive(Clone)]
pub struct DiffusionClient {
    client: Client,
    config: SecondaryImageConfig,
}

impl DiffusionClient {
    #[must_use]
    pub const fn with_shared_client(client: Client, config: SecondaryImageConfig) -> Self {
        Self { client, config }
    }
}

fn decode_first(response: Txt2ImgResponse) -> Result<ImagePayload, ImageFailure> {
    if response.nsfw_content_detected.first() == Some(&true) {
        return Err(ImageFailure::content_rejected(
            "Diffusion safety checker flagged the image",
        ));
    }

    let encoded = response
        .images
        .into_iter()
        .next()
        .ok_or_else(|| ImageFailure::other("Diffusion server returned no image"))?;

    // Some servers prefix a data URL header
    let encoded = encoded
        .split_once("base64,")
        .map_or(encoded.as_str(), |(_, data)| data);

    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map(ImagePayload::Bytes)
        .map_err(|e| ImageFailure::other(format!("Invalid base64 image: {e}")))
}

#[async_trait::async_trait]
impl ImageBackend for DiffusionClient {
    fn name(&self) -> &str {
        "diffusion"
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, ImageFailure> {
        let url = format!(
            "{}/sdapi/v1/txt2img",
            self.config.base_url.trim_end_matches('/')
        );
        let request = Txt2ImgRequest {
            prompt,
            steps: self.config.steps,
            cfg_scale: self.config.guidance_scale,
            width: 1024,
            height: 1024,
        };

        debug!(steps = self.config.steps, "Requesting diffusion image");

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ImageFailure::rate_limited("Diffusion server is busy"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageFailure::other(format!(
                "Diffusion API error: {status} - {body}"
            )));
        }

        decode_first(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;

    #[test]
    fn decodes_plain_and_data_url_images() {
        let plain = Txt2ImgResponse {
            images: vec!["aGVsbG8=".to_string()],
            nsfw_content_detected: vec![],
        };
        assert_eq!(
            decode_first(plain).unwrap(),
            ImagePayload::Bytes(b"hello".to_vec())
        );

        let data_url = Txt2ImgResponse {
            images: vec!["data:image/png;base64,aGVsbG8=".to_string()],
            nsfw_content_detected: vec![false],
        };
        assert_eq!(
            decode_first(data_url).unwrap(),
            ImagePayload::Bytes(b"hello".to_vec())
        );
    }

    #[test]
    fn flagged_image_is_content_rejected() {
        let flagged = Txt2ImgResponse {
            images: vec!["aGVsbG8=".to_string()],
            nsfw_content_detected: vec![true],
        };
        assert_eq!(
            decode_first(flagged).unwrap_err().kind,
            FailureKind::ContentRejected
        );
    }

    #[test]
    fn empty_response_is_other() {
        let empty = Txt2ImgResponse {
            images: vec![],
            nsfw_content_detected: vec![],
        };
        assert_eq!(decode_first(empty).unwrap_err().kind, FailureKind::Other);
    }
}
