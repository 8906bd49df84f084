use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{CollaboratorError, NarrationService, status_error};
use crate::config::NarrationConfig;

const SERVICE: &str = "ElevenLabs";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    style: f32,
}

#[derive(Clone)]
pub struct ElevenLabsClient {
    client: Client,
    config: NarrationConfig,
}

impl ElevenLabsClient {
    #[must_use]
    pub const fn with_shared_client(client: Client, config: NarrationConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl NarrationService for ElevenLabsClient {
    async fn synthesize_speech(
        &self,
        text: &str,
        voice_hint: &str,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let voice = if voice_hint.is_empty() {
            self.config.voice.as_str()
        } else {
            voice_hint
        };
        let url = format!(
            "{}/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencode(voice)
        );

        debug!(voice, chars = text.len(), "Requesting narration");

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header("accept", "audio/mpeg")
            .json(&SpeechRequest {
                text,
                voice_settings: VoiceSettings {
                    stability: self.config.stability,
                    style: self.config.style,
                },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(CollaboratorError::Empty(SERVICE));
        }
        Ok(bytes.to_vec())
    }
}

fn urlencode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}
