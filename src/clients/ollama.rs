use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CollaboratorError, GeneratedScript, ScriptGenerator, status_error};
use crate::config::ScriptConfig;
use crate::parser::split_summary;

const SERVICE: &str = "Ollama";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            images: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

/// Client for an Ollama-compatible `/api/chat` endpoint.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    #[must_use]
    pub fn with_shared_client(client: Client, config: &ScriptConfig) -> Self {
        Self::for_model(client, &config.base_url, &config.model)
    }

    #[must_use]
    pub fn for_model(client: Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub(crate) async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, CollaboratorError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        debug!(model = %self.model, "Sending chat request");

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Decode {
                service: SERVICE,
                message: e.to_string(),
            })?;

        let content = body.message.content.trim().to_string();
        if content.is_empty() {
            return Err(CollaboratorError::Empty(SERVICE));
        }
        Ok(content)
    }
}

fn script_system_prompt(location: &str, style: &str) -> String {
    format!(
        "You are a comic scriptwriter working with an image generator. Write a detailed \
three-panel comic strip script set in {location}, drawn in the style of {style}. \
For each panel write a line \"Panel N:\" followed by the lines \"Frame:\", \"Setting:\", \
\"Characters:\", \"Action:\" and \"Dialogue:\". Describe characters' appearance and clothing, \
the scene's mood and local landmarks, body language, and where speech bubbles sit. \
After the three panels write a line \"Summary:\" followed by one line per panel in the form \
\"Panel N: <one sentence caption>\"."
    )
}

#[async_trait::async_trait]
impl ScriptGenerator for OllamaClient {
    async fn generate_script(
        &self,
        premise: &str,
        location: &str,
        style: &str,
    ) -> Result<GeneratedScript, CollaboratorError> {
        let content = self
            .chat(vec![
                ChatMessage::system(script_system_prompt(location, style)),
                ChatMessage::user(premise),
            ])
            .await?;

        let (_, summary) = split_summary(&content);
        let summary = summary.to_string();

        Ok(GeneratedScript {
            script: content,
            summary,
        })
    }
}
