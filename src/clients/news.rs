use chrono::Local;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CollaboratorError, EventSource, NewsEvent, status_error};
use crate::config::EventsConfig;

const SERVICE: &str = "News search";

const SYSTEM_PROMPT: &str = "You are a seasoned local news reporter with deep connections to \
regional stories. Answer with a JSON list of events only. Each event is an object with \
'title', 'story' and 'full_story_source_url' fields.";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Event source backed by an online-search chat model with an
/// OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    config: EventsConfig,
    lookback_days: u32,
}

impl NewsClient {
    #[must_use]
    pub const fn with_shared_client(client: Client, config: EventsConfig, lookback_days: u32) -> Self {
        Self {
            client,
            config,
            lookback_days,
        }
    }
}

/// Extracts the JSON event list from a model answer, tolerating code fences
/// and prose around the array.
fn parse_events(content: &str) -> Result<Vec<NewsEvent>, CollaboratorError> {
    let cleaned = content.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    if let Ok(events) = serde_json::from_str::<Vec<NewsEvent>>(cleaned) {
        return Ok(events);
    }

    let (Some(start), Some(end)) = (cleaned.find('['), cleaned.rfind(']')) else {
        return Err(CollaboratorError::Decode {
            service: SERVICE,
            message: "No JSON list in response".to_string(),
        });
    };
    if end < start {
        return Err(CollaboratorError::Decode {
            service: SERVICE,
            message: "No JSON list in response".to_string(),
        });
    }

    serde_json::from_str(&cleaned[start..=end]).map_err(|e| CollaboratorError::Decode {
        service: SERVICE,
        message: e.to_string(),
    })
}

#[async_trait::async_trait]
impl EventSource for NewsClient {
    async fn fetch_events(&self, location: &str) -> Result<Vec<NewsEvent>, CollaboratorError> {
        let today = Local::now().format("%B %d, %Y");
        let query = format!(
            "Please provide a list of current news events happening in {location} as of \
{today}. Only include events from the last {} days.",
            self.lookback_days
        );

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let request = CompletionRequest {
            model: &self.config.model,
            messages: [
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: &query,
                },
            ],
        };

        debug!(location, "Fetching local events");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(SERVICE, response).await);
        }

        let body: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| CollaboratorError::Decode {
                    service: SERVICE,
                    message: e.to_string(),
                })?;

        let Some(choice) = body.choices.into_iter().next() else {
            return Err(CollaboratorError::Empty(SERVICE));
        };

        let events = parse_events(&choice.message.content).inspect_err(|e| {
            warn!(location, error = %e, "Could not parse event list");
        })?;

        Ok(events
            .into_iter()
            .filter(|e| !e.story.trim().is_empty())
            .collect())
    }
}
