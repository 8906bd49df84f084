//! Image generation with backend fallback.
//!
//! [`ImageFallbackHandler`] turns a script into one image per panel. It tries
//! an ordered list of backend passes and never returns an error: panels that
//! could not be generated come back as `None`.
//!
//! Passes, each only when the previous one produced no image at all:
//!
//! 1. primary backend, per-panel prompts from the parsed script
//! 2. secondary backend, the same prompts
//! 3. primary backend, a simplified prompt built from the original story
//!
//! Within a pass a content rejection is retried once with a prompt built from
//! the original story, and a rate limit is retried after a backoff, up to the
//! configured number of attempts per panel.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::{ImageBackend, ImageFailure, ImagePayload};
use crate::domain::{
    AttemptOutcome, FailureKind, GenerationAttempt, PANEL_COUNT, PanelFields, PromptVariant,
};
use crate::parser::{filter_content, format_script, parse_panels, safe_prompt};

const MAX_PROMPT_CHARS: usize = 1000;
const GENERIC_STORY_CHARS: usize = 300;

/// Spaces out calls to one backend using the time of the last call.
///
/// Process-local: concurrent runs share it only when they share the handler.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Records that a call is being made now.
    pub async fn mark_call(&self) {
        *self.last_call.lock().await = Some(Instant::now());
    }

    /// Time left until `interval` has passed since the last call.
    pub async fn remaining(&self) -> Duration {
        self.last_call
            .lock()
            .await
            .map_or(Duration::ZERO, |last| {
                self.interval.saturating_sub(last.elapsed())
            })
    }

    pub async fn backoff(&self) {
        let wait = self.remaining().await;
        if !wait.is_zero() {
            debug!(wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX), "Backing off");
            tokio::time::sleep(wait).await;
        }
    }
}

/// A backend together with its own rate limiter.
pub struct BackendSlot {
    backend: Arc<dyn ImageBackend>,
    limiter: RateLimiter,
}

impl BackendSlot {
    #[must_use]
    pub fn new(backend: Arc<dyn ImageBackend>, interval: Duration) -> Self {
        Self {
            backend,
            limiter: RateLimiter::new(interval),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.backend.name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelImage {
    pub payload: ImagePayload,
    pub backend: String,
    pub prompt_variant: PromptVariant,
}

/// Outcome of one handler invocation. `panels` always has [`PANEL_COUNT`] entries.
#[derive(Debug, Default)]
pub struct PanelImages {
    pub panels: Vec<Option<PanelImage>>,
    pub attempts: Vec<GenerationAttempt>,
}

impl PanelImages {
    #[must_use]
    pub fn generated(&self) -> usize {
        self.panels.iter().filter(|p| p.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generated() == 0
    }
}

pub struct ImageFallbackHandler {
    primary: BackendSlot,
    secondary: Option<BackendSlot>,
    attempts_per_panel: u32,
}

impl ImageFallbackHandler {
    #[must_use]
    pub fn new(primary: BackendSlot, secondary: Option<BackendSlot>, attempts_per_panel: u32) -> Self {
        Self {
            primary,
            secondary,
            attempts_per_panel: attempts_per_panel.max(1),
        }
    }

    /// Generates one image per panel of `script`.
    pub async fn generate_panel_images(
        &self,
        script: &str,
        original_story: &str,
        style: &str,
    ) -> PanelImages {
        let fields = parse_panels(script);
        let prompts: Vec<String> = (0..PANEL_COUNT)
            .map(|i| panel_prompt(fields.get(i), script, style, i))
            .collect();
        let fallback_prompt = story_prompt(original_story, style);

        let mut result = PanelImages::default();

        result.panels = self
            .run_pass(&self.primary, &prompts, PromptVariant::PrimaryScript, Some(&fallback_prompt), &mut result.attempts)
            .await;
        if !result.is_empty() {
            return result;
        }
        warn!(backend = self.primary.name(), "Primary backend produced no panels");

        if let Some(secondary) = &self.secondary {
            result.panels = self
                .run_pass(secondary, &prompts, PromptVariant::PrimaryScript, Some(&fallback_prompt), &mut result.attempts)
                .await;
            if !result.is_empty() {
                return result;
            }
            warn!(backend = secondary.name(), "Secondary backend produced no panels");
        }

        let generic = generic_prompt(original_story, style);
        let generic_prompts = vec![generic; PANEL_COUNT];
        result.panels = self
            .run_pass(&self.primary, &generic_prompts, PromptVariant::GenericFallback, None, &mut result.attempts)
            .await;

        if result.is_empty() {
            warn!("All image generation attempts failed");
        }
        result
    }

    async fn run_pass(
        &self,
        slot: &BackendSlot,
        prompts: &[String],
        variant: PromptVariant,
        rejection_prompt: Option<&str>,
        attempts: &mut Vec<GenerationAttempt>,
    ) -> Vec<Option<PanelImage>> {
        let mut panels = Vec::with_capacity(prompts.len());
        for (panel, prompt) in prompts.iter().enumerate() {
            let image = self
                .generate_panel(slot, panel, prompt, variant, rejection_prompt, attempts)
                .await;
            panels.push(image);
        }
        info!(
            backend = slot.name(),
            variant = variant.as_str(),
            generated = panels.iter().filter(|p| p.is_some()).count(),
            "Image pass finished"
        );
        panels
    }

    async fn generate_panel(
        &self,
        slot: &BackendSlot,
        panel: usize,
        prompt: &str,
        variant: PromptVariant,
        rejection_prompt: Option<&str>,
        attempts: &mut Vec<GenerationAttempt>,
    ) -> Option<PanelImage> {
        let mut prompt = prompt.to_string();
        let mut variant = variant;
        let mut rejection_prompt = rejection_prompt;
        let mut rate_limited = 0;
        let mut retry_count = 0;

        loop {
            slot.limiter.mark_call().await;
            let outcome = slot.backend.generate_image(&prompt).await;
            let recorded = outcome
                .as_ref()
                .map_or_else(|f| AttemptOutcome::from(f.kind), |_| AttemptOutcome::Success);
            record_attempt(attempts, slot.name(), panel, variant, recorded, retry_count);
            retry_count += 1;

            match outcome {
                Ok(payload) => {
                    return Some(PanelImage {
                        payload,
                        backend: slot.name().to_string(),
                        prompt_variant: variant,
                    });
                }
                Err(ImageFailure {
                    kind: FailureKind::RateLimited,
                    message,
                }) => {
                    rate_limited += 1;
                    if rate_limited >= self.attempts_per_panel {
                        warn!(backend = slot.name(), panel = panel + 1, %message, "Rate limited, giving up on panel");
                        return None;
                    }
                    slot.limiter.backoff().await;
                }
                Err(ImageFailure {
                    kind: FailureKind::ContentRejected,
                    message,
                }) => {
                    let Some(retry) = rejection_prompt.take() else {
                        warn!(backend = slot.name(), panel = panel + 1, %message, "Content rejected, giving up on panel");
                        return None;
                    };
                    info!(backend = slot.name(), panel = panel + 1, "Content rejected, retrying with original story");
                    prompt = retry.to_string();
                    variant = PromptVariant::OriginalStory;
                }
                Err(ImageFailure {
                    kind: FailureKind::Other,
                    message,
                }) => {
                    warn!(backend = slot.name(), panel = panel + 1, %message, "Image generation failed");
                    return None;
                }
            }
        }
    }
}

fn record_attempt(
    attempts: &mut Vec<GenerationAttempt>,
    backend: &str,
    panel: usize,
    variant: PromptVariant,
    outcome: AttemptOutcome,
    retry_count: u32,
) {
    metrics::counter!(
        "image_attempts_total",
        "backend" => backend.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    debug!(
        backend,
        panel = panel + 1,
        variant = variant.as_str(),
        outcome = outcome.as_str(),
        retry_count,
        "Image attempt"
    );
    attempts.push(GenerationAttempt {
        backend: backend.to_string(),
        panel,
        prompt_variant: variant,
        outcome,
        retry_count,
    });
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Prompt for panel `index` from its parsed fields, or from the whole script
/// when the panel has none.
#[must_use]
pub fn panel_prompt(fields: Option<&PanelFields>, script: &str, style: &str, index: usize) -> String {
    let header = format!(
        "{style} style comic panel {} of {PANEL_COUNT}.",
        index + 1
    );

    let body = match fields.filter(|f| !f.is_empty()) {
        Some(f) => [
            ("Frame", &f.frame),
            ("Setting", &f.setting),
            ("Characters", &f.characters),
            ("Action", &f.action),
            ("Dialogue", &f.dialogue),
        ]
        .iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{label}: {v}")))
        .collect::<Vec<_>>()
        .join(" "),
        None => format!("Illustrating: {}", format_script(script).replace('\n', " ")),
    };

    truncate_chars(&format!("{header} {}", filter_content(&body)), MAX_PROMPT_CHARS)
}

/// Prompt built from the unprocessed story, used after a content rejection.
#[must_use]
pub fn story_prompt(story: &str, style: &str) -> String {
    let description = format!("{style} style comic panel. {}", filter_content(story));
    truncate_chars(&safe_prompt(&description), MAX_PROMPT_CHARS)
}

/// Heavily simplified last-resort prompt.
#[must_use]
pub fn generic_prompt(story: &str, style: &str) -> String {
    format!(
        "A simple {style} comic illustration of: {}",
        truncate_chars(&filter_content(story), GENERIC_STORY_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Backend replaying a fixed list of outcomes, then repeating the last one.
    struct Scripted {
        name: &'static str,
        outcomes: StdMutex<VecDeque<Result<ImagePayload, ImageFailure>>>,
        prompts: StdMutex<Vec<String>>,
    }

    impl Scripted {
        fn new(name: &'static str, outcomes: Vec<Result<ImagePayload, ImageFailure>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcomes: StdMutex::new(outcomes.into()),
                prompts: StdMutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl ImageBackend for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, ImageFailure> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.len() > 1 {
                outcomes.pop_front().unwrap()
            } else {
                outcomes.front().cloned().unwrap()
            }
        }
    }

    fn ok() -> Result<ImagePayload, ImageFailure> {
        Ok(ImagePayload::Bytes(vec![1, 2, 3]))
    }

    fn slot(backend: Arc<Scripted>) -> BackendSlot {
        BackendSlot::new(backend, Duration::from_millis(1))
    }

    const SCRIPT: &str = "Panel 1:\nAction: a bear walks\nPanel 2:\nAction: a bear eats\nPanel 3:\nAction: a bear sleeps\n";

    #[tokio::test]
    async fn primary_success_uses_script_prompts() {
        let primary = Scripted::new("a", vec![ok()]);
        let handler = ImageFallbackHandler::new(slot(primary.clone()), None, 2);

        let images = handler.generate_panel_images(SCRIPT, "A bear.", "noir").await;

        assert_eq!(images.generated(), 3);
        assert_eq!(primary.calls(), 3);
        let prompts = primary.prompts.lock().unwrap().clone();
        assert!(prompts[1].contains("panel 2 of 3"));
        assert!(prompts[1].contains("Action: a bear eats"));
    }

    #[tokio::test]
    async fn content_rejection_retries_with_story_once() {
        let primary = Scripted::new(
            "a",
            vec![
                Err(ImageFailure::content_rejected("no")),
                ok(),
                ok(),
                ok(),
            ],
        );
        let handler = ImageFallbackHandler::new(slot(primary.clone()), None, 2);

        let images = handler.generate_panel_images(SCRIPT, "A bear story.", "noir").await;

        assert_eq!(images.generated(), 3);
        assert_eq!(primary.calls(), 4);
        let first = images.panels[0].as_ref().unwrap();
        assert_eq!(first.prompt_variant, PromptVariant::OriginalStory);
        let prompts = primary.prompts.lock().unwrap().clone();
        assert!(prompts[1].starts_with("Create a family-friendly"));
    }

    #[tokio::test]
    async fn rate_limit_gives_up_after_two_attempts() {
        let primary = Scripted::new(
            "a",
            vec![
                Err(ImageFailure::rate_limited("slow down")),
                Err(ImageFailure::rate_limited("slow down")),
                ok(),
            ],
        );
        let handler = ImageFallbackHandler::new(slot(primary.clone()), None, 2);

        let images = handler.generate_panel_images(SCRIPT, "A bear.", "noir").await;

        assert!(images.panels[0].is_none());
        assert_eq!(images.generated(), 2);
        assert_eq!(primary.calls(), 4);
        assert_eq!(images.attempts[1].retry_count, 1);
    }

    #[tokio::test]
    async fn falls_back_to_secondary_when_primary_fails_entirely() {
        let primary = Scripted::new("a", vec![Err(ImageFailure::other("boom"))]);
        let secondary = Scripted::new("b", vec![ok()]);
        let handler =
            ImageFallbackHandler::new(slot(primary.clone()), Some(slot(secondary.clone())), 2);

        let images = handler.generate_panel_images(SCRIPT, "A bear.", "noir").await;

        assert_eq!(images.generated(), 3);
        assert!(images.panels.iter().flatten().all(|p| p.backend == "b"));
        assert_eq!(primary.calls(), 3);
    }

    #[tokio::test]
    async fn last_resort_uses_generic_prompt_on_primary() {
        let primary = Scripted::new(
            "a",
            vec![
                Err(ImageFailure::other("x")),
                Err(ImageFailure::other("x")),
                Err(ImageFailure::other("x")),
                ok(),
            ],
        );
        let secondary = Scripted::new("b", vec![Err(ImageFailure::other("down"))]);
        let handler =
            ImageFallbackHandler::new(slot(primary.clone()), Some(slot(secondary)), 2);

        let images = handler.generate_panel_images(SCRIPT, "A bear.", "noir").await;

        assert_eq!(images.generated(), 3);
        assert!(
            images
                .panels
                .iter()
                .flatten()
                .all(|p| p.prompt_variant == PromptVariant::GenericFallback)
        );
        let prompts = primary.prompts.lock().unwrap().clone();
        assert!(prompts[3].starts_with("A simple noir comic illustration of:"));
    }

    #[tokio::test]
    async fn exhaustion_returns_all_none() {
        let primary = Scripted::new("a", vec![Err(ImageFailure::content_rejected("no"))]);
        let secondary = Scripted::new("b", vec![Err(ImageFailure::content_rejected("no"))]);
        let handler = ImageFallbackHandler::new(slot(primary), Some(slot(secondary)), 2);

        let images = handler.generate_panel_images(SCRIPT, "A bear.", "noir").await;

        assert_eq!(images.panels.len(), PANEL_COUNT);
        assert!(images.is_empty());
        assert!(
            images
                .attempts
                .iter()
                .all(|a| a.outcome == AttemptOutcome::ContentRejected)
        );
    }

    #[test]
    fn panel_prompt_without_fields_uses_script() {
        let prompt = panel_prompt(None, "**A bear** in town\n\n+ with friends", "manga", 0);
        assert!(prompt.starts_with("manga style comic panel 1 of 3."));
        assert!(prompt.contains("A bear in town with friends"));
    }

    #[test]
    fn prompts_are_filtered() {
        let prompt = generic_prompt("A gun was found by the river.", "noir");
        assert!(!prompt.contains("gun"));
        let prompt = story_prompt("A gun was found by the river.", "noir");
        assert!(!prompt.contains("gun"));
    }

    #[tokio::test]
    async fn rate_limiter_remaining() {
        let limiter = RateLimiter::new(Duration::from_secs(60));
        assert_eq!(limiter.remaining().await, Duration::ZERO);
        limiter.mark_call().await;
        assert!(limiter.remaining().await > Duration::from_secs(59));
    }
}
