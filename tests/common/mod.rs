//! In-process collaborators for driving full pipeline runs.
#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use comicforge::clients::{
    CollaboratorError, EventSource, GeneratedScript, ImageBackend, ImageFailure, ImagePayload,
    MediaDescriber, NarrationService, NewsEvent, ScriptGenerator,
};
use comicforge::db::{ComicStore, Store};
use comicforge::domain::{ComicFilter, ComicRecord, NewComic};
use comicforge::services::{
    ArtifactWriter, BackendSlot, ComicPipeline, DuplicateDetector, ImageFallbackHandler,
    MediaService, PipelineParts,
};

pub const SCRIPT: &str = "\
Panel 1: Frame: wide. Setting: a riverside town. Characters: a black bear. Action: the bear wanders into the bakery.
Panel 2: Frame: close. Setting: the bakery. Characters: the baker. Action: the baker drops a tray.
Panel 3: Frame: wide. Setting: main street. Characters: the bear. Action: the bear leaves with a loaf.
";

pub const SUMMARY: &str = "\
Summary:
Panel 1: A bear visits the bakery.
Panel 2: The baker is startled.
Panel 3: The bear leaves with bread.
";

#[derive(Default)]
pub struct FakeScript {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub premises: Mutex<Vec<String>>,
}

impl FakeScript {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn premises(&self) -> Vec<String> {
        self.premises.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ScriptGenerator for FakeScript {
    async fn generate_script(
        &self,
        premise: &str,
        _location: &str,
        _style: &str,
    ) -> Result<GeneratedScript, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.premises.lock().unwrap().push(premise.to_string());
        if self.fail {
            return Err(CollaboratorError::Other("model offline".to_string()));
        }
        Ok(GeneratedScript {
            script: SCRIPT.to_string(),
            summary: SUMMARY.to_string(),
        })
    }
}

type Responder = Box<dyn Fn(&str) -> Result<ImagePayload, ImageFailure> + Send + Sync>;

/// Image backend answering each prompt through a closure and recording prompts.
pub struct FakeImages {
    name: &'static str,
    respond: Responder,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeImages {
    pub fn new(
        name: &'static str,
        respond: impl Fn(&str) -> Result<ImagePayload, ImageFailure> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            respond: Box::new(respond),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn succeeding(name: &'static str) -> Arc<Self> {
        Self::new(name, |_| Ok(ImagePayload::Bytes(b"png".to_vec())))
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Self::new(name, |_| Err(ImageFailure::other("HTTP 500")))
    }

    pub fn rejecting(name: &'static str) -> Arc<Self> {
        Self::new(name, |_| Err(ImageFailure::content_rejected("safety system")))
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ImageBackend for FakeImages {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, ImageFailure> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        (self.respond)(prompt)
    }
}

#[derive(Default)]
pub struct FakeEvents {
    pub events: Vec<NewsEvent>,
}

impl FakeEvents {
    pub fn with_stories(count: usize) -> Self {
        let topics = [
            "A black bear wandered into the downtown bakery on Main Street before dawn.",
            "Council approved a new footbridge across the Fraser River after a long debate.",
            "Volunteer firefighters held their annual pancake breakfast at the community hall.",
            "The school robotics team won the provincial championship with a sorting robot.",
        ];
        Self {
            events: (0..count)
                .map(|i| NewsEvent {
                    title: format!("Story {}", i + 1),
                    story: topics[i % topics.len()].to_string(),
                    source_url: Some(format!("https://news.example/{}", i + 1)),
                })
                .collect(),
        }
    }
}

#[async_trait::async_trait]
impl EventSource for FakeEvents {
    async fn fetch_events(&self, _location: &str) -> Result<Vec<NewsEvent>, CollaboratorError> {
        Ok(self.events.clone())
    }
}

pub struct FakeDescriber;

#[async_trait::async_trait]
impl MediaDescriber for FakeDescriber {
    async fn describe_video(&self, _path: &Path) -> Result<String, CollaboratorError> {
        Ok("A video of a parade along the waterfront".to_string())
    }

    async fn describe_image(&self, _path: &Path) -> Result<String, CollaboratorError> {
        Ok("A photo of a harbour at sunset".to_string())
    }
}

pub struct FakeNarration {
    pub fail: bool,
    pub texts: Mutex<Vec<String>>,
}

impl FakeNarration {
    pub fn speaking() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            texts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.texts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl NarrationService for FakeNarration {
    async fn synthesize_speech(
        &self,
        text: &str,
        _voice_hint: &str,
    ) -> Result<Vec<u8>, CollaboratorError> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(CollaboratorError::Status {
                service: "Narration",
                status: 401,
                body: "invalid api key".to_string(),
            });
        }
        Ok(b"mp3".to_vec())
    }
}

/// Store that reads through to `inner` but rejects every insert.
pub struct ReadOnlyStore {
    pub inner: Store,
}

#[async_trait::async_trait]
impl ComicStore for ReadOnlyStore {
    async fn find_by_story(&self, story: &str) -> anyhow::Result<Option<ComicRecord>> {
        self.inner.find_by_story(story).await
    }

    async fn insert(&self, _comic: &NewComic) -> anyhow::Result<ComicRecord> {
        anyhow::bail!("database is locked")
    }

    async fn list_by_filter(&self, filter: &ComicFilter) -> anyhow::Result<Vec<ComicRecord>> {
        self.inner.list_by_filter(filter).await
    }

    async fn get(&self, id: i64) -> anyhow::Result<Option<ComicRecord>> {
        self.inner.get(id).await
    }

    async fn unique_locations(&self) -> anyhow::Result<Vec<String>> {
        self.inner.unique_locations().await
    }

    async fn purge(&self) -> anyhow::Result<u64> {
        self.inner.purge().await
    }
}

pub struct Harness {
    pub pipeline: Arc<ComicPipeline>,
    pub store: Store,
    pub script: Arc<FakeScript>,
    pub output: tempfile::TempDir,
}

pub struct HarnessBuilder {
    script: Arc<FakeScript>,
    events: FakeEvents,
    primary: Arc<FakeImages>,
    secondary: Option<Arc<FakeImages>>,
    narration: Option<Arc<FakeNarration>>,
    read_only: bool,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            script: Arc::new(FakeScript::default()),
            events: FakeEvents::default(),
            primary: FakeImages::succeeding("primary"),
            secondary: None,
            narration: None,
            read_only: false,
        }
    }

    pub fn narration(mut self, narration: Arc<FakeNarration>) -> Self {
        self.narration = Some(narration);
        self
    }

    /// Every insert fails; reads still reach the real store.
    pub fn read_only_store(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn script(mut self, script: FakeScript) -> Self {
        self.script = Arc::new(script);
        self
    }

    pub fn events(mut self, events: FakeEvents) -> Self {
        self.events = events;
        self
    }

    pub fn primary(mut self, backend: Arc<FakeImages>) -> Self {
        self.primary = backend;
        self
    }

    pub fn secondary(mut self, backend: Arc<FakeImages>) -> Self {
        self.secondary = Some(backend);
        self
    }

    pub async fn build(self) -> Harness {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let output = tempfile::tempdir().unwrap();

        let primary: Arc<dyn ImageBackend> = self.primary;
        let secondary = self.secondary.map(|b| {
            let backend: Arc<dyn ImageBackend> = b;
            BackendSlot::new(backend, Duration::ZERO)
        });
        let images = ImageFallbackHandler::new(BackendSlot::new(primary, Duration::ZERO), secondary, 2);

        let pipeline_store: Arc<dyn ComicStore> = if self.read_only {
            Arc::new(ReadOnlyStore {
                inner: store.clone(),
            })
        } else {
            Arc::new(store.clone())
        };
        let narration = self.narration.map(|n| {
            let service: Arc<dyn NarrationService> = n;
            service
        });

        let pipeline = ComicPipeline::new(PipelineParts {
            store: pipeline_store,
            script: self.script.clone(),
            events: Arc::new(self.events),
            describer: Arc::new(FakeDescriber),
            narration,
            images: Arc::new(images),
            artifacts: ArtifactWriter::new(reqwest::Client::new(), output.path()),
            media: MediaService::new(),
            detector: DuplicateDetector::new(0.9),
            default_style: "cartoon".to_string(),
        });

        Harness {
            pipeline: Arc::new(pipeline),
            store,
            script: self.script,
            output,
        }
    }
}
