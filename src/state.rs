use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{Instrument, info_span};

use crate::clients::diffusion::DiffusionClient;
use crate::clients::elevenlabs::ElevenLabsClient;
use crate::clients::news::NewsClient;
use crate::clients::ollama::OllamaClient;
use crate::clients::openai::OpenAiImageClient;
use crate::clients::vision::VisionDescriber;
use crate::clients::{ImageBackend, NarrationService};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ArtifactWriter, BackendSlot, ComicPipeline, DuplicateDetector, ImageFallbackHandler,
    MediaService, PipelineParts, RunRequest, TaskRegistry,
};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// This client should be reused across all HTTP-based services to enable
/// connection pooling and avoid socket exhaustion.
pub fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent("Comicforge/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub pipeline: Arc<ComicPipeline>,

    pub tasks: Arc<TaskRegistry>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.general.request_timeout_seconds)?;
        let pipeline = Arc::new(build_pipeline(&config, &store, &http_client));

        Ok(Self::with_pipeline(config, store, pipeline))
    }

    /// State around an already assembled pipeline.
    #[must_use]
    pub fn with_pipeline(config: Config, store: Store, pipeline: Arc<ComicPipeline>) -> Self {
        let retention = Duration::from_secs(config.general.task_retention_seconds);
        Self {
            config: Arc::new(RwLock::new(config)),
            store,
            pipeline,
            tasks: Arc::new(TaskRegistry::with_retention(retention)),
        }
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Registers a task for `request` and runs it in the background.
    ///
    /// The run is detached from any consumer of its progress stream.
    pub async fn spawn_run(&self, request: RunRequest) -> String {
        let kind = request.kind();
        let parameters = serde_json::to_value(&request).unwrap_or_default();
        let task_id = self.tasks.start_task(kind, parameters).await;

        let Some(reporter) = self.tasks.reporter(&task_id).await else {
            return task_id;
        };
        let pipeline = Arc::clone(&self.pipeline);
        let span = info_span!("run", task_id = %task_id, kind = kind.as_str());

        // Both profiles abort on panic, so the run always ends through `finish`.
        tokio::spawn(
            async move {
                pipeline.run(&request, &reporter).await;
            }
            .instrument(span),
        );

        task_id
    }
}

/// Wires the HTTP collaborators described by `config` into a pipeline.
#[must_use]
pub fn build_pipeline(config: &Config, store: &Store, http_client: &reqwest::Client) -> ComicPipeline {
    let interval = config.image_call_interval();

    let primary: Arc<dyn ImageBackend> = Arc::new(OpenAiImageClient::with_shared_client(
        http_client.clone(),
        config.images.primary.clone(),
    ));
    let secondary = config.images.secondary.enabled.then(|| {
        let backend: Arc<dyn ImageBackend> = Arc::new(DiffusionClient::with_shared_client(
            http_client.clone(),
            config.images.secondary.clone(),
        ));
        BackendSlot::new(backend, interval)
    });
    let images = ImageFallbackHandler::new(
        BackendSlot::new(primary, interval),
        secondary,
        config.images.attempts_per_panel,
    );

    let narration = config.narration.enabled.then(|| {
        Arc::new(ElevenLabsClient::with_shared_client(
            http_client.clone(),
            config.narration.clone(),
        )) as Arc<dyn NarrationService>
    });

    let media = MediaService::new();
    let describer = VisionDescriber::new(
        OllamaClient::for_model(
            http_client.clone(),
            &config.media.base_url,
            &config.media.model,
        ),
        media.clone(),
        config.media.frames_per_video,
    );

    ComicPipeline::new(PipelineParts {
        store: Arc::new(store.clone()),
        script: Arc::new(OllamaClient::with_shared_client(
            http_client.clone(),
            &config.script,
        )),
        events: Arc::new(NewsClient::with_shared_client(
            http_client.clone(),
            config.events.clone(),
            config.generation.events_lookback_days,
        )),
        describer: Arc::new(describer),
        narration,
        images: Arc::new(images),
        artifacts: ArtifactWriter::new(http_client.clone(), &config.general.output_dir),
        media,
        detector: DuplicateDetector::new(config.generation.similarity_threshold),
        default_style: config.generation.default_style.clone(),
    })
}
