pub mod artifacts;
pub use artifacts::ArtifactWriter;

pub mod dedup;
pub use dedup::DuplicateDetector;

pub mod images;
pub use images::{BackendSlot, ImageFallbackHandler, PanelImage, PanelImages, RateLimiter};

pub mod media;
pub use media::MediaService;

pub mod pipeline;
pub use pipeline::{
    ComicPipeline, CustomRequest, DailyRequest, MediaRequest, PipelineError, PipelineParts,
    RunRequest,
};

pub mod tasks;
pub use tasks::{ProgressReporter, TaskInfo, TaskRegistry};
