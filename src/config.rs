use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,

    pub generation: GenerationConfig,

    pub images: ImagesConfig,

    pub script: ScriptConfig,

    pub events: EventsConfig,

    pub narration: NarrationConfig,

    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Root directory for generated images, narration and summary files
    pub output_dir: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,

    /// Timeout for calls to generation backends. Image and script calls are slow.
    pub request_timeout_seconds: u64,

    /// How long a finished task waits for its progress stream to be read
    pub task_retention_seconds: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/comicforge.db".to_string(),
            log_level: "info".to_string(),
            output_dir: "output".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
            request_timeout_seconds: 120,
            task_retention_seconds: 1800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Stories whose similarity ratio reaches this value count as duplicates
    pub similarity_threshold: f64,

    pub default_style: String,

    /// How far back the event source is asked to look
    pub events_lookback_days: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            default_style: "classic newspaper comic".to_string(),
            events_lookback_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Calls allowed against the primary backend per period
    pub rate_limit: u32,

    pub rate_limit_period_seconds: u64,

    pub attempts_per_panel: u32,

    pub primary: PrimaryImageConfig,

    pub secondary: SecondaryImageConfig,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            rate_limit: 5,
            rate_limit_period_seconds: 60,
            attempts_per_panel: 2,
            primary: PrimaryImageConfig::default(),
            secondary: SecondaryImageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryImageConfig {
    pub base_url: String,

    pub api_key: String,

    pub model: String,

    pub size: String,

    pub quality: String,
}

impl Default for PrimaryImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryImageConfig {
    pub enabled: bool,

    /// Diffusion server exposing a txt2img endpoint
    pub base_url: String,

    pub steps: u32,

    pub guidance_scale: f32,
}

impl Default for SecondaryImageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:7860".to_string(),
            steps: 4,
            guidance_scale: 7.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub base_url: String,

    pub model: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub base_url: String,

    pub api_key: String,

    pub model: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.perplexity.ai".to_string(),
            api_key: String::new(),
            model: "llama-3.1-sonar-large-128k-online".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    pub enabled: bool,

    pub base_url: String,

    pub api_key: String,

    pub voice: String,

    pub stability: f32,

    pub style: f32,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            api_key: String::new(),
            voice: "callum".to_string(),
            stability: 0.75,
            style: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Ollama-compatible endpoint with a vision model
    pub base_url: String,

    pub model: String,

    pub frames_per_video: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
            frames_per_video: 5,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    /// Credentials may come from the environment (or a `.env` file) instead
    /// of the config file. Non-empty variables win.
    pub fn apply_env_overrides(&mut self) {
        let overrides = [
            ("COMICFORGE_IMAGES_API_KEY", &mut self.images.primary.api_key),
            ("COMICFORGE_NEWS_API_KEY", &mut self.events.api_key),
            ("COMICFORGE_NARRATION_API_KEY", &mut self.narration.api_key),
        ];

        for (name, field) in overrides {
            if let Ok(value) = std::env::var(name)
                && !value.is_empty()
            {
                *field = value;
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("comicforge").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".comicforge").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.images.rate_limit == 0 {
            anyhow::bail!("images.rate_limit must be > 0");
        }

        if self.images.rate_limit_period_seconds == 0 {
            anyhow::bail!("images.rate_limit_period_seconds must be > 0");
        }

        if self.images.attempts_per_panel == 0 {
            anyhow::bail!("images.attempts_per_panel must be > 0");
        }

        let threshold = self.generation.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            anyhow::bail!("generation.similarity_threshold must be in (0, 1], got {threshold}");
        }

        if self.images.primary.base_url.is_empty() {
            anyhow::bail!("Primary image backend URL cannot be empty");
        }

        Ok(())
    }

    /// Minimum spacing between two calls to the primary image backend.
    #[must_use]
    pub fn image_call_interval(&self) -> std::time::Duration {
        let period = std::time::Duration::from_secs(self.images.rate_limit_period_seconds);
        period / self.images.rate_limit.max(1)
    }
}
