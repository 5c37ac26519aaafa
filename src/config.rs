use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, VidscribeError};

fn default_translate_workers() -> usize {
    10
}

fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub translate: TranslateConfig,
    pub media: MediaConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Path to transcriber binary (e.g., whisper-cli)
    pub binary_path: String,
    /// Path to the model file loaded by the transcriber
    pub model_path: String,
    /// Source language hint; empty means auto-detect
    pub language: String,
    /// Maximum concurrent transcriptions. The deployment assumption is a
    /// single heavyweight model instance, so the default serializes calls.
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Ollama endpoint URL
    pub endpoint: String,
    /// LLM model to use for translation
    pub model: String,
    /// Maximum in-flight per-segment translation calls per batch
    #[serde(default = "default_translate_workers")]
    pub workers: usize,
    /// Maximum retries for a failed per-item translation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Language of the transcription output; requesting it skips translation
    pub source_language: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Additional encoding options for subtitle burn-in
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub subtitle_options: Vec<String>,
    /// Maximum concurrent external transcoder processes
    pub max_concurrent_jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for original uploads
    pub upload_dir: String,
    /// Directory for derived artifacts (subtitles, burned/remuxed videos)
    pub output_dir: String,
    /// Registry capacity bound. `None` keeps every transcribed upload for
    /// the life of the process; setting a bound evicts the oldest entry.
    pub max_entries: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcriber: TranscriberConfig {
                binary_path: "whisper-cli".to_string(),
                model_path: "models/ggml-base.bin".to_string(),
                language: String::new(),
                max_concurrent: 1,
            },
            translate: TranslateConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2:3b".to_string(),
                workers: default_translate_workers(),
                max_retries: default_max_retries(),
                source_language: "en".to_string(),
                timeout_secs: 60,
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
                subtitle_options: vec![],
                max_concurrent_jobs: 2,
            },
            storage: StorageConfig {
                upload_dir: "uploads".to_string(),
                output_dir: "outputs".to_string(),
                max_entries: None,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VidscribeError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VidscribeError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VidscribeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VidscribeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
