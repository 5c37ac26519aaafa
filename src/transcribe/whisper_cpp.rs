use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use super::Transcriber;
use crate::config::TranscriberConfig;
use crate::error::{truncate_diagnostic, Result, VidscribeError};
use crate::segment::Segment;

/// whisper.cpp `-oj` JSON output. Only the fields the pipeline reads are
/// modeled; the rest (system info, model metadata, per-token details) is
/// ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperOutput {
    pub result: WhisperResult,
    pub transcription: Vec<WhisperEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperResult {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperEntry {
    pub offsets: WhisperOffsets,
    pub text: String,
}

/// Segment boundaries in milliseconds from the start of the audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperOffsets {
    pub from: u64,
    pub to: u64,
}

impl WhisperOutput {
    pub fn into_segments(self) -> Vec<Segment> {
        self.transcription
            .into_iter()
            .map(|entry| {
                Segment::new(
                    entry.offsets.from as f64 / 1000.0,
                    entry.offsets.to as f64 / 1000.0,
                    entry.text.trim(),
                )
            })
            .collect()
    }
}

/// Transcriber backed by whisper-cli (whisper.cpp).
///
/// Invokes the binary with `-oj` so it writes its JSON report to a fixed
/// base path inside a temporary directory, then parses the report. Holds
/// no cross-call state.
pub struct WhisperCliTranscriber {
    config: TranscriberConfig,
}

impl WhisperCliTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>> {
        info!("Transcribing audio: {}", audio_path.display());

        let temp_dir = tempfile::tempdir().map_err(|e| {
            VidscribeError::Transcription(format!("Failed to create temp directory: {}", e))
        })?;
        // whisper-cli appends ".json" to the -of base path.
        let output_base = temp_dir.path().join("transcript");

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("-m")
            .arg(&self.config.model_path)
            .arg("-oj")
            .arg("-of")
            .arg(&output_base);

        if !self.config.language.is_empty() {
            cmd.arg("-l").arg(&self.config.language);
        }

        cmd.arg("-f").arg(audio_path);

        debug!("Executing transcriber: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            VidscribeError::Transcription(format!("Failed to execute transcriber: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidscribeError::Transcription(format!(
                "Transcriber failed: {}",
                truncate_diagnostic(&stderr, 400)
            )));
        }

        let json_file = temp_dir.path().join("transcript.json");
        let json_content = tokio::fs::read_to_string(&json_file).await.map_err(|e| {
            VidscribeError::Transcription(format!("Failed to read transcriber output: {}", e))
        })?;

        let whisper_output: WhisperOutput = serde_json::from_str(&json_content).map_err(|e| {
            VidscribeError::Transcription(format!("Failed to parse transcriber JSON: {}", e))
        })?;

        let language = whisper_output.result.language.clone();
        let segments = whisper_output.into_segments();
        info!(
            "Transcription produced {} segments (detected language: {})",
            segments.len(),
            language
        );
        Ok(segments)
    }
}
