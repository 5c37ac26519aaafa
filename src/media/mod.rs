// Media transcoding abstraction
//
// - `MediaTranscoder`: the operations the pipeline needs from an external
//   transcoding tool (audio extraction, subtitle burn-in, remux)
// - `commands`: builder for tool invocations
// - `ffmpeg`: the concrete FFmpeg-backed implementation

pub mod commands;
pub mod ffmpeg;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use commands::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Operations the pipeline needs from the external transcoding tool.
///
/// Implementations are stateless with respect to pipeline data: they take
/// paths, write files, and return. A failed call makes no guarantee about
/// partial output on disk.
#[async_trait]
pub trait MediaTranscoder: Send + Sync {
    /// Extract mono 16kHz 16-bit PCM audio to a sibling `.wav` path.
    async fn extract_audio(&self, video_path: &Path) -> Result<PathBuf>;

    /// Burn subtitle text onto every frame, re-encoding to a normalized,
    /// universally playable MP4 regardless of the input container.
    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()>;

    /// Copy container streams without re-encoding into an MP4 container.
    /// Idempotent; callers skip the call when the output already exists.
    async fn remux(&self, input_path: &Path, output_path: &Path) -> Result<()>;

    /// Check if the transcoding tool is available.
    fn check_availability(&self) -> Result<()>;

    /// Get transcoding tool version information.
    async fn version_info(&self) -> Result<String>;
}

/// Factory for creating media transcoder instances
pub struct MediaTranscoderFactory;

impl MediaTranscoderFactory {
    /// Create the default transcoder implementation (FFmpeg-based)
    pub fn create_transcoder(config: MediaConfig) -> Arc<dyn MediaTranscoder> {
        Arc::new(ffmpeg::FfmpegTranscoder::new(config))
    }
}
