// Transcription capability boundary
//
// The speech-to-text model is external: given an audio file, produce an
// ordered sequence of timed text segments. The trait is the whole contract;
// `whisper_cpp` is the default CLI-backed implementation.

pub mod whisper_cpp;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::TranscriberConfig;
use crate::error::Result;
use crate::segment::Segment;

/// Speech-to-text capability.
///
/// Calls may take wall-clock time proportional to audio duration and are
/// expected to be rate-limited by the caller (the pipeline gates them with
/// a semaphore sized to the deployment's compute). Failure carries no
/// partial result.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into ordered timed segments.
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Segment>>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    /// Create the default transcriber implementation (whisper CLI)
    pub fn create_transcriber(config: TranscriberConfig) -> Arc<dyn Transcriber> {
        Arc::new(whisper_cpp::WhisperCliTranscriber::new(config))
    }
}
