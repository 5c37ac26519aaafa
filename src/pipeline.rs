use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

use crate::config::{Config, TranslateConfig};
use crate::error::{Result, VidscribeError};
use crate::media::{MediaTranscoder, MediaTranscoderFactory};
use crate::registry::UploadRegistry;
use crate::segment::{validate_segments, Segment};
use crate::store::{derive_identity, ArtifactStore};
use crate::subtitle::write_srt;
use crate::transcribe::{Transcriber, TranscriberFactory};
use crate::translate::{translate_segments, Translator, TranslatorFactory};
use crate::transcript::render_transcript;

/// Composes the capabilities into the stage sequence:
/// extract -> transcribe -> cache -> translate -> edit -> burn-in -> export.
///
/// All shared mutable state lives in the injected `UploadRegistry`; the
/// capabilities themselves are stateless with respect to pipeline data.
/// Stages are re-orderable against the cached state: translation can be
/// repeated with different target languages without re-transcribing, and
/// burn-in can be repeated with edited text without re-extracting audio.
pub struct Pipeline {
    transcriber: Arc<dyn Transcriber>,
    translator: Arc<dyn Translator>,
    media: Arc<dyn MediaTranscoder>,
    registry: Arc<UploadRegistry>,
    store: ArtifactStore,
    translate_config: TranslateConfig,
    // Serializes (or pools) access to the heavyweight transcription model.
    transcribe_gate: Arc<Semaphore>,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        media: Arc<dyn MediaTranscoder>,
        registry: Arc<UploadRegistry>,
    ) -> Result<Self> {
        let store = ArtifactStore::new(&config.storage)?;

        Ok(Self {
            transcriber,
            translator,
            media,
            registry,
            store,
            translate_config: config.translate.clone(),
            transcribe_gate: Arc::new(Semaphore::new(config.transcriber.max_concurrent.max(1))),
        })
    }

    /// Build a pipeline with the default capability implementations and
    /// verify the external transcoder is reachable.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transcriber = TranscriberFactory::create_transcriber(config.transcriber.clone());
        let translator = TranslatorFactory::create_translator(config.translate.clone())?;
        let media = MediaTranscoderFactory::create_transcoder(config.media.clone());
        let registry = Arc::new(UploadRegistry::new(config.storage.max_entries));

        media.check_availability()?;

        Self::new(config, transcriber, translator, media, registry)
    }

    pub fn registry(&self) -> &UploadRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Copy an upload into keyed storage. The returned identity keys every
    /// later stage for this file.
    pub async fn ingest(&self, source_path: &Path) -> Result<(String, PathBuf)> {
        let filename = source_path
            .file_name()
            .ok_or_else(|| VidscribeError::Config("Upload has no filename".to_string()))?
            .to_string_lossy();

        let identity = derive_identity(&filename);
        let stored_path = self.store.upload_path(&identity);
        tokio::fs::copy(source_path, &stored_path).await?;

        info!("Ingested {} as {}", source_path.display(), identity);
        Ok((identity, stored_path))
    }

    /// Uploaded -> AudioExtracted -> Transcribed.
    ///
    /// Extracts audio, transcribes it, and registers the result. A failure
    /// in either external call aborts the request and leaves the identity
    /// unregistered; nothing is cached.
    pub async fn transcribe_upload(&self, video_path: &Path) -> Result<(String, Vec<Segment>)> {
        let filename = video_path
            .file_name()
            .ok_or_else(|| VidscribeError::Config("Video path has no filename".to_string()))?
            .to_string_lossy();
        let identity = derive_identity(&filename);

        let audio_path = self.media.extract_audio(video_path).await?;

        let segments = {
            let _permit = self.transcribe_gate.acquire().await.map_err(|_| {
                VidscribeError::Transcription("Transcription gate closed".to_string())
            })?;
            self.transcriber.transcribe(&audio_path).await?
        };

        self.registry.put(&identity, segments.clone());
        info!(
            "Transcribed {} into {} segments",
            identity,
            segments.len()
        );

        Ok((identity, segments))
    }

    /// Transcribed -> Translated. Repeatable with different target
    /// languages against the cached original segments.
    ///
    /// Fans out one per-item translation call per segment, bounded by the
    /// configured worker count, and reassembles results in input order. A
    /// failed item falls back to its original text; the stage itself only
    /// fails when the identity was never transcribed.
    pub async fn translate(&self, identity: &str, target_language: &str) -> Result<Vec<Segment>> {
        let state = self
            .registry
            .get(identity)
            .ok_or_else(|| VidscribeError::NotFound(format!("Upload not found: {}", identity)))?;
        let originals = state.original;

        if target_language == self.translate_config.source_language {
            info!("Target language matches source, echoing original text");
            return Ok(originals);
        }

        info!(
            "Translating {} segments to {} ({} workers)",
            originals.len(),
            target_language,
            self.translate_config.workers
        );

        let translated = translate_segments(
            Arc::clone(&self.translator),
            &originals,
            target_language,
            self.translate_config.workers,
        )
        .await;

        self.registry
            .set_translation(identity, target_language, translated.clone())?;

        Ok(translated)
    }

    /// * -> BurnedIn. Accepts an explicit (possibly user-edited) segment
    /// sequence verbatim; only the start < end invariant is checked.
    /// Repeated calls for the same identity overwrite both the subtitle
    /// file and the cached artifact.
    pub async fn burn_in(
        &self,
        identity: &str,
        video_path: &Path,
        segments: &[Segment],
    ) -> Result<PathBuf> {
        if !self.registry.contains(identity) {
            return Err(VidscribeError::NotFound(format!(
                "Upload not found: {}",
                identity
            )));
        }
        validate_segments(segments)?;

        let subtitle_path = self.store.subtitle_path(identity);
        write_srt(segments, &subtitle_path).await?;

        let output_path = self.store.captioned_path(identity);
        self.media
            .burn_subtitles(video_path, &subtitle_path, &output_path)
            .await?;

        // Cache only after the transcoder succeeds; a failed burn-in must
        // leave the previous artifact entry intact.
        self.registry
            .set_burned_artifact(identity, output_path.clone())?;

        info!("Burned subtitles into {}", output_path.display());
        Ok(output_path)
    }

    /// Export (a): the cached burned-in artifact.
    pub fn burned_artifact(&self, identity: &str) -> Result<PathBuf> {
        self.registry
            .get(identity)
            .and_then(|state| state.burned_artifact)
            .ok_or_else(|| {
                VidscribeError::NotFound(format!("No burned-in video for: {}", identity))
            })
    }

    /// Export (b): a playable MP4 copy of the original upload. Non-MP4
    /// containers are remuxed once; the remux is skipped whenever the
    /// output file already exists.
    pub async fn playable_copy(&self, identity: &str, original_path: &Path) -> Result<PathBuf> {
        if identity.to_lowercase().ends_with(".mp4") {
            return Ok(original_path.to_path_buf());
        }

        let output_path = self.store.playable_path(identity);
        if tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            info!("Reusing remuxed copy: {}", output_path.display());
            return Ok(output_path);
        }

        self.media.remux(original_path, &output_path).await?;
        Ok(output_path)
    }

    /// Export (c): a transcript document rendered from a caller-supplied
    /// segment sequence. Always freshly generated, never cached.
    pub fn transcript_document(&self, display_name: &str, segments: &[Segment]) -> Result<Vec<u8>> {
        render_transcript(segments, display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StubTranscriber {
        segments: Vec<Segment>,
    }

    #[async_trait]
    impl Transcriber for StubTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Vec<Segment>> {
            Ok(self.segments.clone())
        }
    }

    struct FailingTranscriber;

    #[async_trait]
    impl Transcriber for FailingTranscriber {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Vec<Segment>> {
            Err(VidscribeError::Transcription("model exploded".to_string()))
        }
    }

    /// Uppercases input; fails for texts containing "boom"; optionally
    /// delays so that later segments complete first.
    struct StubTranslator {
        reverse_completion: bool,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl StubTranslator {
        fn new(reverse_completion: bool) -> Self {
            Self {
                reverse_completion,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Translator for StubTranslator {
        async fn translate_one(&self, text: &str, target_language: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);

            if self.reverse_completion {
                // Early segments sleep longest so completion order is the
                // reverse of dispatch order.
                let index: u64 = text
                    .trim_start_matches("seg")
                    .parse()
                    .unwrap_or(0);
                tokio::time::sleep(Duration::from_millis((20 - index.min(20)) * 5)).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if text.contains("boom") {
                return Err(VidscribeError::Translation("item failed".to_string()));
            }
            Ok(format!("{}:{}", target_language, text.to_uppercase()))
        }
    }

    /// Records calls and fabricates output files so existence checks and
    /// downstream reads behave like the real tool.
    struct StubTranscoder {
        extract_calls: AtomicUsize,
        burn_calls: AtomicUsize,
        remux_calls: AtomicUsize,
    }

    impl StubTranscoder {
        fn new() -> Self {
            Self {
                extract_calls: AtomicUsize::new(0),
                burn_calls: AtomicUsize::new(0),
                remux_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MediaTranscoder for StubTranscoder {
        async fn extract_audio(&self, video_path: &Path) -> Result<PathBuf> {
            self.extract_calls.fetch_add(1, Ordering::SeqCst);
            let audio_path = video_path.with_extension("wav");
            tokio::fs::write(&audio_path, b"RIFF").await?;
            Ok(audio_path)
        }

        async fn burn_subtitles(
            &self,
            _video_path: &Path,
            subtitle_path: &Path,
            output_path: &Path,
        ) -> Result<()> {
            self.burn_calls.fetch_add(1, Ordering::SeqCst);
            // Output content mirrors the subtitle input so tests can check
            // which segment sequence a burn produced.
            let subtitle = tokio::fs::read(subtitle_path).await?;
            tokio::fs::write(output_path, subtitle).await?;
            Ok(())
        }

        async fn remux(&self, _input_path: &Path, output_path: &Path) -> Result<()> {
            self.remux_calls.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(output_path, b"mp4").await?;
            Ok(())
        }

        fn check_availability(&self) -> Result<()> {
            Ok(())
        }

        async fn version_info(&self) -> Result<String> {
            Ok("stub".to_string())
        }
    }

    struct Fixture {
        pipeline: Pipeline,
        transcoder: Arc<StubTranscoder>,
        translator: Arc<StubTranslator>,
        _dir: tempfile::TempDir,
    }

    fn fixture_with(segments: Vec<Segment>, reverse_completion: bool, workers: usize) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.upload_dir = dir.path().join("uploads").display().to_string();
        config.storage.output_dir = dir.path().join("outputs").display().to_string();
        config.translate.workers = workers;

        let transcoder = Arc::new(StubTranscoder::new());
        let translator = Arc::new(StubTranslator::new(reverse_completion));
        let registry = Arc::new(UploadRegistry::new(None));

        let pipeline = Pipeline::new(
            &config,
            Arc::new(StubTranscriber { segments }),
            Arc::clone(&translator) as Arc<dyn Translator>,
            Arc::clone(&transcoder) as Arc<dyn MediaTranscoder>,
            registry,
        )
        .unwrap();

        Fixture {
            pipeline,
            transcoder,
            translator,
            _dir: dir,
        }
    }

    fn fixture(segments: Vec<Segment>) -> Fixture {
        fixture_with(segments, false, 10)
    }

    async fn write_upload(fixture: &Fixture, name: &str) -> PathBuf {
        let path = fixture._dir.path().join(name);
        tokio::fs::write(&path, b"video").await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_transcribe_registers_identity() {
        let f = fixture(vec![Segment::new(0.0, 1.2, "Hello")]);
        let video = write_upload(&f, "My Clip!.mov").await;

        let (identity, segments) = f.pipeline.transcribe_upload(&video).await.unwrap();
        assert_eq!(identity, "My_Clip_.mov");
        assert_eq!(segments, vec![Segment::new(0.0, 1.2, "Hello")]);
        assert!(f.pipeline.registry().contains("My_Clip_.mov"));
        assert_eq!(f.transcoder.extract_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_transcription_caches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.upload_dir = dir.path().join("uploads").display().to_string();
        config.storage.output_dir = dir.path().join("outputs").display().to_string();

        let pipeline = Pipeline::new(
            &config,
            Arc::new(FailingTranscriber),
            Arc::new(StubTranslator::new(false)),
            Arc::new(StubTranscoder::new()),
            Arc::new(UploadRegistry::new(None)),
        )
        .unwrap();

        let video = dir.path().join("clip.mov");
        tokio::fs::write(&video, b"video").await.unwrap();

        let err = pipeline.transcribe_upload(&video).await.unwrap_err();
        assert!(matches!(err, VidscribeError::Transcription(_)));
        assert!(pipeline.registry().is_empty());
    }

    #[tokio::test]
    async fn test_translate_requires_transcription_first() {
        let f = fixture(vec![]);
        let err = f.pipeline.translate("never_seen.mp4", "fr").await.unwrap_err();
        assert!(matches!(err, VidscribeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_translate_pass_through_for_source_language() {
        let f = fixture(vec![
            Segment::new(0.0, 1.0, "one"),
            Segment::new(1.0, 2.0, "two"),
        ]);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, originals) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let result = f.pipeline.translate(&identity, "en").await.unwrap();
        assert_eq!(result, originals);
        assert_eq!(f.translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_translate_preserves_timings_and_caches_result() {
        let f = fixture(vec![Segment::new(0.0, 1.2, "Hello")]);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let result = f.pipeline.translate(&identity, "fr").await.unwrap();
        assert_eq!(result, vec![Segment::new(0.0, 1.2, "fr:HELLO")]);

        let state = f.pipeline.registry().get(&identity).unwrap();
        let (lang, cached) = state.last_translation.unwrap();
        assert_eq!(lang, "fr");
        assert_eq!(cached, result);
        // Original segments stay untouched.
        assert_eq!(state.original[0].text, "Hello");
    }

    #[tokio::test]
    async fn test_translate_partial_failure_keeps_original_item() {
        let f = fixture(vec![
            Segment::new(0.0, 1.0, "first"),
            Segment::new(1.0, 2.0, "boom here"),
            Segment::new(2.0, 3.0, "third"),
        ]);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let result = f.pipeline.translate(&identity, "fr").await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].text, "fr:FIRST");
        assert_eq!(result[1].text, "boom here");
        assert_eq!(result[2].text, "fr:THIRD");
    }

    #[tokio::test]
    async fn test_translate_total_failure_degrades_to_pass_through() {
        let segments: Vec<Segment> = (0..4)
            .map(|i| Segment::new(i as f64, i as f64 + 1.0, format!("boom {}", i)))
            .collect();
        let f = fixture(segments.clone());
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let result = f.pipeline.translate(&identity, "fr").await.unwrap();
        assert_eq!(result, segments);
    }

    #[tokio::test]
    async fn test_translate_output_order_independent_of_completion_order() {
        let segments: Vec<Segment> = (0..12)
            .map(|i| Segment::new(i as f64, i as f64 + 1.0, format!("seg{}", i)))
            .collect();
        let f = fixture_with(segments, true, 10);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let result = f.pipeline.translate(&identity, "de").await.unwrap();
        for (i, segment) in result.iter().enumerate() {
            assert_eq!(segment.text, format!("de:SEG{}", i));
        }
    }

    #[tokio::test]
    async fn test_translate_fan_out_is_bounded() {
        let segments: Vec<Segment> = (0..20)
            .map(|i| Segment::new(i as f64, i as f64 + 1.0, format!("seg{}", i)))
            .collect();
        let f = fixture_with(segments, true, 3);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        f.pipeline.translate(&identity, "fr").await.unwrap();
        assert!(f.translator.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert_eq!(f.translator.calls.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn test_repeated_translation_overwrites_cache() {
        let f = fixture(vec![Segment::new(0.0, 1.0, "hello")]);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        f.pipeline.translate(&identity, "fr").await.unwrap();
        f.pipeline.translate(&identity, "de").await.unwrap();

        let (lang, _) = f
            .pipeline
            .registry()
            .get(&identity)
            .unwrap()
            .last_translation
            .unwrap();
        assert_eq!(lang, "de");
    }

    #[tokio::test]
    async fn test_burn_in_writes_subtitles_and_caches_artifact() {
        let f = fixture(vec![Segment::new(0.0, 1.2, "Hello")]);
        let video = write_upload(&f, "My Clip!.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let edited = vec![Segment::new(0.0, 1.2, "Bonjour le monde")];
        let artifact = f.pipeline.burn_in(&identity, &video, &edited).await.unwrap();

        assert!(artifact.ends_with("captioned_My_Clip_.mp4"));
        assert_eq!(f.pipeline.burned_artifact(&identity).unwrap(), artifact);

        let srt = tokio::fs::read_to_string(f.pipeline.store().subtitle_path(&identity))
            .await
            .unwrap();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,200\nBonjour le monde\n"));
    }

    #[tokio::test]
    async fn test_burn_in_last_writer_wins() {
        let f = fixture(vec![Segment::new(0.0, 1.0, "Hello")]);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        f.pipeline
            .burn_in(&identity, &video, &[Segment::new(0.0, 1.0, "first cut")])
            .await
            .unwrap();
        let artifact = f
            .pipeline
            .burn_in(&identity, &video, &[Segment::new(0.0, 1.0, "second cut")])
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(&artifact).await.unwrap();
        assert!(content.contains("second cut"));
        assert!(!content.contains("first cut"));
        assert_eq!(f.transcoder.burn_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_burn_in_rejects_invalid_timings() {
        let f = fixture(vec![Segment::new(0.0, 1.0, "Hello")]);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let err = f
            .pipeline
            .burn_in(&identity, &video, &[Segment::new(2.0, 1.0, "inverted")])
            .await
            .unwrap_err();
        assert!(matches!(err, VidscribeError::Config(_)));
        assert!(f.pipeline.burned_artifact(&identity).is_err());
    }

    #[tokio::test]
    async fn test_burned_artifact_missing_is_not_found() {
        let f = fixture(vec![Segment::new(0.0, 1.0, "Hello")]);
        let video = write_upload(&f, "clip.mov").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let err = f.pipeline.burned_artifact(&identity).unwrap_err();
        assert!(matches!(err, VidscribeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_playable_copy_remuxes_at_most_once() {
        let f = fixture(vec![Segment::new(0.0, 1.0, "Hello")]);
        let video = write_upload(&f, "clip.mkv").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let first = f.pipeline.playable_copy(&identity, &video).await.unwrap();
        let second = f.pipeline.playable_copy(&identity, &video).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(f.transcoder.remux_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_playable_copy_serves_mp4_directly() {
        let f = fixture(vec![Segment::new(0.0, 1.0, "Hello")]);
        let video = write_upload(&f, "clip.mp4").await;
        let (identity, _) = f.pipeline.transcribe_upload(&video).await.unwrap();

        let served = f.pipeline.playable_copy(&identity, &video).await.unwrap();
        assert_eq!(served, video);
        assert_eq!(f.transcoder.remux_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let f = fixture(vec![Segment::new(0.0, 1.2, "Hello")]);
        let video = write_upload(&f, "My Clip!.mov").await;

        let (identity, segments) = f.pipeline.transcribe_upload(&video).await.unwrap();
        assert_eq!(identity, "My_Clip_.mov");
        assert_eq!(segments, vec![Segment::new(0.0, 1.2, "Hello")]);

        let translated = f.pipeline.translate(&identity, "fr").await.unwrap();
        assert_eq!(translated.len(), 1);
        assert_eq!(translated[0].start, 0.0);
        assert_eq!(translated[0].end, 1.2);

        let edited = vec![Segment::new(0.0, 1.2, "Bonjour le monde")];
        f.pipeline.burn_in(&identity, &video, &edited).await.unwrap();

        let artifact = f.pipeline.burned_artifact("My_Clip_.mov").unwrap();
        assert!(artifact.ends_with("captioned_My_Clip_.mp4"));

        let srt = tokio::fs::read_to_string(f.pipeline.store().subtitle_path(&identity))
            .await
            .unwrap();
        assert!(srt.contains("1\n00:00:00,000 --> 00:00:01,200\nBonjour le monde"));
    }

    #[tokio::test]
    async fn test_ingest_stores_under_identity() {
        let f = fixture(vec![]);
        let source = write_upload(&f, "My Clip!.mov").await;

        let (identity, stored) = f.pipeline.ingest(&source).await.unwrap();
        assert_eq!(identity, "My_Clip_.mov");
        assert!(stored.ends_with("My_Clip_.mov"));
        assert!(tokio::fs::try_exists(&stored).await.unwrap());
    }
}
