// Translation capability boundary
//
// The translator is external and per-item: one text string and a target
// language code in, one translated string out. No batch endpoint exists;
// `translate_segments` fans out one call per segment. Each call is
// independently fallible and the fan-out absorbs per-item failures.

pub mod ollama;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::config::TranslateConfig;
use crate::error::Result;
use crate::segment::Segment;

/// Per-item translation capability.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate one text string into the target language.
    async fn translate_one(&self, text: &str, target_language: &str) -> Result<String>;
}

/// Factory for creating translator instances
pub struct TranslatorFactory;

impl TranslatorFactory {
    /// Create the default translator implementation (Ollama-backed)
    pub fn create_translator(config: TranslateConfig) -> Result<Arc<dyn Translator>> {
        Ok(Arc::new(ollama::OllamaTranslator::new(config)?))
    }
}

/// Translate a segment sequence with a bounded per-item fan-out.
///
/// Spawns one translation call per segment, at most `workers` in flight at
/// once, and reassembles results in input order through preallocated slots
/// indexed by segment position. A failed item keeps its original text;
/// timing is never altered.
pub async fn translate_segments(
    translator: Arc<dyn Translator>,
    segments: &[Segment],
    target_language: &str,
    workers: usize,
) -> Vec<Segment> {
    // Original text is the fallback value, so completion order and item
    // failures can never reorder or drop output.
    let mut slots: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();

    let gate = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks: JoinSet<(usize, Option<String>)> = JoinSet::new();

    for (index, segment) in segments.iter().enumerate() {
        let translator = Arc::clone(&translator);
        let gate = Arc::clone(&gate);
        let text = segment.text.clone();
        let target = target_language.to_string();

        tasks.spawn(async move {
            let _permit = match gate.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (index, None),
            };
            match translator.translate_one(&text, &target).await {
                Ok(translation) => (index, Some(translation)),
                Err(e) => {
                    warn!("Translation failed for segment {}: {}", index, e);
                    (index, None)
                }
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Some(translation))) => slots[index] = translation,
            Ok((_, None)) => {} // keep original text
            Err(e) => warn!("Translation task failed to complete: {}", e),
        }
    }

    segments
        .iter()
        .zip(slots)
        .map(|(segment, text)| Segment::new(segment.start, segment.end, text))
        .collect()
}
