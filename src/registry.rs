use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

use crate::error::{Result, VidscribeError};
use crate::segment::Segment;

/// Cached pipeline state for one upload identity.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// Segments produced by transcription. Set once, never mutated; later
    /// stages read them and cache their own results alongside.
    pub original: Vec<Segment>,
    /// Most recent translation: target language code and translated
    /// segments. Each translate call overwrites the previous one.
    pub last_translation: Option<(String, Vec<Segment>)>,
    /// Most recent burned-in video artifact. Each burn-in overwrites it.
    pub burned_artifact: Option<PathBuf>,
}

/// Process-wide store mapping upload identity to pipeline state.
///
/// Constructed once per process and injected into the pipeline; tests get
/// isolation by constructing fresh instances. All access goes through the
/// keyed operations. Concurrent updates to the same identity are
/// last-writer-wins; a get after a put/set for the same identity observes
/// the latest write.
///
/// An optional capacity bound evicts the oldest-registered identity when
/// exceeded. The default is unbounded, matching the reference behavior, but
/// the policy is explicit rather than an accidental leak.
pub struct UploadRegistry {
    inner: RwLock<RegistryInner>,
    max_entries: Option<usize>,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, PipelineState>,
    // Insertion order, for eviction. Re-registering an identity refreshes
    // its position.
    order: VecDeque<String>,
}

impl UploadRegistry {
    pub fn new(max_entries: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            max_entries,
        }
    }

    /// Register an identity with its transcription result. Creates the
    /// entry on first transcription; re-transcribing the same identity
    /// resets it, dropping any cached translation or artifact.
    pub fn put(&self, identity: &str, segments: Vec<Segment>) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if inner.entries.contains_key(identity) {
            debug!("Re-registering identity, dropping stale state: {}", identity);
            inner.order.retain(|id| id != identity);
        }

        inner.order.push_back(identity.to_string());
        inner.entries.insert(
            identity.to_string(),
            PipelineState {
                original: segments,
                last_translation: None,
                burned_artifact: None,
            },
        );

        if let Some(max) = self.max_entries {
            while inner.entries.len() > max {
                if let Some(oldest) = inner.order.pop_front() {
                    warn!("Registry capacity {} exceeded, evicting: {}", max, oldest);
                    inner.entries.remove(&oldest);
                } else {
                    break;
                }
            }
        }
    }

    /// Snapshot of the state for an identity, if it has been transcribed.
    pub fn get(&self, identity: &str) -> Option<PipelineState> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.get(identity).cloned()
    }

    /// Cache the latest translation for an identity. Overwrites any prior
    /// translation regardless of language.
    pub fn set_translation(
        &self,
        identity: &str,
        language: &str,
        segments: Vec<Segment>,
    ) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let state = inner
            .entries
            .get_mut(identity)
            .ok_or_else(|| VidscribeError::NotFound(format!("Upload not found: {}", identity)))?;
        state.last_translation = Some((language.to_string(), segments));
        Ok(())
    }

    /// Cache the latest burned-in artifact path for an identity.
    pub fn set_burned_artifact(&self, identity: &str, path: PathBuf) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let state = inner
            .entries
            .get_mut(identity)
            .ok_or_else(|| VidscribeError::NotFound(format!("Upload not found: {}", identity)))?;
        state.burned_artifact = Some(path);
        Ok(())
    }

    pub fn contains(&self, identity: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
