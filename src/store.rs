use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::Result;

/// Derive the filesystem-safe upload identity from an original filename.
///
/// Path components are stripped, every character outside `[A-Za-z0-9_-]` in
/// the base name becomes `_`, and the extension is lower-cased. The mapping
/// is deterministic, so re-uploading the same filename lands on the same
/// registry entry. Distinct filenames can collide (e.g. `a!b.mp4` and
/// `a_b.mp4`); last writer wins on collision.
pub fn derive_identity(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (base, extension) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx + 1..]),
        _ => (name.as_str(), ""),
    };

    let safe_base: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if extension.is_empty() {
        safe_base
    } else {
        format!("{}.{}", safe_base, extension.to_lowercase())
    }
}

/// Base name of an identity without its extension, used to build artifact
/// filenames like `captioned_<base>.mp4`.
///
/// Because artifact names drop the extension, identities differing only by
/// extension (`a.mp4` vs `a.mkv`) are distinct registry entries but share
/// every derived artifact path; the later stage run overwrites the
/// earlier one's files.
pub fn identity_stem(identity: &str) -> &str {
    match identity.rfind('.') {
        Some(idx) if idx > 0 => &identity[..idx],
        _ => identity,
    }
}

/// Durable keyed locations for uploads and derived artifacts.
///
/// Naming is stable per identity: repeated stages for the same upload
/// overwrite the same files rather than accumulating new ones.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    upload_dir: PathBuf,
    output_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let store = Self {
            upload_dir: PathBuf::from(&config.upload_dir),
            output_dir: PathBuf::from(&config.output_dir),
        };
        std::fs::create_dir_all(&store.upload_dir)?;
        std::fs::create_dir_all(&store.output_dir)?;
        Ok(store)
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the original upload for an identity is stored.
    pub fn upload_path(&self, identity: &str) -> PathBuf {
        self.upload_dir.join(identity)
    }

    /// Subtitle file written before burn-in.
    pub fn subtitle_path(&self, identity: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_subtitle.srt", identity_stem(identity)))
    }

    /// Burned-in output; always MP4 regardless of the source container.
    pub fn captioned_path(&self, identity: &str) -> PathBuf {
        self.output_dir
            .join(format!("captioned_{}.mp4", identity_stem(identity)))
    }

    /// Remuxed playback copy of the original upload.
    pub fn playable_path(&self, identity: &str) -> PathBuf {
        self.output_dir
            .join(format!("original_{}.mp4", identity_stem(identity)))
    }

    /// Suggested download filename for a transcript document. The document
    /// bytes themselves are returned to the caller, never stored.
    pub fn transcript_filename(&self, identity: &str) -> String {
        format!("{}_transcript.docx", identity_stem(identity))
    }
}
