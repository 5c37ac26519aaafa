use serde::{Deserialize, Serialize};

/// One timed line of speech. This is the interchange shape at every stage
/// boundary: transcription output, translation input/output, burn-in input,
/// and the JSON clients re-submit after editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds from the beginning of the media.
    pub start: f64,
    /// End time in seconds; always greater than `start`.
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start >= 0.0 && self.start < self.end
    }
}

/// Reject sequences that violate the `0 <= start < end` invariant.
/// Ordering between segments is trusted to the producer and not checked.
pub fn validate_segments(segments: &[Segment]) -> crate::error::Result<()> {
    for (idx, segment) in segments.iter().enumerate() {
        if !segment.is_valid() {
            return Err(crate::error::VidscribeError::Config(format!(
                "Segment {} has invalid timing: start={} end={}",
                idx, segment.start, segment.end
            )));
        }
    }
    Ok(())
}
