use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::{Result, VidscribeError};
use crate::segment::Segment;

/// Render segments as SRT: 1-based index, `HH:MM:SS,mmm --> HH:MM:SS,mmm`
/// timestamp line, trimmed text, blank-line separator. Output is
/// byte-identical for identical input.
pub fn generate_srt(segments: &[Segment]) -> String {
    let mut srt_content = String::new();

    for (index, segment) in segments.iter().enumerate() {
        let start_time = format_srt_time(segment.start);
        let end_time = format_srt_time(segment.end);

        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            start_time,
            end_time,
            segment.text.trim()
        ));
    }

    srt_content
}

/// Write an SRT file for the given segments.
pub async fn write_srt<P: AsRef<Path>>(segments: &[Segment], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(output_path, generate_srt(segments)).await?;

    Ok(())
}

/// Parse SRT content back into segments. Multi-line cues are joined with a
/// newline; indices are ignored (sequence order is authoritative).
pub fn parse_srt(content: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();

    for block in content.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
        let mut lines = block.lines();

        let index_line = lines
            .next()
            .ok_or_else(|| VidscribeError::Config("Empty SRT block".to_string()))?;
        index_line
            .trim()
            .parse::<u32>()
            .map_err(|_| VidscribeError::Config(format!("Invalid SRT index: {}", index_line)))?;

        let time_line = lines
            .next()
            .ok_or_else(|| VidscribeError::Config("SRT block missing timestamps".to_string()))?;
        let (start_raw, end_raw) = time_line
            .split_once("-->")
            .ok_or_else(|| VidscribeError::Config(format!("Invalid SRT time line: {}", time_line)))?;

        let start = parse_srt_time(start_raw.trim())?;
        let end = parse_srt_time(end_raw.trim())?;
        let text = lines.collect::<Vec<_>>().join("\n");

        segments.push(Segment::new(start, end, text));
    }

    Ok(segments)
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm).
///
/// The millisecond component truncates rather than rounds so that start/end
/// stay monotonic under repeated format/parse cycles.
pub fn format_srt_time(seconds: f64) -> String {
    let total_milliseconds = (seconds * 1000.0) as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

fn parse_srt_time(value: &str) -> Result<f64> {
    let invalid = || VidscribeError::Config(format!("Invalid SRT timestamp: {}", value));

    let (clock, millis_raw) = value.split_once(',').ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let hours: u64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let minutes: u64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let secs: u64 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    let millis: u64 = millis_raw.parse().map_err(|_| invalid())?;

    Ok((hours * 3600 + minutes * 60 + secs) as f64 + millis as f64 / 1000.0)
}
