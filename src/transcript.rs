use docx_rs::{AlignmentType, Docx, Paragraph, Run};
use std::io::Cursor;

use crate::error::{Result, VidscribeError};
use crate::segment::Segment;

/// Render segments as a transcript document (docx bytes).
///
/// Layout: centered bold title, centered source-name subtitle, then one
/// paragraph per segment with a bold small-font `[HH:MM:SS -> HH:MM:SS]`
/// range followed by the segment text. Depends only on the supplied
/// segments and display name, never on intermediate pipeline artifacts.
pub fn render_transcript(segments: &[Segment], source_name: &str) -> Result<Vec<u8>> {
    let mut docx = Docx::new()
        .add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text("Video Transcript").bold().size(40)),
        )
        .add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Center)
                .add_run(Run::new().add_text(source_name).size(24)),
        )
        .add_paragraph(Paragraph::new());

    for segment in segments {
        let range = format!(
            "[{} -> {}] ",
            format_clock_time(segment.start),
            format_clock_time(segment.end)
        );
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(range).bold().size(16))
                .add_run(Run::new().add_text(segment.text.trim())),
        );
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| VidscribeError::Document(format!("Failed to pack document: {}", e)))?;

    Ok(buffer.into_inner())
}

/// `HH:MM:SS` clock time; fractional seconds truncate so the range stays
/// monotonic under repeated formatting.
pub fn format_clock_time(seconds: f64) -> String {
    let total_secs = seconds as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}
