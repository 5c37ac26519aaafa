use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::{truncate_diagnostic, Result, VidscribeError};

/// Maximum stderr characters carried in a transcode error.
const DIAGNOSTIC_LIMIT: usize = 400;

/// Abstract transcoder command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    /// Create a new transcoder command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Copy all streams as-is
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Execute the command. Non-zero exit becomes a `Transcode` error
    /// carrying the tail of the tool's stderr.
    pub async fn execute(&self) -> Result<()> {
        debug!(
            "Executing transcoder command: {} {:?} ({})",
            self.binary_path, self.args, self.description
        );

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| {
                VidscribeError::Transcode(format!("Failed to execute transcoder: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidscribeError::Transcode(format!(
                "{} failed: {}",
                self.description,
                truncate_diagnostic(&stderr, DIAGNOSTIC_LIMIT)
            )));
        }

        Ok(())
    }
}

/// Escape a subtitle path for the `subtitles=` filter argument: forward
/// slashes, escaped colons. Unescaped Windows paths make the filter fail
/// silently or corrupt the output.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace(':', "\\:")
}

/// Builder for the transcoder operations the pipeline uses
pub struct MediaCommandBuilder {
    binary_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    /// Audio extraction: mono 16kHz 16-bit PCM, suitable for transcription.
    pub fn extract_audio<P: AsRef<Path>>(&self, video_path: P, audio_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .output(audio_path)
    }

    /// Subtitle burn-in, normalized to H.264 + AAC MP4 with faststart so
    /// the result plays everywhere regardless of the input container.
    pub fn burn_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
        additional_options: &[String],
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Subtitle burn-in")
            .overwrite()
            .input(&video_path)
            .video_filter(format!(
                "subtitles='{}'",
                escape_filter_path(subtitle_path.as_ref())
            ))
            .video_codec("libx264")
            .arg("-preset")
            .arg("fast")
            .arg("-crf")
            .arg("23")
            .audio_codec("aac")
            .arg("-b:a")
            .arg("128k")
            .arg("-movflags")
            .arg("+faststart");

        for option in additional_options {
            cmd = cmd.arg(option);
        }

        cmd.output(output_path)
    }

    /// Stream-copy remux into an MP4 container; no re-encoding.
    pub fn remux<P: AsRef<Path>>(&self, input_path: P, output_path: P) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Remux")
            .overwrite()
            .input(input_path)
            .copy_streams()
            .arg("-movflags")
            .arg("+faststart")
            .output(output_path)
    }
}
