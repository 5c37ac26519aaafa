use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::{MediaCommandBuilder, MediaTranscoder};
use crate::config::MediaConfig;
use crate::error::{Result, VidscribeError};

/// FFmpeg-backed transcoder.
///
/// External processes are heavyweight; a semaphore bounds how many run at
/// once instead of spawning one per request.
pub struct FfmpegTranscoder {
    config: MediaConfig,
    command_builder: MediaCommandBuilder,
    jobs: Semaphore,
}

impl FfmpegTranscoder {
    pub fn new(config: MediaConfig) -> Self {
        let command_builder = MediaCommandBuilder::new(&config.binary_path);
        let jobs = Semaphore::new(config.max_concurrent_jobs.max(1));

        Self {
            config,
            command_builder,
            jobs,
        }
    }

    async fn acquire_job(&self) -> Result<tokio::sync::SemaphorePermit<'_>> {
        self.jobs
            .acquire()
            .await
            .map_err(|_| VidscribeError::Transcode("Transcoder job pool closed".to_string()))
    }
}

#[async_trait]
impl MediaTranscoder for FfmpegTranscoder {
    async fn extract_audio(&self, video_path: &Path) -> Result<PathBuf> {
        let audio_path = video_path.with_extension("wav");
        info!(
            "Extracting audio from {} to {}",
            video_path.display(),
            audio_path.display()
        );

        let _permit = self.acquire_job().await?;
        let command = self.command_builder.extract_audio(video_path, &audio_path);
        command.execute().await?;

        info!("Audio extraction completed");
        Ok(audio_path)
    }

    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Burning subtitles from {} into {} -> {}",
            subtitle_path.display(),
            video_path.display(),
            output_path.display()
        );

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let _permit = self.acquire_job().await?;
        let command = self.command_builder.burn_subtitles(
            video_path,
            subtitle_path,
            output_path,
            &self.config.subtitle_options,
        );
        command.execute().await?;

        info!("Subtitle burn-in completed");
        Ok(())
    }

    async fn remux(&self, input_path: &Path, output_path: &Path) -> Result<()> {
        info!(
            "Remuxing {} to {}",
            input_path.display(),
            output_path.display()
        );

        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let _permit = self.acquire_job().await?;
        let command = self.command_builder.remux(input_path, output_path);
        command.execute().await?;

        info!("Remux completed");
        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| VidscribeError::Transcode(format!("Transcoder not found: {}", e)))?;

        if output.status.success() {
            debug!("Transcoder is available");
            Ok(())
        } else {
            Err(VidscribeError::Transcode(
                "Transcoder version check failed".to_string(),
            ))
        }
    }

    async fn version_info(&self) -> Result<String> {
        let output = tokio::process::Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| VidscribeError::Transcode(format!("Failed to execute transcoder: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(VidscribeError::Transcode(format!(
                "Transcoder version check failed: {}",
                stderr
            )))
        }
    }
}
