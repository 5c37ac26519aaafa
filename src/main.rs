//! Vidscribe - Video Subtitling Pipeline
//!
//! Command-line entry point. Builds the capability objects once from
//! configuration and drives the pipeline stages.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkdir::WalkDir;

use vidscribe::cli::{Args, Commands};
use vidscribe::config::Config;
use vidscribe::media::{MediaTranscoder, MediaTranscoderFactory};
use vidscribe::pipeline::Pipeline;
use vidscribe::segment::Segment;
use vidscribe::subtitle::{parse_srt, write_srt};
use vidscribe::transcribe::{Transcriber, TranscriberFactory};
use vidscribe::transcript::render_transcript;
use vidscribe::translate::{translate_segments, TranslatorFactory};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Process { input, language } => {
            let pipeline = Pipeline::from_config(&config)?;
            process_file(&pipeline, &config, &input, language.as_deref()).await?;
        }
        Commands::Batch { input_dir, language } => {
            let pipeline = Pipeline::from_config(&config)?;

            let video_extensions = ["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm"];
            let mut video_files = Vec::new();
            for entry in WalkDir::new(&input_dir).into_iter().filter_map(|e| e.ok()) {
                if let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) {
                    if video_extensions.contains(&ext.to_lowercase().as_str()) {
                        video_files.push(entry.path().to_path_buf());
                    }
                }
            }
            info!("Found {} video files to process", video_files.len());

            for video_path in video_files {
                match process_file(&pipeline, &config, &video_path, language.as_deref()).await {
                    Ok(_) => info!("Successfully processed: {}", video_path.display()),
                    Err(e) => warn!("Failed to process {}: {}", video_path.display(), e),
                }
            }
        }
        Commands::Extract { input } => {
            let media = MediaTranscoderFactory::create_transcoder(config.media.clone());
            let audio_path = media.extract_audio(&input).await?;
            println!("{}", audio_path.display());
        }
        Commands::Transcribe { input, output } => {
            let transcriber = TranscriberFactory::create_transcriber(config.transcriber.clone());
            let segments = transcriber.transcribe(&input).await?;
            write_srt(&segments, &output).await?;
            println!("{}", output.display());
        }
        Commands::Translate {
            input,
            output,
            language,
        } => {
            let segments = parse_srt(&tokio::fs::read_to_string(&input).await?)?;
            let translated = translate_standalone(&config, segments, &language).await?;
            write_srt(&translated, &output).await?;
            println!("{}", output.display());
        }
        Commands::Burnin {
            video,
            subtitles,
            output,
        } => {
            let media = MediaTranscoderFactory::create_transcoder(config.media.clone());
            media.burn_subtitles(&video, &subtitles, &output).await?;
            println!("{}", output.display());
        }
        Commands::Remux { input, output } => {
            let media = MediaTranscoderFactory::create_transcoder(config.media.clone());
            media.remux(&input, &output).await?;
            println!("{}", output.display());
        }
        Commands::Transcript { input, output } => {
            let segments = parse_srt(&tokio::fs::read_to_string(&input).await?)?;
            let display_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let bytes = render_transcript(&segments, &display_name)?;
            tokio::fs::write(&output, bytes).await?;
            println!("{}", output.display());
        }
    }

    Ok(())
}

/// Full stage sequence for one file: ingest, transcribe, optionally
/// translate, burn in, report the artifact path.
async fn process_file(
    pipeline: &Pipeline,
    config: &Config,
    input: &PathBuf,
    language: Option<&str>,
) -> Result<()> {
    info!("Processing video file: {}", input.display());

    let (identity, segments) = {
        let (_, stored_path) = pipeline.ingest(input).await?;
        pipeline.transcribe_upload(&stored_path).await?
    };

    let final_segments = match language {
        Some(lang) if lang != config.translate.source_language => {
            pipeline.translate(&identity, lang).await?
        }
        _ => segments,
    };

    let upload_path = pipeline.store().upload_path(&identity);
    let artifact = pipeline
        .burn_in(&identity, &upload_path, &final_segments)
        .await?;

    println!("{}", artifact.display());
    Ok(())
}

/// Translate a standalone subtitle file. Builds only the translator; no
/// transcoder or transcriber is needed for this path.
async fn translate_standalone(
    config: &Config,
    segments: Vec<Segment>,
    language: &str,
) -> Result<Vec<Segment>> {
    if language == config.translate.source_language {
        return Ok(segments);
    }
    let translator = TranslatorFactory::create_translator(config.translate.clone())?;
    Ok(translate_segments(translator, &segments, language, config.translate.workers).await)
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".vidscribe").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "vidscribe.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program.
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
