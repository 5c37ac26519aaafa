use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline for one video: transcribe, optionally
    /// translate, and burn subtitles in
    Process {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Target language for translation; omit to keep the source language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Run the full pipeline for every video file in a directory
    Batch {
        /// Input directory containing video files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Target language for translation; omit to keep the source language
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Extract audio from a video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Transcribe an audio file to an SRT subtitle file
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Translate an SRT subtitle file to a target language
    Translate {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,

        /// Target language code
        #[arg(short, long)]
        language: String,
    },

    /// Burn an SRT subtitle file into a video
    Burnin {
        /// Input video file
        #[arg(short, long)]
        video: PathBuf,

        /// Subtitle file
        #[arg(short, long)]
        subtitles: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Remux a video into an MP4 container without re-encoding
    Remux {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output MP4 file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render an SRT subtitle file as a transcript document
    Transcript {
        /// Input SRT file
        #[arg(short, long)]
        input: PathBuf,

        /// Output docx file
        #[arg(short, long)]
        output: PathBuf,
    },
}
