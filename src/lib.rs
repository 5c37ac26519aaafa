//! Vidscribe - Video Subtitling Pipeline
//!
//! Turns a video into a subtitled video: extract audio, transcribe speech
//! to timestamped segments, optionally translate them, accept edits, burn
//! subtitles into the video, and export in multiple forms, using
//! whisper-cli, ollama, and ffmpeg.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod registry;
pub mod segment;
pub mod store;
pub mod subtitle;
pub mod transcribe;
pub mod transcript;
pub mod translate;
