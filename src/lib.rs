//! Money Mind - turns a finance topic into narrated videos
//!
//! This library generates a script with a language model, narrates it, pulls matching
//! stock footage and music, renders a thumbnail and composites long-form and short-form
//! videos with ffmpeg. One invocation runs one cycle for one topic.

pub mod assemble;
pub mod cli;
pub mod config;
pub mod media;
pub mod pipeline;
pub mod script;
pub mod speech;
pub mod thumbnail;
pub mod upload;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::{Config, Credentials};
pub use media::{FetchOutcome, MediaKind, RemoteAsset, StockSource};
pub use pipeline::{CyclePipeline, CycleReport, Stage};
pub use script::{ScriptBundle, TextGenerator, VideoMetadata};
pub use speech::SpeechProvider;
pub use upload::{UploadOutcome, UploadRequest, Uploader};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to a generation cycle
#[derive(thiserror::Error, Debug)]
pub enum MoneyMindError {
    #[error("Script generation failed: {0}")]
    ScriptGenerationFailed(String),

    #[error("Speech synthesis failed: {0}")]
    SpeechSynthesisFailed(String),

    #[error("Video assembly failed: {0}")]
    AssemblyFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}
