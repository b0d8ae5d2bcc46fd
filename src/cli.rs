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

    /// Override the service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate translated subtitles for a video file
    Run {
        /// Input video file (.mp4, .mkv, .ts, .mov)
        #[arg(short, long)]
        input: PathBuf,

        /// Spoken language of the video
        #[arg(short, long)]
        source: String,

        /// Language of the generated subtitles
        #[arg(short, long)]
        target: String,

        /// Directory to save the subtitle file into
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Do not ask the service to clean up after downloading
        #[arg(long)]
        no_cleanup: bool,
    },

    /// Check whether the service is up and its model is loaded
    Health,

    /// Ask the service to discard intermediate files
    Cleanup,

    /// List supported languages
    Languages,

    /// Print the effective configuration
    Config {
        /// Also write it to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}
