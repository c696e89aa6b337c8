// vidtree-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use vidtree_core::config::{
    DEFAULT_AUDIO_BITRATE, DEFAULT_CRF, DEFAULT_MAX_DURATION_SECS, DEFAULT_PRESET, MAX_CRF,
};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "vidtree: mirror a video tree while compressing, trimming or copying",
    long_about = "Walks an input directory tree and writes every recognized video to the \
                  same relative path under an output root, applying one transform policy \
                  per run. Also builds input trees from a download manifest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for the run log and JSON summary (defaults to the current directory)
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Stream batch events as JSON lines on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Re-encodes every video with H.264 and AAC
    Compress(CompressArgs),
    /// Cuts videos longer than a maximum duration, copies the rest
    Trim(TrimArgs),
    /// Copies every video unchanged into the mirrored tree
    Copy(CopyArgs),
    /// Downloads manifest rows into per-name folders
    Organize(OrganizeArgs),
}

impl Commands {
    /// Short name used in log file names.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Compress(_) => "compress",
            Commands::Trim(_) => "trim",
            Commands::Copy(_) => "copy",
            Commands::Organize(_) => "organize",
        }
    }
}

/// Path and walk options shared by every batch command.
#[derive(Args, Debug, Clone)]
pub struct WalkArgs {
    /// Root of the input tree
    #[arg(short = 'i', long = "input", required = true, value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Root of the output tree (defaults to a sibling named after the command)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Comma-separated list of video extensions to process (e.g. mp4,mov)
    #[arg(long, value_delimiter = ',', value_name = "EXTS")]
    pub extensions: Option<Vec<String>>,

    /// Replace the extension of every output file (e.g. mp4)
    #[arg(long, value_name = "EXT")]
    pub output_extension: Option<String>,

    /// Number of files processed concurrently
    #[arg(short = 'j', long, default_value_t = 1, value_name = "N")]
    pub jobs: usize,

    /// Kill ffmpeg/ffprobe after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Keep destinations that already exist and are non-empty
    #[arg(long)]
    pub skip_existing: bool,

    /// Exit with status 2 when any file failed
    #[arg(long)]
    pub strict: bool,

    /// ffmpeg binary to use
    #[arg(long, env = "VIDTREE_FFMPEG", default_value = "ffmpeg", value_name = "PATH")]
    pub ffmpeg: String,

    /// ffprobe binary to use
    #[arg(long, env = "VIDTREE_FFPROBE", default_value = "ffprobe", value_name = "PATH")]
    pub ffprobe: String,
}

#[derive(Args, Debug)]
pub struct CompressArgs {
    #[command(flatten)]
    pub walk: WalkArgs,

    /// x264 constant rate factor (0-51, lower is better quality)
    #[arg(long, default_value_t = DEFAULT_CRF, value_parser = clap::value_parser!(u8).range(0..=MAX_CRF as i64))]
    pub crf: u8,

    /// x264 preset (ultrafast .. veryslow)
    #[arg(long, default_value = DEFAULT_PRESET)]
    pub preset: String,

    /// AAC audio bitrate
    #[arg(long, default_value = DEFAULT_AUDIO_BITRATE, value_name = "RATE")]
    pub audio_bitrate: String,
}

#[derive(Args, Debug)]
pub struct TrimArgs {
    #[command(flatten)]
    pub walk: WalkArgs,

    /// Videos longer than this many seconds are cut to it
    #[arg(long, default_value_t = DEFAULT_MAX_DURATION_SECS, value_name = "SECONDS")]
    pub max_duration: f64,
}

#[derive(Args, Debug)]
pub struct CopyArgs {
    #[command(flatten)]
    pub walk: WalkArgs,
}

#[derive(Args, Debug)]
pub struct OrganizeArgs {
    /// JSON manifest: an array of {"video_name", "download"} rows
    #[arg(long, required = true, value_name = "FILE")]
    pub manifest: PathBuf,

    /// Root of the organized tree
    #[arg(short = 'o', long = "output", default_value = "downloaded_videos", value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// OAuth access token for the Drive API
    #[arg(long, env = "VIDTREE_DRIVE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Override the Drive API root URL
    #[arg(long, hide = true, value_name = "URL")]
    pub api_base: Option<String>,
}
