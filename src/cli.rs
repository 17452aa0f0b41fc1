use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "staticsift", about = "Flag recordings that likely contain music under static")]
pub struct Cli {
    /// Audio files to analyze (WAV, MP3, FLAC, OGG, AAC)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Config file (defaults to ./staticsift.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print results as JSON instead of the console report
    #[arg(long)]
    pub json: bool,

    /// Worker threads (0 = one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Seconds of each file to analyze (0 = whole file)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Maximum mean spectral flatness that still votes for music
    #[arg(long)]
    pub flatness_max: Option<f32>,

    /// Minimum onsets per second that votes for music
    #[arg(long)]
    pub onsets_min: Option<f32>,

    /// Minimum voiced-frame ratio that votes for music (0.0-1.0)
    #[arg(long)]
    pub voiced_min: Option<f32>,

    /// Minimum chroma standard deviation that votes for music
    #[arg(long)]
    pub chroma_min: Option<f32>,

    /// Votes required for a "likely music" verdict (0-4)
    #[arg(long)]
    pub score_min: Option<u32>,
}
