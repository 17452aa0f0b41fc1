//! Error types for staticsift
//!
//! Per-file errors (load, analysis) are reported and the batch continues.
//! Configuration errors are fatal and surface before any file is touched.

use std::path::PathBuf;
use thiserror::Error;

/// The audio file could not be turned into a waveform.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: '{0}'")]
    NotFound(PathBuf),

    #[error("Failed to open audio file '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported audio format for '{path}': {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("Failed to decode audio file '{path}': {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("No audio tracks found in '{0}'")]
    NoTrack(PathBuf),

    #[error("Unknown sample rate in '{0}'")]
    UnknownSampleRate(PathBuf),
}

/// Feature extraction could not run on a decoded waveform.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("Waveform is empty")]
    EmptyWaveform,

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("Non-finite sample at index {0}")]
    NonFiniteSample(usize),
}

/// Invalid thresholds or an unusable config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("decision_score_min must be between 0 and {max}, got {value}")]
    ScoreOutOfRange { value: u32, max: u32 },

    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidCutoff { name: &'static str, value: f32 },

    #[error("max_duration_secs must be a finite, non-negative number, got {0}")]
    InvalidMaxDuration(f32),

    #[error("Cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Any error raised while sifting a file or preparing a run.
#[derive(Debug, Error)]
pub enum SiftError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Analysis failed for '{path}': {source}")]
    Analysis {
        path: PathBuf,
        #[source]
        source: AnalysisError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, SiftError>;

impl SiftError {
    /// Returns true if the batch should skip this file and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SiftError::Load(_) | SiftError::Analysis { .. })
    }

    pub fn analysis(path: impl Into<PathBuf>, source: AnalysisError) -> Self {
        SiftError::Analysis {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_file_errors_are_recoverable() {
        let load = SiftError::from(LoadError::NotFound(PathBuf::from("gone.wav")));
        let analysis = SiftError::analysis("empty.wav", AnalysisError::EmptyWaveform);
        assert!(load.is_recoverable());
        assert!(analysis.is_recoverable());
    }

    #[test]
    fn config_errors_are_fatal() {
        let err = SiftError::from(ConfigError::ScoreOutOfRange { value: 5, max: 4 });
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("decision_score_min"));
    }

    #[test]
    fn analysis_error_names_the_file() {
        let err = SiftError::analysis("tape_07.wav", AnalysisError::InvalidSampleRate(0));
        let msg = err.to_string();
        assert!(msg.contains("tape_07.wav"));
        assert!(msg.contains("0 Hz"));
    }
}
