use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classify::NUM_CRITERIA;
use crate::error::ConfigError;

const CONFIG_FILE_NAME: &str = "staticsift.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Cutoffs for the four votes and the number of votes a file needs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    #[serde(default = "default_spectral_flatness_max")]
    pub spectral_flatness_max: f32,
    #[serde(default = "default_onsets_per_second_min")]
    pub onsets_per_second_min: f32,
    #[serde(default = "default_voiced_frames_ratio_min")]
    pub voiced_frames_ratio_min: f32,
    #[serde(default = "default_chroma_std_min")]
    pub chroma_std_min: f32,
    #[serde(default = "default_decision_score_min")]
    pub decision_score_min: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Seconds decoded per file, 0 for the whole file
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: f32,
    /// Worker threads for the batch, 0 lets rayon decide
    #[serde(default)]
    pub jobs: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            spectral_flatness_max: default_spectral_flatness_max(),
            onsets_per_second_min: default_onsets_per_second_min(),
            voiced_frames_ratio_min: default_voiced_frames_ratio_min(),
            chroma_std_min: default_chroma_std_min(),
            decision_score_min: default_decision_score_min(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_duration_secs: default_max_duration_secs(),
            jobs: 0,
        }
    }
}

fn default_spectral_flatness_max() -> f32 { 0.05 }
fn default_onsets_per_second_min() -> f32 { 1.0 }
fn default_voiced_frames_ratio_min() -> f32 { 0.10 }
fn default_chroma_std_min() -> f32 { 0.30 }
fn default_decision_score_min() -> u32 { 2 }
fn default_max_duration_secs() -> f32 { 60.0 }

impl Thresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cutoffs = [
            ("spectral_flatness_max", self.spectral_flatness_max),
            ("onsets_per_second_min", self.onsets_per_second_min),
            ("voiced_frames_ratio_min", self.voiced_frames_ratio_min),
            ("chroma_std_min", self.chroma_std_min),
        ];
        for (name, value) in cutoffs {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidCutoff { name, value });
            }
        }
        if self.decision_score_min > NUM_CRITERIA as u32 {
            return Err(ConfigError::ScoreOutOfRange {
                value: self.decision_score_min,
                max: NUM_CRITERIA as u32,
            });
        }
        Ok(())
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_duration_secs.is_finite() || self.max_duration_secs < 0.0 {
            return Err(ConfigError::InvalidMaxDuration(self.max_duration_secs));
        }
        Ok(())
    }

    /// Decode limit to hand to the loader
    pub fn max_duration(&self) -> Option<f32> {
        (self.max_duration_secs > 0.0).then_some(self.max_duration_secs)
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        self.analysis.validate()
    }
}

/// Parse and validate config text; `path` is only used in error messages.
pub fn parse_config(content: &str, path: &Path) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&content, path)
}

/// Explicit path first, then ./staticsift.toml, then the per-user config.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("staticsift").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("staticsift").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

/// Fully resolved options for one run.
#[derive(Clone, Debug)]
pub struct Settings {
    pub thresholds: Thresholds,
    pub max_duration_secs: Option<f32>,
    pub jobs: usize,
    pub show_progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let analysis = AnalysisConfig::default();
        Self {
            thresholds: Thresholds::default(),
            max_duration_secs: analysis.max_duration(),
            jobs: analysis.jobs,
            show_progress: false,
        }
    }
}
