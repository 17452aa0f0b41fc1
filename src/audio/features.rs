use serde::{Deserialize, Serialize};

/// The four descriptors the verdict is voted on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    /// Mean Wiener entropy over non-silent frames (0.0-1.0)
    pub spectral_flatness: f32,
    /// Detected onsets per second
    pub onset_rate: f32,
    /// Fraction of frames with a confident pitch (0.0-1.0)
    pub voiced_ratio: f32,
    /// Spread of the mean chroma vector across pitch classes
    pub chroma_std: f32,
}

/// Everything measured on one waveform.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    pub duration_secs: f32,
    pub onset_count: usize,
    pub metrics: MetricSet,
}
