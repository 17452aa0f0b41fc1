//! Decision engine: four threshold votes and a score cutoff.

use serde::Serialize;
use std::fmt;

use crate::audio::MetricSet;
use crate::config::Thresholds;

pub const NUM_CRITERIA: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    SpectralFlatness,
    OnsetRate,
    VoicedRatio,
    ChromaStd,
}

impl Criterion {
    pub const ALL: [Criterion; NUM_CRITERIA] = [
        Criterion::SpectralFlatness,
        Criterion::OnsetRate,
        Criterion::VoicedRatio,
        Criterion::ChromaStd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Criterion::SpectralFlatness => "spectral_flatness",
            Criterion::OnsetRate => "onset_rate",
            Criterion::VoicedRatio => "voiced_ratio",
            Criterion::ChromaStd => "chroma_std",
        }
    }

    /// Name of the [`Thresholds`] field holding this criterion's cutoff.
    pub fn threshold_key(self) -> &'static str {
        match self {
            Criterion::SpectralFlatness => "spectral_flatness_max",
            Criterion::OnsetRate => "onsets_per_second_min",
            Criterion::VoicedRatio => "voiced_frames_ratio_min",
            Criterion::ChromaStd => "chroma_std_min",
        }
    }

    pub fn measured(self, metrics: &MetricSet) -> f32 {
        match self {
            Criterion::SpectralFlatness => metrics.spectral_flatness,
            Criterion::OnsetRate => metrics.onset_rate,
            Criterion::VoicedRatio => metrics.voiced_ratio,
            Criterion::ChromaStd => metrics.chroma_std,
        }
    }

    pub fn cutoff(self, thresholds: &Thresholds) -> f32 {
        match self {
            Criterion::SpectralFlatness => thresholds.spectral_flatness_max,
            Criterion::OnsetRate => thresholds.onsets_per_second_min,
            Criterion::VoicedRatio => thresholds.voiced_frames_ratio_min,
            Criterion::ChromaStd => thresholds.chroma_std_min,
        }
    }

    /// Flatness votes for music when low, every other metric when high.
    pub fn passes(self, value: f32, cutoff: f32) -> bool {
        match self {
            Criterion::SpectralFlatness => value <= cutoff,
            _ => value >= cutoff,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Vote {
    pub criterion: Criterion,
    pub value: f32,
    pub cutoff: f32,
    pub passed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Verdict {
    pub likely_music: bool,
    pub score: u32,
    pub votes: [Vote; NUM_CRITERIA],
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        if self.likely_music {
            "Likely contains music"
        } else {
            "Likely static only"
        }
    }
}

pub fn classify(metrics: &MetricSet, thresholds: &Thresholds) -> Verdict {
    let votes = Criterion::ALL.map(|criterion| {
        let value = criterion.measured(metrics);
        let cutoff = criterion.cutoff(thresholds);
        Vote {
            criterion,
            value,
            cutoff,
            passed: criterion.passes(value, cutoff),
        }
    });

    let score = votes.iter().filter(|v| v.passed).count() as u32;

    Verdict {
        likely_music: score >= thresholds.decision_score_min,
        score,
        votes,
    }
}
