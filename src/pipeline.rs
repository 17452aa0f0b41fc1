//! Per-file sifting and batch orchestration.
//!
//! Each file is decoded, analyzed and classified on its own. A failing file
//! is recorded and the rest of the batch carries on.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::audio::{self, Analysis, Waveform};
use crate::classify::{classify, Verdict};
use crate::config::{Settings, Thresholds};
use crate::error::{AnalysisError, Result, SiftError};

/// Metrics and verdict for one successfully analyzed file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub analysis: Analysis,
    pub verdict: Verdict,
}

#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: Result<FileReport>,
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<FileResult>,
}

impl BatchSummary {
    pub fn reports(&self) -> impl Iterator<Item = &FileReport> {
        self.results.iter().filter_map(|r| r.outcome.as_ref().ok())
    }

    pub fn music(&self) -> usize {
        self.reports().filter(|r| r.verdict.likely_music).count()
    }

    pub fn static_only(&self) -> usize {
        self.reports().filter(|r| !r.verdict.likely_music).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }
}

/// Analyze and classify an already decoded waveform.
pub fn sift_waveform(
    wave: &Waveform,
    thresholds: &Thresholds,
) -> std::result::Result<(Analysis, Verdict), AnalysisError> {
    let analysis = audio::analyze(wave)?;
    let verdict = classify(&analysis.metrics, thresholds);
    Ok((analysis, verdict))
}

pub fn analyze_file(path: &Path, settings: &Settings) -> Result<FileReport> {
    let wave = audio::decode_audio(path, settings.max_duration_secs)?;
    let (analysis, verdict) =
        sift_waveform(&wave, &settings.thresholds).map_err(|e| SiftError::analysis(path, e))?;

    log::info!(
        "{}: score {}/{} -> {}",
        path.display(),
        verdict.score,
        verdict.votes.len(),
        verdict.label()
    );

    Ok(FileReport {
        path: path.to_path_buf(),
        analysis,
        verdict,
    })
}

/// Sift every file in `paths`.
///
/// Only configuration problems fail the whole call; per-file errors are kept
/// in the returned summary.
pub fn run_batch(paths: &[PathBuf], settings: &Settings) -> Result<BatchSummary> {
    settings.thresholds.validate()?;

    if paths.is_empty() {
        log::warn!("No files to analyze");
        return Ok(BatchSummary::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.jobs)
        .build()
        .map_err(crate::error::ConfigError::from)?;

    log::info!(
        "Analyzing {} files on {} threads",
        paths.len(),
        pool.current_num_threads()
    );

    let progress = if settings.show_progress {
        let pb = ProgressBar::new(paths.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta} remaining)",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results: Vec<FileResult> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let outcome = analyze_file(path, settings);
                if let Err(ref e) = outcome {
                    log::warn!("Skipping {}: {}", path.display(), e);
                }
                if let Some(ref pb) = progress {
                    pb.inc(1);
                }
                FileResult {
                    path: path.clone(),
                    outcome,
                }
            })
            .collect()
    });

    if let Some(pb) = progress {
        pb.finish_with_message("Analysis complete");
    }

    let summary = BatchSummary { results };
    log::info!(
        "Done: {} music, {} static, {} failed",
        summary.music(),
        summary.static_only(),
        summary.failed()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chord, mix, silence, sine, white_noise};

    #[test]
    fn white_noise_is_static() {
        let (analysis, verdict) =
            sift_waveform(&white_noise(22_050, 5.0, 0.8, 1), &Thresholds::default()).unwrap();
        assert!(analysis.metrics.spectral_flatness > 0.6);
        assert!(analysis.metrics.voiced_ratio < 0.05);
        assert!(analysis.metrics.chroma_std < 0.1);
        assert!(!verdict.likely_music, "score {}", verdict.score);
    }

    #[test]
    fn sine_collects_at_least_two_votes() {
        let (analysis, verdict) =
            sift_waveform(&sine(440.0, 22_050, 3.0, 0.5), &Thresholds::default()).unwrap();
        assert!(analysis.metrics.spectral_flatness < 0.01);
        assert!(analysis.metrics.voiced_ratio > 0.95);
        assert!(verdict.score >= 2);
        assert!(verdict.likely_music);
    }

    #[test]
    fn major_triad_is_music() {
        let wave = chord(&[220.0, 277.18, 329.63], 22_050, 3.0, 0.3);
        let (analysis, verdict) = sift_waveform(&wave, &Thresholds::default()).unwrap();
        assert!(analysis.metrics.voiced_ratio > 0.10, "voiced {}", analysis.metrics.voiced_ratio);
        assert!(verdict.votes[2].passed);
        assert!(verdict.score >= 3, "score {}", verdict.score);
        assert!(verdict.likely_music);
    }

    #[test]
    fn chord_under_noise_is_music() {
        let tones = chord(&[220.0, 391.5, 165.0], 22_050, 3.0, 0.3);
        let wave = mix(&tones, &white_noise(22_050, 3.0, 0.2, 4));
        let (analysis, verdict) = sift_waveform(&wave, &Thresholds::default()).unwrap();
        assert!(analysis.metrics.voiced_ratio > 0.10, "voiced {}", analysis.metrics.voiced_ratio);
        assert!(verdict.likely_music, "score {}", verdict.score);
    }

    #[test]
    fn silence_is_static_without_error() {
        let (analysis, verdict) =
            sift_waveform(&silence(22_050, 3.0), &Thresholds::default()).unwrap();
        assert_eq!(analysis.metrics.onset_rate, 0.0);
        assert!(!verdict.likely_music);
    }

    #[test]
    fn sifting_twice_is_bit_identical() {
        let wave = sine(261.63, 22_050, 1.5, 0.3);
        let t = Thresholds::default();
        assert_eq!(sift_waveform(&wave, &t).unwrap(), sift_waveform(&wave, &t).unwrap());
    }

    #[test]
    fn invalid_thresholds_abort_the_batch() {
        let settings = Settings {
            thresholds: Thresholds {
                decision_score_min: 7,
                ..Thresholds::default()
            },
            ..Settings::default()
        };
        let err = run_batch(&[PathBuf::from("a.wav")], &settings).unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn missing_files_are_recorded_not_fatal() {
        let paths = vec![PathBuf::from("/missing/one.wav"), PathBuf::from("/missing/two.mp3")];
        let summary = run_batch(&paths, &Settings::default()).unwrap();
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.results[0].path, paths[0]);
        assert_eq!(summary.results[1].path, paths[1]);
        assert!(summary.results.iter().all(|r| r.outcome.as_ref().unwrap_err().is_recoverable()));
    }

    #[test]
    fn empty_batch_is_empty_summary() {
        let summary = run_batch(&[], &Settings::default()).unwrap();
        assert!(summary.results.is_empty());
        assert_eq!(summary.music() + summary.static_only() + summary.failed(), 0);
    }
}
