//! Onset detector.
//!
//! The onset-strength envelope is rectified spectral flux divided by the
//! frame's total magnitude, which keeps the peak picker independent of the
//! recording level. Peaks above an adaptive local threshold become onsets.

use super::decode::Waveform;
use super::frames::{frame_time, is_silent, Spectrogram};

/// Frames on each side of the local mean used by the peak picker.
const ONSET_WINDOW_FRAMES: usize = 10;
/// Local mean multiplier.
const ONSET_MEAN_SCALE: f32 = 1.5;
/// Absolute margin above the scaled local mean.
const ONSET_DELTA: f32 = 0.05;
/// Minimum gap between two onsets in seconds.
const ONSET_MIN_SEPARATION_SECS: f32 = 0.1;

/// Per-frame onset strength.
///
/// Frame 0 has no predecessor and silent frames carry no attack, both are 0.
pub fn onset_envelope(spec: &Spectrogram) -> Vec<f32> {
    let mut envelope = vec![0.0f32; spec.len()];

    for i in 1..spec.len() {
        let current = &spec.frames[i];
        if is_silent(current) {
            continue;
        }
        let previous = &spec.frames[i - 1];

        let flux: f32 = current
            .iter()
            .zip(previous.iter())
            .map(|(cur, prev)| (cur - prev).max(0.0))
            .sum();
        let total: f32 = current.iter().sum();

        envelope[i] = flux / total;
    }

    envelope
}

/// Onset times in seconds, picked from `envelope`.
pub fn pick_onsets(envelope: &[f32], sample_rate: u32) -> Vec<f32> {
    let mut onset_times: Vec<f32> = Vec::new();

    for i in 0..envelope.len() {
        let start = i.saturating_sub(ONSET_WINDOW_FRAMES);
        let end = (i + ONSET_WINDOW_FRAMES + 1).min(envelope.len());
        let local_mean: f32 = envelope[start..end].iter().sum::<f32>() / (end - start) as f32;

        let threshold = local_mean * ONSET_MEAN_SCALE + ONSET_DELTA;
        if envelope[i] <= threshold {
            continue;
        }

        let is_peak = (i == 0 || envelope[i] >= envelope[i - 1])
            && (i == envelope.len() - 1 || envelope[i] >= envelope[i + 1]);

        let time = frame_time(i, sample_rate);
        let far_enough = onset_times
            .last()
            .map_or(true, |&last| time - last >= ONSET_MIN_SEPARATION_SECS);

        if is_peak && far_enough {
            onset_times.push(time);
        }
    }

    onset_times
}

/// Onset times in seconds from an already computed spectrogram.
pub fn onsets_of(spec: &Spectrogram) -> Vec<f32> {
    pick_onsets(&onset_envelope(spec), spec.sample_rate)
}

/// Onset times of a waveform in seconds.
pub fn detect_onsets(wave: &Waveform) -> Vec<f32> {
    onsets_of(&Spectrogram::compute(wave))
}

/// Onsets per second of `duration_secs`; 0 for an empty duration.
pub fn rate(onset_count: usize, duration_secs: f32) -> f32 {
    if duration_secs > 0.0 {
        onset_count as f32 / duration_secs
    } else {
        0.0
    }
}

pub fn onset_rate(wave: &Waveform) -> f32 {
    rate(detect_onsets(wave).len(), wave.duration_secs())
}
