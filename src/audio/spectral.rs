//! Frame analyzer: spectral flatness and chroma spread.
//!
//! Flatness is the Wiener entropy of each frame's magnitude spectrum, averaged
//! over the file. Chroma folds each frame's power into 12 pitch classes; the
//! reported spread is the standard deviation of the file's mean chroma vector.
//! Silent frames are left out of both.

use super::decode::Waveform;
use super::frames::{is_silent, Spectrogram};

pub const NUM_PITCH_CLASSES: usize = 12;

/// Floor applied to magnitudes before taking logarithms
const MAGNITUDE_FLOOR: f32 = 1e-10;

/// C2
const CHROMA_FMIN_HZ: f32 = 65.406;
/// C8
const CHROMA_FMAX_HZ: f32 = 4186.01;

const A4_HZ: f32 = 440.0;
const A4_MIDI: f32 = 69.0;

/// Both frame-analyzer metrics, from a single STFT pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSummary {
    pub spectral_flatness: f32,
    pub chroma_std: f32,
}

impl FrameSummary {
    pub fn from_spectrogram(spec: &Spectrogram) -> Self {
        Self {
            spectral_flatness: mean_flatness(spec),
            chroma_std: chroma_std_of(spec),
        }
    }
}

pub fn analyze_frames(wave: &Waveform) -> FrameSummary {
    FrameSummary::from_spectrogram(&Spectrogram::compute(wave))
}

pub fn spectral_flatness(wave: &Waveform) -> f32 {
    mean_flatness(&Spectrogram::compute(wave))
}

pub fn chroma_std(wave: &Waveform) -> f32 {
    chroma_std_of(&Spectrogram::compute(wave))
}

/// Geometric over arithmetic mean of one magnitude spectrum.
///
/// Returns 0.0 to 1.0; 0 for tonal content, close to 1 for white noise.
pub fn frame_flatness(magnitudes: &[f32]) -> f32 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let n = magnitudes.len() as f32;
    let log_sum: f32 = magnitudes.iter().map(|&m| m.max(MAGNITUDE_FLOOR).ln()).sum();
    let geometric_mean = (log_sum / n).exp();
    let arithmetic_mean = magnitudes.iter().map(|&m| m.max(MAGNITUDE_FLOOR)).sum::<f32>() / n;

    if arithmetic_mean > MAGNITUDE_FLOOR {
        (geometric_mean / arithmetic_mean).min(1.0)
    } else {
        0.0
    }
}

/// Mean flatness over non-silent frames; 0.0 when every frame is silent.
pub fn mean_flatness(spec: &Spectrogram) -> f32 {
    let values: Vec<f32> = spec
        .frames
        .iter()
        .filter(|f| !is_silent(f))
        .map(|f| frame_flatness(f))
        .collect();

    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Pitch class (0 = C .. 11 = B) of the equal-tempered note nearest `freq_hz`.
pub fn pitch_class(freq_hz: f32) -> usize {
    let midi = A4_MIDI + 12.0 * (freq_hz / A4_HZ).log2();
    (midi.round() as i64).rem_euclid(NUM_PITCH_CLASSES as i64) as usize
}

/// Assignment of FFT bins to pitch classes for one sample rate.
struct ChromaMap {
    class_of_bin: Vec<Option<usize>>,
    bins_per_class: [usize; NUM_PITCH_CLASSES],
}

impl ChromaMap {
    fn new(spec: &Spectrogram) -> Self {
        let nyquist = spec.sample_rate as f32 / 2.0;
        let fmax = CHROMA_FMAX_HZ.min(nyquist);
        let mut bins_per_class = [0usize; NUM_PITCH_CLASSES];

        let class_of_bin = (0..spec.num_bins())
            .map(|bin| {
                let freq = spec.bin_frequency(bin);
                if freq < CHROMA_FMIN_HZ || freq > fmax {
                    return None;
                }
                let class = pitch_class(freq);
                bins_per_class[class] += 1;
                Some(class)
            })
            .collect();

        Self {
            class_of_bin,
            bins_per_class,
        }
    }

    /// Max-normalized chroma of one frame, `None` if it carries no energy.
    fn frame_chroma(&self, magnitudes: &[f32]) -> Option<[f32; NUM_PITCH_CLASSES]> {
        let mut chroma = [0.0f32; NUM_PITCH_CLASSES];
        for (mag, class) in magnitudes.iter().zip(self.class_of_bin.iter()) {
            if let Some(class) = class {
                chroma[*class] += mag * mag;
            }
        }

        // Mean power per class keeps broadband noise flat across classes
        for (value, &count) in chroma.iter_mut().zip(self.bins_per_class.iter()) {
            if count > 0 {
                *value /= count as f32;
            }
        }

        let max = chroma.iter().copied().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return None;
        }
        for value in &mut chroma {
            *value /= max;
        }
        Some(chroma)
    }
}

/// Average max-normalized chroma vector over non-silent frames.
pub fn mean_chroma(spec: &Spectrogram) -> [f32; NUM_PITCH_CLASSES] {
    let map = ChromaMap::new(spec);
    let mut sum = [0.0f32; NUM_PITCH_CLASSES];
    let mut used = 0usize;

    for frame in spec.frames.iter().filter(|f| !is_silent(f)) {
        if let Some(chroma) = map.frame_chroma(frame) {
            for (acc, value) in sum.iter_mut().zip(chroma.iter()) {
                *acc += value;
            }
            used += 1;
        }
    }

    if used > 0 {
        for acc in &mut sum {
            *acc /= used as f32;
        }
    }
    sum
}

/// Population standard deviation of the mean chroma vector.
pub fn chroma_std_of(spec: &Spectrogram) -> f32 {
    let chroma = mean_chroma(spec);
    let mean = chroma.iter().sum::<f32>() / NUM_PITCH_CLASSES as f32;
    let variance = chroma
        .iter()
        .map(|c| (c - mean).powi(2))
        .sum::<f32>()
        / NUM_PITCH_CLASSES as f32;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chord, sine, silence, white_noise};

    #[test]
    fn pitch_class_of_reference_notes() {
        assert_eq!(pitch_class(440.0), 9);
        assert_eq!(pitch_class(261.63), 0);
        assert_eq!(pitch_class(130.81), 0);
        assert_eq!(pitch_class(493.88), 11);
        // Quarter tone above A rounds back to A
        assert_eq!(pitch_class(446.0), 9);
    }

    #[test]
    fn flat_spectrum_has_unit_flatness() {
        assert!((frame_flatness(&[0.5; 64]) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn single_peak_has_low_flatness() {
        let mut spectrum = vec![0.0f32; 1025];
        spectrum[40] = 100.0;
        assert!(frame_flatness(&spectrum) < 1e-6);
    }

    #[test]
    fn sine_is_tonal() {
        let wave = sine(440.0, 22_050, 2.0, 0.5);
        let summary = analyze_frames(&wave);
        assert!(summary.spectral_flatness < 0.01, "flatness {}", summary.spectral_flatness);
        assert!(summary.chroma_std > 0.25, "chroma std {}", summary.chroma_std);
    }

    #[test]
    fn sine_chroma_lands_on_its_pitch_class() {
        let spec = Spectrogram::compute(&sine(440.0, 22_050, 1.0, 0.5));
        let chroma = mean_chroma(&spec);
        let (best, _) = chroma
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(best, 9);
        assert!((chroma[9] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn triad_spreads_chroma_over_its_notes() {
        let summary = analyze_frames(&chord(&[220.0, 277.18, 329.63], 22_050, 2.0, 0.3));
        assert!(summary.spectral_flatness < 0.05, "flatness {}", summary.spectral_flatness);
        assert!(summary.chroma_std > 0.3, "chroma std {}", summary.chroma_std);
    }

    #[test]
    fn white_noise_is_flat_and_chroma_uniform() {
        let wave = white_noise(22_050, 5.0, 0.8, 7);
        let summary = analyze_frames(&wave);
        assert!(summary.spectral_flatness > 0.6, "flatness {}", summary.spectral_flatness);
        assert!(summary.chroma_std < 0.1, "chroma std {}", summary.chroma_std);
    }

    #[test]
    fn silence_yields_zero_not_nan() {
        let wave = silence(22_050, 3.0);
        assert_eq!(spectral_flatness(&wave), 0.0);
        assert_eq!(chroma_std(&wave), 0.0);
    }

    #[test]
    fn silent_frames_do_not_dilute_flatness() {
        let mut samples = vec![0.0f32; 22_050];
        samples.extend(white_noise(22_050, 1.0, 0.8, 3).samples);
        let padded = spectral_flatness(&Waveform::new(samples, 22_050));
        assert!(padded > 0.6, "flatness {}", padded);
    }
}
