//! Synthetic signals for unit tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

use crate::audio::Waveform;

fn num_samples(sample_rate: u32, secs: f32) -> usize {
    (secs * sample_rate as f32) as usize
}

pub fn silence(sample_rate: u32, secs: f32) -> Waveform {
    Waveform::new(vec![0.0; num_samples(sample_rate, secs)], sample_rate)
}

pub fn sine(freq_hz: f32, sample_rate: u32, secs: f32, amplitude: f32) -> Waveform {
    let samples = (0..num_samples(sample_rate, secs))
        .map(|i| amplitude * (2.0 * PI * freq_hz * i as f32 / sample_rate as f32).sin())
        .collect();
    Waveform::new(samples, sample_rate)
}

/// Equal-amplitude sum of sines, one per note.
pub fn chord(freqs_hz: &[f32], sample_rate: u32, secs: f32, amplitude: f32) -> Waveform {
    let samples = (0..num_samples(sample_rate, secs))
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            freqs_hz
                .iter()
                .map(|f| amplitude * (2.0 * PI * f * t).sin())
                .sum::<f32>()
        })
        .collect();
    Waveform::new(samples, sample_rate)
}

/// Sample-wise sum of two signals at `a`'s sample rate, truncated to the
/// shorter one.
pub fn mix(a: &Waveform, b: &Waveform) -> Waveform {
    let samples = a.samples.iter().zip(&b.samples).map(|(x, y)| x + y).collect();
    Waveform::new(samples, a.sample_rate)
}

/// Uniform white noise in [-amplitude, amplitude], seeded for repeatability.
pub fn white_noise(sample_rate: u32, secs: f32, amplitude: f32, seed: u64) -> Waveform {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = (0..num_samples(sample_rate, secs))
        .map(|_| rng.gen_range(-amplitude..=amplitude))
        .collect();
    Waveform::new(samples, sample_rate)
}

/// 5 ms exponentially decaying clicks on every beat, silence in between.
pub fn click_track(bpm: f32, sample_rate: u32, secs: f32) -> Waveform {
    let samples_per_beat = (60.0 / bpm * sample_rate as f32) as usize;
    let click_len = (0.005 * sample_rate as f32) as usize;
    let samples = (0..num_samples(sample_rate, secs))
        .map(|i| {
            let pos = i % samples_per_beat;
            if pos < click_len {
                0.8 * (-5.0 * pos as f32 / click_len as f32).exp()
            } else {
                0.0
            }
        })
        .collect();
    Waveform::new(samples, sample_rate)
}
