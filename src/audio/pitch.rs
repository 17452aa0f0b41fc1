//! Pitch tracker.
//!
//! YIN (de Cheveigné & Kawahara, 2002) per analysis frame. The difference
//! function is expanded into energy terms plus a cross-correlation, and the
//! cross-correlation is taken with an FFT so each frame costs O(n log n).

use std::sync::Arc;

use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::decode::Waveform;
use super::frames::{frame_count, read_frame, FRAME_SIZE};

/// C2
pub const PITCH_FMIN_HZ: f64 = 65.406;
/// C7
pub const PITCH_FMAX_HZ: f64 = 2093.0;
/// CMNDF level of the first dip YIN accepts as the period.
pub const YIN_THRESHOLD: f64 = 0.15;
/// Highest CMNDF at the chosen lag that still counts as voiced.
///
/// Chords and tones under noise seldom dip below [`YIN_THRESHOLD`] inside the
/// pitch range but bottom out around 0.2 to 0.45; white noise stays near 0.9.
pub const VOICED_CMNDF_MAX: f64 = 0.5;
/// Frames with less total energy are unvoiced without further work.
const MIN_FRAME_ENERGY: f64 = 1e-10;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitchEstimate {
    pub frequency_hz: f64,
    /// `1 - cmndf` at the chosen lag
    pub confidence: f64,
}

impl PitchEstimate {
    pub fn is_voiced(&self) -> bool {
        self.confidence > 1.0 - VOICED_CMNDF_MAX
            && (PITCH_FMIN_HZ..=PITCH_FMAX_HZ).contains(&self.frequency_hz)
    }
}

/// YIN estimator for frames of a fixed length at one sample rate.
pub struct YinDetector {
    sample_rate: f64,
    frame_len: usize,
    min_lag: usize,
    max_lag: usize,
    fft_len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl YinDetector {
    pub fn new(sample_rate: u32, frame_len: usize) -> Self {
        let sample_rate = sample_rate as f64;
        let min_lag = ((sample_rate / PITCH_FMAX_HZ).floor() as usize).max(2);
        let max_lag = ((sample_rate / PITCH_FMIN_HZ).ceil() as usize).min(frame_len / 2);
        let fft_len = frame_len.next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(fft_len);
        let inverse = planner.plan_fft_inverse(fft_len);

        Self {
            sample_rate,
            frame_len,
            min_lag,
            max_lag,
            fft_len,
            forward,
            inverse,
        }
    }

    /// Raw YIN difference function d(0..=max_lag).
    ///
    /// d(tau) = sum_{j<W} (x[j] - x[j + tau])^2 with W = n - max_lag.
    fn difference(&self, x: &[f64]) -> Vec<f64> {
        let window = x.len() - self.max_lag;

        let mut prefix = Vec::with_capacity(x.len() + 1);
        prefix.push(0.0f64);
        for &s in x {
            let last = *prefix.last().unwrap_or(&0.0);
            prefix.push(last + s * s);
        }
        let head_energy = prefix[window];

        let mut a = vec![Complex::new(0.0, 0.0); self.fft_len];
        let mut b = vec![Complex::new(0.0, 0.0); self.fft_len];
        for (slot, &s) in a.iter_mut().zip(&x[..window]) {
            *slot = Complex::new(s, 0.0);
        }
        for (slot, &s) in b.iter_mut().zip(x) {
            *slot = Complex::new(s, 0.0);
        }
        self.forward.process(&mut a);
        self.forward.process(&mut b);

        let mut cross: Vec<Complex<f64>> = a.iter().zip(&b).map(|(p, q)| p.conj() * q).collect();
        self.inverse.process(&mut cross);
        let scale = 1.0 / self.fft_len as f64;

        (0..=self.max_lag)
            .map(|tau| {
                let shifted_energy = prefix[tau + window] - prefix[tau];
                (head_energy + shifted_energy - 2.0 * cross[tau].re * scale).max(0.0)
            })
            .collect()
    }

    /// Best period estimate of one frame, `None` for a silent frame.
    ///
    /// Takes the first dip below [`YIN_THRESHOLD`], or the global minimum of
    /// the lag range when nothing dips that far.
    pub fn estimate(&self, frame: &[f32]) -> Option<PitchEstimate> {
        if frame.len() != self.frame_len || self.min_lag >= self.max_lag {
            return None;
        }

        let x: Vec<f64> = frame.iter().map(|&s| s as f64).collect();
        let energy: f64 = x.iter().map(|s| s * s).sum();
        if energy <= MIN_FRAME_ENERGY {
            return None;
        }

        let d = self.difference(&x);
        let cmndf = cumulative_mean_normalized(&d);

        let tau = self
            .first_dip(&cmndf)
            .or_else(|| self.global_minimum(&cmndf))?;

        let refined = parabolic_vertex(&cmndf, tau);
        if refined <= 0.0 {
            return None;
        }

        Some(PitchEstimate {
            frequency_hz: self.sample_rate / refined,
            confidence: (1.0 - cmndf[tau]).clamp(0.0, 1.0),
        })
    }

    /// Local minimum following the first lag below [`YIN_THRESHOLD`].
    fn first_dip(&self, cmndf: &[f64]) -> Option<usize> {
        let mut tau = (self.min_lag..=self.max_lag).find(|&t| cmndf[t] < YIN_THRESHOLD)?;
        while tau < self.max_lag && cmndf[tau + 1] < cmndf[tau] {
            tau += 1;
        }
        Some(tau)
    }

    fn global_minimum(&self, cmndf: &[f64]) -> Option<usize> {
        (self.min_lag..=self.max_lag).min_by(|&a, &b| cmndf[a].total_cmp(&cmndf[b]))
    }
}

/// d'(0) = 1, d'(tau) = d(tau) * tau / sum_{j=1..tau} d(j)
fn cumulative_mean_normalized(d: &[f64]) -> Vec<f64> {
    let mut cmndf = vec![1.0; d.len()];
    let mut running = 0.0;
    for tau in 1..d.len() {
        running += d[tau];
        if running > 1e-30 {
            cmndf[tau] = d[tau] * tau as f64 / running;
        }
    }
    cmndf
}

/// Sub-sample position of the minimum near `tau`.
fn parabolic_vertex(data: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= data.len() {
        return tau as f64;
    }
    let (s0, s1, s2) = (data[tau - 1], data[tau], data[tau + 1]);
    let curvature = s0 - 2.0 * s1 + s2;
    if curvature.abs() < 1e-12 {
        return tau as f64;
    }
    tau as f64 + (s0 - s2) / (2.0 * curvature)
}

/// Voicing decision for every frame of the waveform, in frame order.
pub fn voiced_flags(wave: &Waveform) -> Vec<bool> {
    let n_frames = frame_count(wave.samples.len());
    let detector = YinDetector::new(wave.sample_rate, FRAME_SIZE);

    (0..n_frames)
        .into_par_iter()
        .map(|idx| {
            let mut frame = vec![0.0f32; FRAME_SIZE];
            read_frame(&wave.samples, idx, &mut frame);
            detector
                .estimate(&frame)
                .is_some_and(|estimate| estimate.is_voiced())
        })
        .collect()
}

/// Fraction of frames with a confident pitch in the musical range.
pub fn voiced_ratio(wave: &Waveform) -> f32 {
    let flags = voiced_flags(wave);
    if flags.is_empty() {
        return 0.0;
    }
    let voiced = flags.iter().filter(|&&v| v).count();
    voiced as f32 / flags.len() as f32
}
